//! Year-by-year comparison of two tickers.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::{derive_annual_metrics, AnnualMetrics, MetricName, MetricsCalculator, MetricsError};
use crate::provider::{MarketDataProvider, SourceError};
use crate::{FundamentalsSnapshot, Symbol, ValidationError, YearRange};

pub const YEAR_COLUMN: &str = "Year";

/// Two tickers and the inclusive year range to compare them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRequest {
    pub left: Symbol,
    pub right: Symbol,
    pub years: YearRange,
}

impl ComparisonRequest {
    pub fn new(left: Symbol, right: Symbol, years: YearRange) -> Self {
        Self { left, right, years }
    }

    /// Both sides name the same ticker, so their columns share one set of keys.
    pub fn is_self_comparison(&self) -> bool {
        self.left == self.right
    }

    /// Normalizes both tickers and validates the range.
    pub fn parse(
        left: &str,
        right: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(
            Symbol::parse(left)?,
            Symbol::parse(right)?,
            YearRange::new(start_year, end_year)?,
        ))
    }
}

/// Both tickers' metrics for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub year: i32,
    pub left: AnnualMetrics,
    pub right: AnnualMetrics,
}

impl ComparisonRow {
    /// `"{TICKER}_{Label}"` cells, left ticker first, labels in display order.
    /// A ticker compared with itself yields one set of cells.
    pub fn cells(&self) -> impl Iterator<Item = (String, Option<f64>)> + '_ {
        let sides = if self.left.symbol() == self.right.symbol() { 1 } else { 2 };
        [&self.left, &self.right].into_iter().take(sides).flat_map(|metrics| {
            metrics
                .iter()
                .map(|(name, value)| (metrics.symbol().prefixed(name.label()), value))
        })
    }

    pub fn get(&self, symbol: &Symbol, name: MetricName) -> Option<f64> {
        if self.left.symbol() == symbol {
            self.left.get(name)
        } else if self.right.symbol() == symbol {
            self.right.get(name)
        } else {
            None
        }
    }
}

impl Serialize for ComparisonRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(YEAR_COLUMN, &self.year)?;
        for (key, value) in self.cells() {
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

/// Rows in ascending year order. Years lacking either ticker's metrics are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub left: Symbol,
    pub right: Symbol,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// `Year` followed by every prefixed metric column.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(String::from(YEAR_COLUMN))
            .chain(self.symbols().into_iter().flat_map(|symbol| {
                MetricName::ALL
                    .into_iter()
                    .map(move |name| symbol.prefixed(name.label()))
            }))
            .collect()
    }

    /// Distinct tickers in column order.
    pub fn symbols(&self) -> Vec<&Symbol> {
        if self.left == self.right {
            vec![&self.left]
        } else {
            vec![&self.left, &self.right]
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(|row| row.year).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A (ticker, year) that produced no metrics, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedYear {
    pub symbol: Symbol,
    pub year: i32,
    pub code: &'static str,
    pub reason: String,
}

impl SkippedYear {
    /// Envelope warning text for this skip.
    pub fn warning(&self) -> String {
        format!("skipped {}: {}", self.year, self.reason)
    }
}

impl From<&MetricsError> for SkippedYear {
    fn from(error: &MetricsError) -> Self {
        Self {
            symbol: error.symbol().clone(),
            year: error.year(),
            code: error.code(),
            reason: error.to_string(),
        }
    }
}

/// The table plus every (ticker, year) that was left out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub table: ComparisonTable,
    pub skipped: Vec<SkippedYear>,
}

impl ComparisonReport {
    pub fn warnings(&self) -> Vec<String> {
        let self_comparison = (self.table.left == self.table.right).then(|| {
            format!(
                "{} is compared with itself; one set of columns is reported",
                self.table.left
            )
        });
        self_comparison
            .into_iter()
            .chain(self.skipped.iter().map(SkippedYear::warning))
            .collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("no data available for {left} and {right} between {start} and {end}")]
    EmptyResult {
        left: Symbol,
        right: Symbol,
        start: i32,
        end: i32,
        skipped: Vec<SkippedYear>,
    },
}

/// Drives [`MetricsCalculator`] over a year range for two tickers.
///
/// Fundamentals are fetched at most once per ticker per [`compare`](Self::compare)
/// call. Years run sequentially in ascending order.
#[derive(Clone, Copy)]
pub struct RangeComparator<'a> {
    provider: &'a dyn MarketDataProvider,
    calculator: MetricsCalculator<'a>,
}

type SnapshotCache = BTreeMap<Symbol, Result<FundamentalsSnapshot, SourceError>>;

impl<'a> RangeComparator<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        Self {
            provider,
            calculator: MetricsCalculator::new(provider),
        }
    }

    pub async fn compare(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonReport, ComparisonError> {
        let mut snapshots = SnapshotCache::new();
        let mut rows = Vec::with_capacity(request.years.count());
        let mut skipped = Vec::new();

        for year in request.years.years() {
            debug!(left = %request.left, right = %request.right, year, "comparing year");
            let left = self.metrics_for(&request.left, year, &mut snapshots).await;
            let right = self.metrics_for(&request.right, year, &mut snapshots).await;

            match (left, right) {
                (Ok(left), Ok(right)) => rows.push(ComparisonRow { year, left, right }),
                (left, right) => {
                    for error in [left.err(), right.err()].into_iter().flatten() {
                        warn!(symbol = %error.symbol(), year, code = error.code(), "{error}");
                        skipped.push(SkippedYear::from(&error));
                    }
                }
            }
        }

        if rows.is_empty() {
            warn!(left = %request.left, right = %request.right, "comparison produced no rows");
            return Err(ComparisonError::EmptyResult {
                left: request.left.clone(),
                right: request.right.clone(),
                start: request.years.start(),
                end: request.years.end(),
                skipped,
            });
        }

        info!(
            left = %request.left,
            right = %request.right,
            rows = rows.len(),
            skipped = skipped.len(),
            "comparison complete"
        );

        Ok(ComparisonReport {
            table: ComparisonTable {
                left: request.left.clone(),
                right: request.right.clone(),
                rows,
            },
            skipped,
        })
    }

    async fn metrics_for(
        &self,
        symbol: &Symbol,
        year: i32,
        snapshots: &mut SnapshotCache,
    ) -> Result<AnnualMetrics, MetricsError> {
        let prices = self.calculator.year_prices(symbol, year).await?;

        let snapshot = match snapshots.entry(symbol.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.provider.fundamentals(symbol).await),
        };
        let snapshot = snapshot.as_ref().map_err(|source| MetricsError::Source {
            symbol: symbol.clone(),
            year,
            source: source.clone(),
        })?;

        derive_annual_metrics(symbol, year, &prices, snapshot)
    }
}
