//! Per-year valuation and profitability ratios.
//!
//! [`derive_annual_metrics`] is the pure step: one year's prices plus a
//! fundamentals snapshot in, ten ratios out. [`MetricsCalculator`] wraps it
//! with the provider calls that gather those inputs.

use std::fmt::{Display, Formatter};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::arithmetic::safe_divide;
use crate::provider::{MarketDataProvider, PriceHistoryRequest, SourceError};
use crate::{
    info_keys, line_items, FinancialStatement, FundamentalsSnapshot, PriceSeries,
    StatementError, StatementKind, Symbol,
};

/// The ten derived ratios, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricName {
    Roe,
    Roa,
    GrossProfitMargin,
    DebtToEquity,
    PeRatio,
    EvEbitda,
    PEbitda,
    EarningsYield,
    RevenueGrowth,
    PegRatio,
}

impl MetricName {
    pub const ALL: [Self; 10] = [
        Self::Roe,
        Self::Roa,
        Self::GrossProfitMargin,
        Self::DebtToEquity,
        Self::PeRatio,
        Self::EvEbitda,
        Self::PEbitda,
        Self::EarningsYield,
        Self::RevenueGrowth,
        Self::PegRatio,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Roe => "ROE",
            Self::Roa => "ROA",
            Self::GrossProfitMargin => "Gross Profit Margin",
            Self::DebtToEquity => "Debt-to-Equity",
            Self::PeRatio => "P/E Ratio",
            Self::EvEbitda => "EV/EBITDA",
            Self::PEbitda => "P/EBITDA",
            Self::EarningsYield => "Earnings Yield",
            Self::RevenueGrowth => "Revenue Growth",
            Self::PegRatio => "PEG Ratio",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl Display for MetricName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ratios of one ticker for one year. `None` marks an unavailable value.
///
/// Every present value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualMetrics {
    symbol: Symbol,
    year: i32,
    values: [Option<f64>; 10],
}

impl AnnualMetrics {
    fn new(symbol: Symbol, year: i32) -> Self {
        Self {
            symbol,
            year,
            values: [None; 10],
        }
    }

    fn set(&mut self, name: MetricName, value: Option<f64>) {
        self.values[name.index()] = value.filter(|value| value.is_finite());
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        self.values[name.index()]
    }

    /// `(name, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricName, Option<f64>)> + '_ {
        MetricName::ALL.into_iter().map(|name| (name, self.get(name)))
    }

    pub fn available(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }
}

impl Serialize for AnnualMetrics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Values<'a>(&'a AnnualMetrics);

        impl Serialize for Values<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(MetricName::ALL.len()))?;
                for (name, value) in self.0.iter() {
                    map.serialize_entry(name.label(), &value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("symbol", &self.symbol)?;
        map.serialize_entry("year", &self.year)?;
        map.serialize_entry("metrics", &Values(self))?;
        map.end()
    }
}

/// Why one (ticker, year) produced no metrics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    #[error("no price data found for {symbol} in {year}")]
    NoPriceData { symbol: Symbol, year: i32 },

    #[error("{symbol} {year}: '{item}' is missing from the {statement}")]
    MissingLineItem {
        symbol: Symbol,
        year: i32,
        statement: StatementKind,
        item: String,
    },

    #[error("{symbol} {year}: {source}")]
    Source {
        symbol: Symbol,
        year: i32,
        source: SourceError,
    },
}

impl MetricsError {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::NoPriceData { symbol, .. }
            | Self::MissingLineItem { symbol, .. }
            | Self::Source { symbol, .. } => symbol,
        }
    }

    pub const fn year(&self) -> i32 {
        match self {
            Self::NoPriceData { year, .. }
            | Self::MissingLineItem { year, .. }
            | Self::Source { year, .. } => *year,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoPriceData { .. } => "metrics.no_price_data",
            Self::MissingLineItem { .. } => "metrics.missing_line_item",
            Self::Source { .. } => "metrics.source",
        }
    }
}

/// Ten ratios for `symbol` in `year` from already-fetched inputs.
///
/// `prices` should hold that year's observations; its last close is the
/// end-of-year price. Statement columns are matched by the year of their
/// period-end date. A line item row that is absent altogether aborts the
/// year; an absent or blank year only makes the dependent ratios unavailable.
pub fn derive_annual_metrics(
    symbol: &Symbol,
    year: i32,
    prices: &PriceSeries,
    snapshot: &FundamentalsSnapshot,
) -> Result<AnnualMetrics, MetricsError> {
    if prices.is_empty() {
        return Err(MetricsError::NoPriceData {
            symbol: symbol.clone(),
            year,
        });
    }

    let lookup = |statement: &FinancialStatement, row: &str, year: i32| {
        statement.value(row, year).map_err(|error| match error {
            StatementError::MissingRow { statement, row } => MetricsError::MissingLineItem {
                symbol: symbol.clone(),
                year,
                statement,
                item: row,
            },
        })
    };

    let income = &snapshot.statements.income;
    let balance = &snapshot.statements.balance_sheet;

    let net_income = lookup(income, line_items::NET_INCOME, year)?;
    let total_equity = lookup(balance, line_items::TOTAL_EQUITY, year)?;
    let total_assets = lookup(balance, line_items::TOTAL_ASSETS, year)?;
    let gross_profit = lookup(income, line_items::GROSS_PROFIT, year)?;
    let revenue = lookup(income, line_items::TOTAL_REVENUE, year)?;
    let prior_revenue = lookup(income, line_items::TOTAL_REVENUE, year - 1)?;
    let total_liabilities = lookup(balance, line_items::TOTAL_LIABILITIES, year)?;
    let ebitda = lookup(income, line_items::EBITDA, year)?;

    let info = &snapshot.info;
    let market_cap = info.get(info_keys::MARKET_CAP);
    let trailing_eps = info.get(info_keys::TRAILING_EPS);
    let close = prices.last_close();

    let pe_ratio = safe_divide(close, trailing_eps);
    let revenue_growth = safe_divide(
        revenue.zip(prior_revenue).map(|(current, prior)| current - prior),
        prior_revenue,
    );
    let peg_ratio = info
        .get(info_keys::PEG_RATIO)
        .or_else(|| safe_divide(pe_ratio, safe_divide(revenue_growth, Some(100.0))));

    let mut metrics = AnnualMetrics::new(symbol.clone(), year);
    metrics.set(MetricName::Roe, safe_divide(net_income, total_equity));
    metrics.set(MetricName::Roa, safe_divide(net_income, total_assets));
    metrics.set(MetricName::GrossProfitMargin, safe_divide(gross_profit, revenue));
    metrics.set(MetricName::DebtToEquity, safe_divide(total_liabilities, total_equity));
    metrics.set(MetricName::PeRatio, pe_ratio);
    metrics.set(MetricName::EvEbitda, info.get(info_keys::ENTERPRISE_TO_EBITDA));
    metrics.set(MetricName::PEbitda, safe_divide(market_cap, ebitda));
    metrics.set(MetricName::EarningsYield, safe_divide(trailing_eps, close));
    metrics.set(MetricName::RevenueGrowth, revenue_growth);
    metrics.set(MetricName::PegRatio, peg_ratio);
    Ok(metrics)
}

/// Fetches a ticker's inputs for one year and derives its ratios.
#[derive(Clone, Copy)]
pub struct MetricsCalculator<'a> {
    provider: &'a dyn MarketDataProvider,
}

impl<'a> MetricsCalculator<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        Self { provider }
    }

    /// Prices for `[year-01-01, year-12-31)` and a fresh fundamentals snapshot.
    pub async fn compute(&self, symbol: &Symbol, year: i32) -> Result<AnnualMetrics, MetricsError> {
        let prices = self.year_prices(symbol, year).await?;
        let snapshot = self
            .provider
            .fundamentals(symbol)
            .await
            .map_err(|source| MetricsError::Source {
                symbol: symbol.clone(),
                year,
                source,
            })?;
        derive_annual_metrics(symbol, year, &prices, &snapshot)
    }

    /// Observations for `[year-01-01, year-12-31)`. An empty window is [`MetricsError::NoPriceData`].
    pub async fn year_prices(
        &self,
        symbol: &Symbol,
        year: i32,
    ) -> Result<PriceSeries, MetricsError> {
        let source_error = |source: SourceError| MetricsError::Source {
            symbol: symbol.clone(),
            year,
            source,
        };

        let request = PriceHistoryRequest::for_year(symbol.clone(), year).map_err(source_error)?;
        let prices = self
            .provider
            .price_history(request)
            .await
            .map_err(source_error)?;
        debug!(symbol = %symbol, year, points = prices.len(), "loaded yearly prices");

        if prices.is_empty() {
            return Err(MetricsError::NoPriceData {
                symbol: symbol.clone(),
                year,
            });
        }
        Ok(prices)
    }
}
