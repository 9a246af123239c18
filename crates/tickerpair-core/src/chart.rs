//! Price history of two tickers packaged for plotting.

use serde::Serialize;
use tracing::{debug, warn};

use crate::provider::{MarketDataProvider, PriceHistoryRequest, SourceError};
use crate::{PricePoint, PriceSeries, Symbol, YearRange};

pub const X_LABEL: &str = "Date";
pub const Y_LABEL: &str = "Stock Price";

/// One plotted line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<PricePoint>,
}

impl ChartSeries {
    fn from_series(series: PriceSeries) -> Self {
        Self {
            label: series.symbol.to_string(),
            points: series.points,
        }
    }

    pub fn summary(&self) -> SeriesSummary {
        let closes = || self.points.iter().map(|point| point.close);
        SeriesSummary {
            label: self.label.clone(),
            observations: self.points.len(),
            first: self.points.first().map(|point| point.close),
            last: self.points.last().map(|point| point.close),
            min: closes().reduce(f64::min),
            max: closes().reduce(f64::max),
        }
    }
}

/// First, last and extreme closes of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub label: String,
    pub observations: usize,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Everything a renderer needs to draw both closing-price lines on one set of axes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

impl PriceChart {
    pub fn title_for(left: &Symbol, right: &Symbol, years: YearRange) -> String {
        format!(
            "Stock Prices: {left} vs {right} ({}-{})",
            years.start(),
            years.end()
        )
    }

    pub fn summaries(&self) -> Vec<SeriesSummary> {
        self.series.iter().map(ChartSeries::summary).collect()
    }
}

/// Closes of both tickers over `[start-01-01, end-12-31)`.
///
/// An empty series is kept as an empty line, not an error.
pub async fn price_chart(
    provider: &dyn MarketDataProvider,
    left: &Symbol,
    right: &Symbol,
    years: YearRange,
) -> Result<PriceChart, SourceError> {
    let mut series = Vec::with_capacity(2);
    for symbol in [left, right] {
        let request = PriceHistoryRequest::for_years(symbol.clone(), years)?;
        let prices = provider.price_history(request).await?;
        if prices.is_empty() {
            warn!(symbol = %symbol, "no prices to plot");
        }
        debug!(symbol = %symbol, points = prices.len(), "loaded chart series");
        series.push(ChartSeries::from_series(prices));
    }

    Ok(PriceChart {
        title: PriceChart::title_for(left, right, years),
        x_label: String::from(X_LABEL),
        y_label: String::from(Y_LABEL),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryProvider;

    #[tokio::test]
    async fn chart_spans_the_whole_range_for_both_tickers() {
        let left = Symbol::parse("tsla").expect("valid symbol");
        let right = Symbol::parse("msft").expect("valid symbol");
        let years = YearRange::new(2021, 2023).expect("valid range");
        let provider = InMemoryProvider::synthetic(&[left.clone(), right.clone()], years);

        let chart = price_chart(&provider, &left, &right, years)
            .await
            .expect("chart");

        assert_eq!(chart.title, "Stock Prices: TSLA vs MSFT (2021-2023)");
        assert_eq!(chart.x_label, "Date");
        assert_eq!(chart.y_label, "Stock Price");
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].label, "TSLA");

        let summary = &chart.summaries()[1];
        assert_eq!(summary.label, "MSFT");
        assert!(summary.observations > 700);
        assert!(summary.min <= summary.first && summary.first <= summary.max);
        let first_year = chart.series[1].points[0].ts.year();
        let last_year = chart.series[1].points[summary.observations - 1].ts.year();
        assert_eq!((first_year, last_year), (2021, 2023));
    }
}
