//! # Tickerpair Core
//!
//! Annual fundamentals metrics and year-by-year comparison of two tickers.
//!
//! ## Overview
//!
//! - **Guarded arithmetic** where every unavailable input yields `None`
//! - **Per-year metric derivation** from prices, statements and company statistics
//! - **Range comparison** merging two tickers' metrics into one table per year
//! - **Price chart data** for both tickers over the full range
//! - **Provider trait** with Yahoo Finance and in-memory implementations
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance and in-memory providers |
//! | [`arithmetic`] | `safe_divide` and `to_scalar` |
//! | [`chart`] | Two-series price chart data |
//! | [`comparison`] | Range comparator and comparison table |
//! | [`config`] | Provider configuration |
//! | [`domain`] | Symbols, prices, statements, company statistics |
//! | [`error`] | Input validation errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`metrics`] | The ten annual ratios |
//! | [`provider`] | Provider trait and request types |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickerpair_core::{ComparisonRequest, RangeComparator, YahooAdapter, YahooConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = YahooAdapter::new(YahooConfig::from_env())?;
//!     let request = ComparisonRequest::parse("TSLA", "MSFT", 2021, 2023)?;
//!
//!     let report = RangeComparator::new(&provider).compare(&request).await?;
//!     for row in &report.table.rows {
//!         println!("{}: {} metrics", row.year, row.left.available() + row.right.available());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ RangeComparator │────▶│ MetricsCalculator│
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketData      │────▶│ HTTP Client      │
//! │ Provider (trait)│     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Unavailable values
//!
//! ```rust
//! use tickerpair_core::{safe_divide, to_scalar};
//!
//! assert_eq!(safe_divide(Some(10.0), Some(4.0)), Some(2.5));
//! assert_eq!(safe_divide(Some(10.0), Some(0.0)), None);
//! assert_eq!(safe_divide(None, Some(4.0)), None);
//! assert_eq!(to_scalar(vec![2.0, 3.0, 4.0]), 9.0);
//! ```

pub mod adapters;
pub mod arithmetic;
pub mod chart;
pub mod comparison;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod metrics;
pub mod provider;
pub mod source;

pub use adapters::{InMemoryProvider, YahooAdapter};
pub use arithmetic::{safe_divide, to_scalar, CellValue};
pub use chart::{price_chart, ChartSeries, PriceChart, SeriesSummary};
pub use comparison::{
    ComparisonError, ComparisonReport, ComparisonRequest, ComparisonRow, ComparisonTable,
    RangeComparator, SkippedYear,
};
pub use config::YahooConfig;
pub use domain::*;
pub use error::ValidationError;
pub use metrics::{derive_annual_metrics, AnnualMetrics, MetricName, MetricsCalculator, MetricsError};
pub use provider::{
    MarketDataProvider, PriceHistoryRequest, ProviderFuture, SourceError, SourceErrorKind,
};
pub use source::ProviderId;
