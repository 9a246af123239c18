//! Market-data provider contract and request types.
//!
//! | Method | Request | Response |
//! |--------|---------|----------|
//! | [`price_history`](MarketDataProvider::price_history) | [`PriceHistoryRequest`] | [`PriceSeries`] |
//! | [`statements`](MarketDataProvider::statements) | [`Symbol`] | [`StatementSet`] |
//! | [`company_info`](MarketDataProvider::company_info) | [`Symbol`] | [`CompanyInfo`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{
    CompanyInfo, FundamentalsSnapshot, PriceSeries, ProviderId, StatementSet, Symbol,
    UtcDateTime, YearRange,
};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Internal,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Daily closes of one symbol over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryRequest {
    pub symbol: Symbol,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl PriceHistoryRequest {
    pub fn new(symbol: Symbol, start: UtcDateTime, end: UtcDateTime) -> Result<Self, SourceError> {
        if start >= end {
            return Err(SourceError::invalid_request(format!(
                "price history start {start} must be before end {end}"
            )));
        }
        Ok(Self { symbol, start, end })
    }

    /// January 1st up to, but excluding, December 31st of `year`.
    pub fn for_year(symbol: Symbol, year: i32) -> Result<Self, SourceError> {
        Self::for_years(symbol, YearRange::single(year).map_err(invalid)?)
    }

    /// January 1st of the first year up to, but excluding, December 31st of the last.
    pub fn for_years(symbol: Symbol, years: YearRange) -> Result<Self, SourceError> {
        let start = UtcDateTime::start_of_year(years.start()).map_err(invalid)?;
        let end = UtcDateTime::end_of_year(years.end()).map_err(invalid)?;
        Self::new(symbol, start, end)
    }
}

fn invalid(error: crate::ValidationError) -> SourceError {
    SourceError::invalid_request(error.to_string())
}

/// Boxed future returned by provider methods.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Source of prices, financial statements and company statistics.
///
/// Implementations must be `Send + Sync`; the CLI holds one behind a trait object.
pub trait MarketDataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Daily closes in the request window. An empty series is not an error.
    fn price_history<'a>(&'a self, request: PriceHistoryRequest) -> ProviderFuture<'a, PriceSeries>;

    /// Annual income statement, balance sheet and cash flow statement.
    fn statements<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, StatementSet>;

    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CompanyInfo>;

    /// Statements and statistics fetched together.
    fn fundamentals<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, FundamentalsSnapshot> {
        Box::pin(async move {
            let statements = self.statements(symbol).await?;
            let info = self.company_info(symbol).await?;
            Ok(FundamentalsSnapshot::new(symbol.clone(), statements, info))
        })
    }
}
