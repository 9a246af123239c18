//! # Domain Models
//!
//! Read-only views of what a market-data provider returns, plus the small
//! value types used to ask for it.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Upper-cased ticker |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`YearRange`] | Inclusive calendar-year range |
//! | [`PriceSeries`] | Daily closes of one ticker |
//! | [`FinancialStatement`] | Line items by fiscal-year column |
//! | [`StatementSet`] | Income, balance sheet and cash flow statements |
//! | [`CompanyInfo`] | Point-in-time provider statistics |
//! | [`FundamentalsSnapshot`] | Statements and statistics fetched together |

mod company;
mod price;
mod statement;
mod symbol;
mod timestamp;
mod years;

pub use company::{info_keys, CompanyInfo, FundamentalsSnapshot};
pub use price::{PricePoint, PriceSeries};
pub use statement::{line_items, FinancialStatement, StatementError, StatementKind, StatementSet};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
pub use years::{YearRange, MAX_YEAR, MIN_YEAR};
