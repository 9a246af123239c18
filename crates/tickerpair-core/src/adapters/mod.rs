//! Provider implementations.
//!
//! | Adapter | Backing data |
//! |---------|--------------|
//! | [`YahooAdapter`] | Yahoo Finance chart, fundamentals timeseries and quoteSummary endpoints |
//! | [`InMemoryProvider`] | Fixtures registered in code, or deterministic synthetic data |

mod memory;
mod yahoo;

pub use memory::InMemoryProvider;
pub use yahoo::YahooAdapter;
