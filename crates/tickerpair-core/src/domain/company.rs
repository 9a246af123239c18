use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{StatementSet, Symbol, UtcDateTime};

/// Provider statistics keys read by the metric derivation.
pub mod info_keys {
    pub const MARKET_CAP: &str = "marketCap";
    pub const TRAILING_EPS: &str = "trailingEps";
    pub const ENTERPRISE_TO_EBITDA: &str = "enterpriseToEbitda";
    pub const PEG_RATIO: &str = "pegRatio";
}

/// Point-in-time numeric statistics about a company, keyed by provider field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyInfo {
    fields: BTreeMap<String, f64>,
}

impl CompanyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite values are dropped so lookups only ever see real numbers.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.fields.insert(key.into(), value);
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

/// Everything the metric derivation reads about a company apart from prices.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsSnapshot {
    pub symbol: Symbol,
    pub statements: StatementSet,
    pub info: CompanyInfo,
    pub fetched_at: UtcDateTime,
}

impl FundamentalsSnapshot {
    pub fn new(symbol: Symbol, statements: StatementSet, info: CompanyInfo) -> Self {
        Self {
            symbol,
            statements,
            info,
            fetched_at: UtcDateTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_non_finite_statistics() {
        let info = CompanyInfo::new()
            .with(info_keys::MARKET_CAP, 2.5e12)
            .with(info_keys::PEG_RATIO, f64::INFINITY);

        assert_eq!(info.get(info_keys::MARKET_CAP), Some(2.5e12));
        assert!(!info.contains(info_keys::PEG_RATIO));
        assert_eq!(info.len(), 1);
    }
}
