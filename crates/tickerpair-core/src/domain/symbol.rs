use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Ticker symbol, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse free-text ticker input. `" tsla "` becomes `TSLA`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let first = normalized.chars().next().ok_or(ValidationError::EmptySymbol)?;

        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        // Numeric listings (7203.T, 0700.HK) and '^' indices (^GSPC) are valid starts.
        if !(first.is_ascii_alphanumeric() || first == '^') {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }

        // Share classes and foreign listings use '.', '-' and '=' (BRK-B, VOD.L).
        if let Some((index, ch)) = normalized
            .chars()
            .enumerate()
            .skip(1)
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '=')))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Column key used when a ticker's values are flattened into a shared row.
    pub fn prefixed(&self, label: &str) -> String {
        format!("{}_{label}", self.0)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_user_input_to_uppercase() {
        let parsed = Symbol::parse(" tsla ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "TSLA");
    }

    #[test]
    fn accepts_share_class_suffixes() {
        assert_eq!(Symbol::parse("brk-b").expect("valid").as_str(), "BRK-B");
        assert_eq!(Symbol::parse("vod.l").expect("valid").as_str(), "VOD.L");
    }

    #[test]
    fn accepts_numeric_listings_and_indices() {
        assert_eq!(Symbol::parse("7203.t").expect("valid").as_str(), "7203.T");
        assert_eq!(Symbol::parse("0700.HK").expect("valid").as_str(), "0700.HK");
        assert_eq!(Symbol::parse("005930.ks").expect("valid").as_str(), "005930.KS");
        assert_eq!(Symbol::parse("^gspc").expect("valid").as_str(), "^GSPC");
    }

    #[test]
    fn rejects_blank_and_malformed_input() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert!(matches!(
            Symbol::parse(".X"),
            Err(ValidationError::SymbolInvalidStart { ch: '.' })
        ));
        assert!(matches!(
            Symbol::parse("GS^PC"),
            Err(ValidationError::SymbolInvalidChar { ch: '^', index: 2 })
        ));
        assert!(matches!(
            Symbol::parse("MS FT"),
            Err(ValidationError::SymbolInvalidChar { ch: ' ', index: 2 })
        ));
    }

    #[test]
    fn prefixes_column_labels() {
        let symbol = Symbol::parse("msft").expect("valid");
        assert_eq!(symbol.prefixed("ROE"), "MSFT_ROE");
    }
}
