//! Provider configuration with environment overrides.

use std::env;

use tracing::warn;

pub const TIMEOUT_ENV: &str = "TICKERPAIR_TIMEOUT_MS";
pub const COOKIE_ENV: &str = "YAHOO_COOKIE";

/// Settings for the Yahoo Finance adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooConfig {
    /// Host for chart, quoteSummary and crumb requests.
    pub query_host: String,
    /// Host for the fundamentals timeseries endpoint.
    pub timeseries_host: String,
    /// Page visited to obtain session cookies.
    pub cookie_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Pre-obtained session cookie. Skips the cookie handshake when set.
    pub cookie: Option<String>,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            query_host: String::from("https://query1.finance.yahoo.com"),
            timeseries_host: String::from("https://query2.finance.yahoo.com"),
            cookie_url: String::from("https://fc.yahoo.com"),
            user_agent: String::from(concat!("tickerpair/", env!("CARGO_PKG_VERSION"))),
            timeout_ms: 10_000,
            cookie: None,
        }
    }
}

impl YahooConfig {
    /// Defaults overlaid with `TICKERPAIR_TIMEOUT_MS` and `YAHOO_COOKIE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => config.timeout_ms = timeout_ms,
                _ => warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
            }
        }

        config.cookie = env::var(COOKIE_ENV)
            .ok()
            .map(|cookie| cookie.trim().to_owned())
            .filter(|cookie| !cookie.is_empty());

        config
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Point every endpoint at one base URL. Used against local fixtures.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.query_host = base_url.clone();
        self.timeseries_host = base_url.clone();
        self.cookie_url = base_url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_override_applies_to_all_hosts() {
        let config = YahooConfig::default().with_base_url("http://fixture.local");
        assert_eq!(config.query_host, "http://fixture.local");
        assert_eq!(config.timeseries_host, "http://fixture.local");
        assert_eq!(config.cookie_url, "http://fixture.local");
        assert_eq!(config.timeout_ms, 10_000);
    }
}
