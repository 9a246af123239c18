use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::{Date, Month, Weekday};
use tracing::debug;

use crate::provider::{MarketDataProvider, PriceHistoryRequest, ProviderFuture, SourceError};
use crate::{
    info_keys, line_items, CompanyInfo, PricePoint, PriceSeries, ProviderId, StatementKind,
    StatementSet, Symbol, UtcDateTime, YearRange,
};

/// Provider backed by fixtures held in memory.
///
/// Used by tests and by the CLI's `--mock` mode. A symbol with no fixtures at
/// all is reported as not found; a known symbol without prices in a window
/// yields an empty series.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    prices: BTreeMap<Symbol, Vec<PricePoint>>,
    statements: BTreeMap<Symbol, StatementSet>,
    info: BTreeMap<Symbol, CompanyInfo>,
    price_fetches: AtomicUsize,
    statement_fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, symbol: Symbol, points: Vec<PricePoint>) -> Self {
        self.prices.entry(symbol).or_default().extend(points);
        self
    }

    pub fn with_statements(mut self, symbol: Symbol, statements: StatementSet) -> Self {
        self.statements.insert(symbol, statements);
        self
    }

    pub fn with_company_info(mut self, symbol: Symbol, info: CompanyInfo) -> Self {
        self.info.insert(symbol, info);
        self
    }

    /// Deterministic prices, statements and statistics for every symbol.
    ///
    /// Statements also cover the year before `years` so revenue growth is
    /// available in the first year. Values are derived from the symbol text,
    /// so the same inputs always produce the same data.
    pub fn synthetic(symbols: &[Symbol], years: YearRange) -> Self {
        symbols.iter().fold(Self::new(), |provider, symbol| {
            let profile = SyntheticProfile::for_symbol(symbol);
            provider
                .with_prices(symbol.clone(), profile.prices(years))
                .with_statements(symbol.clone(), profile.statements(years))
                .with_company_info(symbol.clone(), profile.company_info(years))
        })
    }

    /// Number of price history requests served so far.
    pub fn price_fetches(&self) -> usize {
        self.price_fetches.load(Ordering::Relaxed)
    }

    /// Number of statement requests served so far.
    pub fn statement_fetches(&self) -> usize {
        self.statement_fetches.load(Ordering::Relaxed)
    }

    fn is_known(&self, symbol: &Symbol) -> bool {
        self.prices.contains_key(symbol)
            || self.statements.contains_key(symbol)
            || self.info.contains_key(symbol)
    }

    fn ensure_known(&self, symbol: &Symbol) -> Result<(), SourceError> {
        if self.is_known(symbol) {
            Ok(())
        } else {
            Err(SourceError::not_found(format!(
                "no fixtures registered for {symbol}"
            )))
        }
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Memory
    }

    fn price_history<'a>(&'a self, request: PriceHistoryRequest) -> ProviderFuture<'a, PriceSeries> {
        Box::pin(async move {
            self.price_fetches.fetch_add(1, Ordering::Relaxed);
            self.ensure_known(&request.symbol)?;

            let points = self
                .prices
                .get(&request.symbol)
                .cloned()
                .unwrap_or_default();
            let series = PriceSeries::new(request.symbol.clone(), points)
                .between(request.start, request.end);
            debug!(symbol = %request.symbol, points = series.len(), "served in-memory prices");
            Ok(series)
        })
    }

    fn statements<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, StatementSet> {
        Box::pin(async move {
            self.statement_fetches.fetch_add(1, Ordering::Relaxed);
            self.ensure_known(symbol)?;
            Ok(self.statements.get(symbol).cloned().unwrap_or_default())
        })
    }

    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CompanyInfo> {
        Box::pin(async move {
            self.ensure_known(symbol)?;
            Ok(self.info.get(symbol).cloned().unwrap_or_default())
        })
    }
}

/// Per-symbol knobs for synthetic data.
#[derive(Debug, Clone, Copy)]
struct SyntheticProfile {
    base_price: f64,
    base_revenue: f64,
    revenue_growth: f64,
    shares: f64,
    ev_to_ebitda: f64,
}

impl SyntheticProfile {
    fn for_symbol(symbol: &Symbol) -> Self {
        let seed = symbol_seed(symbol);
        Self {
            base_price: 40.0 + (seed % 400) as f64,
            base_revenue: 10.0e9 + (seed % 90) as f64 * 1.0e9,
            revenue_growth: 0.03 + (seed % 15) as f64 / 100.0,
            shares: 1.0e9 + (seed % 20) as f64 * 1.0e8,
            ev_to_ebitda: 12.0 + (seed % 16) as f64,
        }
    }

    fn revenue(self, year: i32, years: YearRange) -> f64 {
        let elapsed = year - years.start() + 1;
        self.base_revenue * (1.0 + self.revenue_growth).powi(elapsed)
    }

    fn close(self, date: Date, years: YearRange) -> f64 {
        let elapsed = f64::from(date.year() - years.start());
        let within_year = f64::from(date.ordinal()) / 366.0;
        let trend = 1.0 + 0.12 * (elapsed + within_year);
        let wave = 1.0 + 0.04 * (f64::from(date.ordinal()) / 29.0).sin();
        (self.base_price * trend * wave * 100.0).round() / 100.0
    }

    /// One close per weekday across the whole range.
    fn prices(self, years: YearRange) -> Vec<PricePoint> {
        let mut points = Vec::new();
        for year in years.years() {
            let Ok(mut date) = Date::from_calendar_date(year, Month::January, 1) else {
                continue;
            };
            while date.year() == year {
                if !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday) {
                    let ts = UtcDateTime::at_midnight(date);
                    if let Ok(point) = PricePoint::new(ts, self.close(date, years)) {
                        points.push(point);
                    }
                }
                let Some(next) = date.next_day() else { break };
                date = next;
            }
        }
        points
    }

    fn statements(self, years: YearRange) -> StatementSet {
        let mut statements = StatementSet::default();

        for year in (years.start() - 1)..=years.end() {
            let Ok(period_end) = Date::from_calendar_date(year, Month::December, 31) else {
                continue;
            };
            let revenue = self.revenue(year, years);
            let net_income = revenue * 0.12;
            let total_assets = revenue * 1.6;
            let total_liabilities = total_assets * 0.55;
            let total_equity = total_assets - total_liabilities;
            let operating_cash_flow = net_income * 1.3;
            let capital_expenditure = -revenue * 0.05;

            let income = statements.get_mut(StatementKind::Income);
            income.insert(line_items::TOTAL_REVENUE, period_end, Some(revenue));
            income.insert(line_items::COST_OF_REVENUE, period_end, Some(revenue * 0.6));
            income.insert(line_items::GROSS_PROFIT, period_end, Some(revenue * 0.4));
            income.insert(line_items::OPERATING_INCOME, period_end, Some(revenue * 0.18));
            income.insert(line_items::NET_INCOME, period_end, Some(net_income));
            income.insert(line_items::EBITDA, period_end, Some(revenue * 0.26));
            income.insert(line_items::DILUTED_EPS, period_end, Some(net_income / self.shares));

            let balance = statements.get_mut(StatementKind::BalanceSheet);
            balance.insert(line_items::TOTAL_ASSETS, period_end, Some(total_assets));
            balance.insert(line_items::TOTAL_LIABILITIES, period_end, Some(total_liabilities));
            balance.insert(line_items::TOTAL_EQUITY, period_end, Some(total_equity));
            balance.insert(line_items::STOCKHOLDERS_EQUITY, period_end, Some(total_equity * 0.98));
            balance.insert(line_items::TOTAL_DEBT, period_end, Some(total_liabilities * 0.4));
            balance.insert(line_items::CASH_AND_EQUIVALENTS, period_end, Some(total_assets * 0.1));

            let cash_flow = statements.get_mut(StatementKind::CashFlow);
            cash_flow.insert(line_items::OPERATING_CASH_FLOW, period_end, Some(operating_cash_flow));
            cash_flow.insert(line_items::CAPITAL_EXPENDITURE, period_end, Some(capital_expenditure));
            cash_flow.insert(
                line_items::FREE_CASH_FLOW,
                period_end,
                Some(operating_cash_flow + capital_expenditure),
            );
        }

        statements
    }

    /// Point-in-time statistics as of the last year in range. No `pegRatio`.
    fn company_info(self, years: YearRange) -> CompanyInfo {
        let latest_eps = self.revenue(years.end(), years) * 0.12 / self.shares;
        let latest_close = Date::from_calendar_date(years.end(), Month::December, 30)
            .map(|date| self.close(date, years))
            .unwrap_or(self.base_price);

        CompanyInfo::new()
            .with(info_keys::MARKET_CAP, latest_close * self.shares)
            .with(info_keys::TRAILING_EPS, latest_eps)
            .with(info_keys::ENTERPRISE_TO_EBITDA, self.ev_to_ebitda)
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SourceErrorKind;

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("valid symbol")
    }

    #[tokio::test]
    async fn synthetic_data_is_deterministic_per_symbol() {
        let years = YearRange::new(2021, 2022).expect("valid range");
        let first = InMemoryProvider::synthetic(&[symbol("TSLA")], years);
        let second = InMemoryProvider::synthetic(&[symbol("TSLA")], years);
        let request = PriceHistoryRequest::for_year(symbol("TSLA"), 2022).expect("request");

        let a = first.price_history(request.clone()).await.expect("prices");
        let b = second.price_history(request).await.expect("prices");

        assert_eq!(a, b);
        assert!(a.len() > 250);
        assert!(a.points.iter().all(|point| point.ts.year() == 2022));
    }

    #[tokio::test]
    async fn synthetic_statements_include_prior_year() {
        let years = YearRange::new(2021, 2023).expect("valid range");
        let provider = InMemoryProvider::synthetic(&[symbol("MSFT")], years);

        let statements = provider.statements(&symbol("MSFT")).await.expect("statements");

        assert_eq!(
            statements.income.year_labels(),
            vec!["2023", "2022", "2021", "2020"]
        );
        assert_eq!(provider.statement_fetches(), 1);
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let provider = InMemoryProvider::new();
        let error = provider
            .company_info(&symbol("NOPE"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }
}
