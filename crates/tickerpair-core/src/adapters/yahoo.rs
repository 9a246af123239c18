use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::macros::format_description;
use time::Date;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::YahooConfig;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::provider::{MarketDataProvider, PriceHistoryRequest, ProviderFuture, SourceError};
use crate::{
    line_items, CompanyInfo, PricePoint, PriceSeries, ProviderId, StatementKind, StatementSet,
    Symbol, UtcDateTime,
};

const REFERER: &str = "https://finance.yahoo.com/";

/// quoteSummary modules scanned for company statistics, in precedence order.
const SUMMARY_MODULES: [&str; 4] = [
    "defaultKeyStatistics",
    "financialData",
    "summaryDetail",
    "price",
];

/// Earliest period requested from the fundamentals timeseries (1985-08-23).
const TIMESERIES_PERIOD1: i64 = 493_590_046;

/// Timeseries fields fetched per statement, with the row label each one fills.
const STATEMENT_FIELDS: [(StatementKind, &str, &str); 16] = [
    (StatementKind::Income, "TotalRevenue", line_items::TOTAL_REVENUE),
    (StatementKind::Income, "CostOfRevenue", line_items::COST_OF_REVENUE),
    (StatementKind::Income, "GrossProfit", line_items::GROSS_PROFIT),
    (StatementKind::Income, "OperatingIncome", line_items::OPERATING_INCOME),
    (StatementKind::Income, "NetIncome", line_items::NET_INCOME),
    (StatementKind::Income, "EBITDA", line_items::EBITDA),
    (StatementKind::Income, "DilutedEPS", line_items::DILUTED_EPS),
    (StatementKind::BalanceSheet, "TotalAssets", line_items::TOTAL_ASSETS),
    (
        StatementKind::BalanceSheet,
        "TotalLiabilitiesNetMinorityInterest",
        line_items::TOTAL_LIABILITIES,
    ),
    (
        StatementKind::BalanceSheet,
        "TotalEquityGrossMinorityInterest",
        line_items::TOTAL_EQUITY,
    ),
    (
        StatementKind::BalanceSheet,
        "StockholdersEquity",
        line_items::STOCKHOLDERS_EQUITY,
    ),
    (StatementKind::BalanceSheet, "TotalDebt", line_items::TOTAL_DEBT),
    (
        StatementKind::BalanceSheet,
        "CashAndCashEquivalents",
        line_items::CASH_AND_EQUIVALENTS,
    ),
    (StatementKind::CashFlow, "OperatingCashFlow", line_items::OPERATING_CASH_FLOW),
    (StatementKind::CashFlow, "CapitalExpenditure", line_items::CAPITAL_EXPENDITURE),
    (StatementKind::CashFlow, "FreeCashFlow", line_items::FREE_CASH_FLOW),
];

// ============================================================================
// Session - cookie/crumb handshake
// ============================================================================

/// Yahoo's unofficial API wants a session cookie plus a crumb token on every call.
///
/// The cookie comes from `YAHOO_COOKIE` when configured, otherwise from the
/// client's cookie jar after visiting the cookie page. The crumb is fetched
/// once and reused until a request is rejected with 401 or 429.
#[derive(Debug, Default)]
struct YahooSession {
    crumb: Mutex<Option<String>>,
}

impl YahooSession {
    async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        config: &YahooConfig,
    ) -> Result<String, SourceError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = fetch_crumb(http_client, config).await?;
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }
}

fn session_auth(config: &YahooConfig) -> HttpAuth {
    config
        .cookie
        .clone()
        .map_or(HttpAuth::None, HttpAuth::Cookie)
}

async fn fetch_crumb(
    http_client: &dyn HttpClient,
    config: &YahooConfig,
) -> Result<String, SourceError> {
    let auth = session_auth(config);

    if auth == HttpAuth::None {
        // Any status is fine here; only the Set-Cookie headers matter.
        let cookie_request = HttpRequest::get(config.cookie_url.as_str())
            .with_header("referer", REFERER)
            .with_timeout_ms(config.timeout_ms);
        http_client.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", e.message()))
        })?;
    }

    let mut hosts = vec![config.query_host.as_str()];
    if config.timeseries_host != config.query_host {
        hosts.push(config.timeseries_host.as_str());
    }

    for host in hosts {
        let crumb_request = HttpRequest::get(format!("{host}/v1/test/getcrumb"))
            .with_header("referer", REFERER)
            .with_auth(&auth)
            .with_timeout_ms(config.timeout_ms);

        let response = match http_client.execute(crumb_request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(host, error = %error, "yahoo crumb request failed");
                continue;
            }
        };

        if response.status == 429 {
            return Err(SourceError::rate_limited(
                "yahoo rate limited the crumb request",
            ));
        }

        let body = response.body.trim();
        if response.is_success() && is_plausible_crumb(body) {
            debug!(host, "obtained yahoo crumb");
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

fn is_plausible_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Yahoo Finance provider over the chart, fundamentals-timeseries and quoteSummary endpoints.
#[derive(Clone)]
pub struct YahooAdapter {
    config: YahooConfig,
    http_client: Arc<dyn HttpClient>,
    session: Arc<YahooSession>,
}

impl YahooAdapter {
    pub fn new(config: YahooConfig) -> Result<Self, SourceError> {
        let http_client = ReqwestHttpClient::new(&config.user_agent)
            .map_err(|e| SourceError::internal(e.message().to_owned()))?;
        Ok(Self::with_http_client(config, Arc::new(http_client)))
    }

    pub fn with_http_client(config: YahooConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            session: Arc::new(YahooSession::default()),
        }
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// GET with the session crumb. A 401 or 429 invalidates the crumb and the
    /// request is sent once more with a fresh one.
    async fn fetch(&self, request: HttpRequest) -> Result<String, SourceError> {
        let response = self.send_with_crumb(request.clone()).await?;

        let response = if response.status == 401 || response.status == 429 {
            debug!(status = response.status, url = %request.url, "refreshing yahoo session");
            self.session.invalidate().await;
            self.send_with_crumb(request).await?
        } else {
            response
        };

        match response.status {
            status if (200..300).contains(&status) => Ok(response.body),
            404 => Err(SourceError::not_found(upstream_message(&response))),
            429 => Err(SourceError::rate_limited(upstream_message(&response))),
            400 => Err(SourceError::invalid_request(upstream_message(&response))),
            _ => Err(SourceError::unavailable(upstream_message(&response))),
        }
    }

    async fn send_with_crumb(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        let crumb = self
            .session
            .crumb(self.http_client.as_ref(), &self.config)
            .await?;
        let request = request
            .with_query("crumb", &crumb)
            .with_header("referer", REFERER)
            .with_auth(&session_auth(&self.config))
            .with_timeout_ms(self.config.timeout_ms);

        debug!(url = %request.url, "yahoo request");
        self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                SourceError::unavailable(format!("yahoo request timed out: {}", e.message()))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            }
        })
    }

    async fn fetch_price_history(
        &self,
        request: &PriceHistoryRequest,
    ) -> Result<PriceSeries, SourceError> {
        let http_request = HttpRequest::get(format!(
            "{}/v8/finance/chart/{}",
            self.config.query_host,
            urlencoding::encode(request.symbol.as_str())
        ))
        .with_query("period1", &request.start.unix_timestamp().to_string())
        .with_query("period2", &request.end.unix_timestamp().to_string())
        .with_query("interval", "1d")
        .with_query("includeAdjustedClose", "true");

        let body = self.fetch(http_request).await?;
        let series = parse_chart(&request.symbol, &body)?.between(request.start, request.end);
        debug!(
            symbol = %request.symbol,
            points = series.len(),
            "fetched yahoo price history"
        );
        Ok(series)
    }

    async fn fetch_statements(&self, symbol: &Symbol) -> Result<StatementSet, SourceError> {
        let types = STATEMENT_FIELDS
            .iter()
            .map(|(_, field, _)| format!("annual{field}"))
            .collect::<Vec<_>>()
            .join(",");

        let http_request = HttpRequest::get(format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.config.timeseries_host,
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("symbol", symbol.as_str())
        .with_query("type", &types)
        .with_query("period1", &TIMESERIES_PERIOD1.to_string())
        .with_query("period2", &UtcDateTime::now().unix_timestamp().to_string());

        let body = self.fetch(http_request).await?;
        let statements = parse_timeseries(&body)?;
        debug!(
            symbol = %symbol,
            years = ?statements.income.year_labels(),
            "fetched yahoo statements"
        );
        Ok(statements)
    }

    async fn fetch_company_info(&self, symbol: &Symbol) -> Result<CompanyInfo, SourceError> {
        let http_request = HttpRequest::get(format!(
            "{}/v10/finance/quoteSummary/{}",
            self.config.query_host,
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("modules", &SUMMARY_MODULES.join(","));

        let body = self.fetch(http_request).await?;
        let info = parse_quote_summary(&body)?;
        debug!(symbol = %symbol, fields = info.len(), "fetched yahoo company info");
        Ok(info)
    }
}

impl MarketDataProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn price_history<'a>(&'a self, request: PriceHistoryRequest) -> ProviderFuture<'a, PriceSeries> {
        Box::pin(async move { self.fetch_price_history(&request).await })
    }

    fn statements<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, StatementSet> {
        Box::pin(self.fetch_statements(symbol))
    }

    fn company_info<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CompanyInfo> {
        Box::pin(self.fetch_company_info(symbol))
    }
}

fn upstream_message(response: &HttpResponse) -> String {
    let detail = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| {
            body.as_object()?
                .values()
                .find_map(|section| section.get("error")?.get("description")?.as_str().map(str::to_owned))
        });

    match detail {
        Some(detail) => format!("yahoo returned status {}: {detail}", response.status),
        None => format!("yahoo returned status {}", response.status),
    }
}

// ============================================================================
// Response parsing
// ============================================================================

fn parse_chart(symbol: &Symbol, body: &str) -> Result<PriceSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(error.into_source_error(symbol));
    }

    let Some(result) = response.chart.result.unwrap_or_default().into_iter().next() else {
        return Ok(PriceSeries::empty(symbol.clone()));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();
    let adjusted = result
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
        .map(|series| series.adjclose);

    let mut points = Vec::with_capacity(timestamps.len());
    for (index, seconds) in timestamps.into_iter().enumerate() {
        let close = adjusted
            .as_ref()
            .and_then(|values| values.get(index).copied().flatten())
            .or_else(|| closes.get(index).copied().flatten());

        let Some(close) = close else { continue };
        let ts = UtcDateTime::from_unix_timestamp(seconds)
            .map_err(|e| SourceError::internal(format!("invalid chart timestamp: {e}")))?;
        match PricePoint::new(ts, close) {
            Ok(point) => points.push(point),
            Err(error) => warn!(symbol = %symbol, %ts, %error, "skipping chart observation"),
        }
    }

    Ok(PriceSeries::new(symbol.clone(), points))
}

fn parse_timeseries(body: &str) -> Result<StatementSet, SourceError> {
    let response: YahooTimeseriesResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::internal(format!("failed to parse yahoo fundamentals timeseries: {e}"))
    })?;

    if let Some(error) = response.timeseries.error {
        return Err(SourceError::unavailable(format!(
            "yahoo timeseries API error: {}",
            error.describe()
        )));
    }

    let date_format = format_description!("[year]-[month]-[day]");
    let mut statements = StatementSet::default();

    for mut item in response.timeseries.result.unwrap_or_default() {
        let Some(type_name) = item.meta.kind.into_iter().next() else {
            continue;
        };
        let Some(field) = type_name.strip_prefix("annual") else {
            continue;
        };
        let Some((kind, _, label)) = STATEMENT_FIELDS
            .iter()
            .find(|(_, candidate, _)| *candidate == field)
        else {
            continue;
        };
        let Some(values) = item.values.remove(&type_name) else {
            continue;
        };

        let observations: Vec<Option<YahooTimeseriesValue>> = serde_json::from_value(values)
            .map_err(|e| SourceError::internal(format!("malformed '{type_name}' series: {e}")))?;

        for observation in observations.into_iter().flatten() {
            let Ok(period_end) = Date::parse(&observation.as_of_date, &date_format) else {
                warn!(date = %observation.as_of_date, field, "skipping unparseable period end");
                continue;
            };
            let value = observation.reported_value.and_then(|value| value.raw);
            statements
                .get_mut(*kind)
                .insert(*label, period_end, value);
        }
    }

    Ok(statements)
}

fn parse_quote_summary(body: &str) -> Result<CompanyInfo, SourceError> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo quoteSummary: {e}")))?;

    if let Some(error) = response.quote_summary.error {
        return Err(SourceError::unavailable(format!(
            "yahoo quoteSummary API error: {}",
            error.describe()
        )));
    }

    let mut info = CompanyInfo::new();
    let Some(result) = response.quote_summary.result.unwrap_or_default().into_iter().next() else {
        return Ok(info);
    };

    for module in SUMMARY_MODULES {
        let Some(Value::Object(fields)) = result.get(module) else {
            continue;
        };
        for (key, value) in fields {
            if info.contains(key) {
                continue;
            }
            if let Some(number) = numeric_field(value) {
                info.insert(key.as_str(), number);
            }
        }
    }

    Ok(info)
}

/// Plain numbers, or `{"raw": n, "fmt": "..."}` wrappers.
fn numeric_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Object(wrapper) => wrapper.get("raw")?.as_f64(),
        _ => None,
    }
}

// ============================================================================
// Yahoo API Response Structures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooApiError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::from("unknown error"),
        }
    }

    fn into_source_error(self, symbol: &Symbol) -> SourceError {
        if self.code.as_deref() == Some("Not Found") {
            SourceError::not_found(format!("yahoo has no chart for {symbol}"))
        } else {
            SourceError::unavailable(format!("yahoo chart API error: {}", self.describe()))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooTimeseriesResponse {
    timeseries: YahooTimeseriesData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooTimeseriesData {
    #[serde(default)]
    result: Option<Vec<YahooTimeseriesItem>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

/// One requested field. The observations sit under a key equal to the type name.
#[derive(Debug, Clone, Deserialize)]
struct YahooTimeseriesItem {
    meta: YahooTimeseriesMeta,
    #[serde(flatten)]
    values: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooTimeseriesMeta {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooTimeseriesValue {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue", default)]
    reported_value: Option<YahooRawValue>,
}

/// Yahoo wraps most numbers as `{"raw": 1.0, "fmt": "1.00"}`.
#[derive(Debug, Clone, Deserialize)]
struct YahooRawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: YahooQuoteSummaryData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<serde_json::Map<String, Value>>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpError;
    use crate::provider::SourceErrorKind;
    use crate::{info_keys, YearRange};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;

    /// Serves queued responses in order and records every request.
    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: StdMutex<VecDeque<HttpResponse>>,
        requests: StdMutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn with(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: StdMutex::new(responses.into()),
                requests: StdMutex::default(),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let next = self
                .responses
                .lock()
                .expect("response queue should not be poisoned")
                .pop_front()
                .ok_or_else(|| HttpError::new("no scripted response left"));
            Box::pin(async move { next })
        }
    }

    fn config() -> YahooConfig {
        YahooConfig {
            cookie: Some(String::from("A3=fixture")),
            ..YahooConfig::default().with_base_url("http://yahoo.test")
        }
    }

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("valid symbol")
    }

    #[test]
    fn chart_prefers_adjusted_close_and_skips_gaps() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1672756200,1672842600,1672929000],
            "indicators":{
                "quote":[{"close":[125.07,null,110.34]}],
                "adjclose":[{"adjclose":[124.9,null,null]}]
            }}],"error":null}}"#;

        let series = parse_chart(&symbol("AAPL"), body).expect("chart parses");

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_close(), Some(124.9));
        assert_eq!(series.last_close(), Some(110.34));
    }

    #[test]
    fn chart_not_found_error_maps_to_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let error = parse_chart(&symbol("ZZZZ"), body).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[test]
    fn timeseries_fills_statement_rows_by_period_end() {
        let body = r#"{"timeseries":{"result":[
            {"meta":{"symbol":["MSFT"],"type":["annualNetIncome"]},
             "timestamp":[1656547200,1688083200],
             "annualNetIncome":[
                {"asOfDate":"2022-06-30","periodType":"12M","reportedValue":{"raw":72738000000.0,"fmt":"72.74B"}},
                {"asOfDate":"2023-06-30","periodType":"12M","reportedValue":{"raw":72361000000.0,"fmt":"72.36B"}}
             ]},
            {"meta":{"symbol":["MSFT"],"type":["annualTotalAssets"]},
             "annualTotalAssets":[null,{"asOfDate":"2023-06-30","periodType":"12M","reportedValue":{"raw":411976000000.0}}]},
            {"meta":{"symbol":["MSFT"],"type":["annualEBITDA"]}}
        ],"error":null}}"#;

        let statements = parse_timeseries(body).expect("timeseries parses");

        assert_eq!(
            statements.income.value(line_items::NET_INCOME, 2022),
            Ok(Some(72_738_000_000.0))
        );
        assert_eq!(
            statements.balance_sheet.value(line_items::TOTAL_ASSETS, 2023),
            Ok(Some(411_976_000_000.0))
        );
        assert!(!statements.income.has_row(line_items::EBITDA));
        assert!(statements.cash_flow.is_empty());
    }

    #[test]
    fn quote_summary_reads_raw_wrappers_with_module_precedence() {
        let body = r#"{"quoteSummary":{"result":[{
            "defaultKeyStatistics":{"enterpriseToEbitda":{"raw":24.7,"fmt":"24.70"},"pegRatio":{},"trailingEps":{"raw":9.68}},
            "summaryDetail":{"marketCap":{"raw":2794000000000},"trailingEps":{"raw":1.0}},
            "price":{"marketCap":{"raw":1.0},"currency":"USD","maxAge":1}
        }],"error":null}}"#;

        let info = parse_quote_summary(body).expect("summary parses");

        assert_eq!(info.get(info_keys::ENTERPRISE_TO_EBITDA), Some(24.7));
        assert_eq!(info.get(info_keys::TRAILING_EPS), Some(9.68));
        assert_eq!(info.get(info_keys::MARKET_CAP), Some(2_794_000_000_000.0));
        assert!(!info.contains(info_keys::PEG_RATIO));
        assert_eq!(info.get("maxAge"), Some(1.0));
    }

    #[tokio::test]
    async fn refreshes_crumb_once_after_unauthorized_response() {
        let chart = r#"{"chart":{"result":[{"timestamp":[1672756200],"indicators":{"quote":[{"close":[239.58]}]}}],"error":null}}"#;
        let client = Arc::new(ScriptedHttpClient::with(vec![
            HttpResponse::ok("crumb-one"),
            HttpResponse::new(401, r#"{"finance":{"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#),
            HttpResponse::ok("crumb-two"),
            HttpResponse::ok(chart),
        ]));
        let adapter = YahooAdapter::with_http_client(config(), client.clone());
        let request = PriceHistoryRequest::for_years(
            symbol("MSFT"),
            YearRange::single(2023).expect("valid year"),
        )
        .expect("valid request");

        let series = adapter.price_history(request).await.expect("second attempt succeeds");

        assert_eq!(series.last_close(), Some(239.58));
        let urls = client.urls();
        assert_eq!(urls.len(), 4);
        assert!(urls[1].ends_with("crumb=crumb-one"));
        assert!(urls[3].ends_with("crumb=crumb-two"));
    }

    #[tokio::test]
    async fn second_rejection_surfaces_as_rate_limited() {
        let client = Arc::new(ScriptedHttpClient::with(vec![
            HttpResponse::ok("crumb-one"),
            HttpResponse::new(429, "Too Many Requests"),
            HttpResponse::ok("crumb-two"),
            HttpResponse::new(429, "Too Many Requests"),
        ]));
        let adapter = YahooAdapter::with_http_client(config(), client);

        let error = adapter
            .company_info(&symbol("TSLA"))
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert!(error.retryable());
    }

    #[test]
    fn rejects_html_as_crumb() {
        assert!(is_plausible_crumb("Xk3/9bq.aZ1"));
        assert!(!is_plausible_crumb("<!DOCTYPE html>"));
        assert!(!is_plausible_crumb(""));
    }
}
