use serde_json::{json, Value};
use tickerpair_core::{
    price_chart, ComparisonError, ComparisonReport, ComparisonRequest, MarketDataProvider,
    MetricName, RangeComparator, SkippedYear,
};
use tracing::{info, warn};

use super::{chart, CommandResult};
use crate::cli::CompareArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::output::{format_value, TextTable};

pub async fn run(
    args: &CompareArgs,
    provider: &dyn MarketDataProvider,
) -> Result<CommandResult, CliError> {
    let request =
        ComparisonRequest::parse(&args.left, &args.right, args.years.start, args.years.end)?;
    info!(
        left = %request.left,
        right = %request.right,
        start = request.years.start(),
        end = request.years.end(),
        "running comparison"
    );

    match RangeComparator::new(provider).compare(&request).await {
        Ok(report) => {
            let table = comparison_table(&report);
            let mut warnings = report.warnings();
            let mut data = json!({
                "left": request.left,
                "right": request.right,
                "start_year": request.years.start(),
                "end_year": request.years.end(),
                "columns": report.table.columns(),
                "rows": report.table.rows,
                "skipped": report.skipped,
            });
            if args.with_chart {
                data["chart"] = chart_summary(provider, &request, &mut warnings).await;
            }
            Ok(CommandResult::ok(data)
                .with_table(table)
                .with_warnings(warnings))
        }
        Err(error) => {
            let ComparisonError::EmptyResult { skipped, .. } = &error;
            let warnings = skipped.iter().map(SkippedYear::warning).collect();
            Ok(CommandResult::failed(EnvelopeError::new(
                "comparison.empty_result",
                error.to_string(),
            ))
            .with_warnings(warnings))
        }
    }
}

/// Chart summaries for the compared pair. A failed price load leaves the
/// comparison intact and becomes a warning.
async fn chart_summary(
    provider: &dyn MarketDataProvider,
    request: &ComparisonRequest,
    warnings: &mut Vec<String>,
) -> Value {
    match price_chart(provider, &request.left, &request.right, request.years).await {
        Ok(loaded) => {
            let summaries = loaded.summaries();
            warnings.extend(chart::empty_series_warnings(&summaries));
            chart::summary_data(&loaded, &summaries)
        }
        Err(error) => {
            warn!(code = error.code(), "chart unavailable: {error}");
            warnings.push(format!("chart unavailable: {error}"));
            Value::Null
        }
    }
}

/// One line per prefixed metric, one column per compared year.
fn comparison_table(report: &ComparisonReport) -> TextTable {
    let table = &report.table;
    let mut headers = vec![String::from("Metric")];
    headers.extend(table.years().iter().map(i32::to_string));

    let mut text = TextTable::new(headers)
        .with_title(format!("{} vs {}", table.left, table.right));
    for symbol in table.symbols() {
        for name in MetricName::ALL {
            let mut line = vec![symbol.prefixed(name.label())];
            line.extend(
                table
                    .rows
                    .iter()
                    .map(|row| format_value(row.get(symbol, name))),
            );
            text.push_row(line);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::YearRangeArgs;
    use tickerpair_core::{InMemoryProvider, Symbol, YearRange};

    fn args(left: &str, right: &str, start: i32, end: i32) -> CompareArgs {
        CompareArgs {
            left: left.to_owned(),
            right: right.to_owned(),
            years: YearRangeArgs { start, end },
            with_chart: false,
        }
    }

    fn provider(symbols: &[&str], start: i32, end: i32) -> InMemoryProvider {
        let symbols = symbols
            .iter()
            .map(|symbol| Symbol::parse(symbol).expect("valid symbol"))
            .collect::<Vec<_>>();
        InMemoryProvider::synthetic(&symbols, YearRange::new(start, end).expect("valid range"))
    }

    #[tokio::test]
    async fn table_has_one_line_per_prefixed_metric() {
        let provider = provider(&["TSLA", "MSFT"], 2021, 2023);

        let result = run(&args("tsla", "msft", 2021, 2023), &provider)
            .await
            .expect("command succeeds");

        assert!(result.errors.is_empty());
        assert_eq!(result.data["rows"].as_array().map(Vec::len), Some(3));
        assert_eq!(result.data["columns"][0], "Year");
        assert!(result.data.get("chart").is_none());
        let rendered = result.table.expect("table").render();
        assert!(rendered.starts_with("TSLA vs MSFT\nMetric"));
        assert!(rendered.contains("TSLA_P/E Ratio"));
        assert!(rendered.contains("MSFT_PEG Ratio"));
        assert_eq!(rendered.lines().count(), 3 + 20);
    }

    #[tokio::test]
    async fn unknown_ticker_reports_an_empty_result() {
        let provider = provider(&["TSLA"], 2022, 2022);

        let result = run(&args("TSLA", "ZZZZ", 2022, 2022), &provider)
            .await
            .expect("command succeeds");

        assert!(result.data.is_null());
        assert_eq!(result.errors[0].code, "comparison.empty_result");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("skipped 2022: ZZZZ 2022"));
    }

    #[tokio::test]
    async fn empty_result_warnings_match_the_report_text() {
        let provider = provider(&["TSLA"], 2022, 2022);
        let request = ComparisonRequest::parse("TSLA", "ZZZZ", 2022, 2022).expect("request");
        let Err(ComparisonError::EmptyResult { skipped, .. }) =
            RangeComparator::new(&provider).compare(&request).await
        else {
            panic!("expected an empty result");
        };

        let result = run(&args("TSLA", "ZZZZ", 2022, 2022), &provider)
            .await
            .expect("command succeeds");

        let expected = skipped.iter().map(SkippedYear::warning).collect::<Vec<_>>();
        assert_eq!(result.warnings, expected);
    }

    #[tokio::test]
    async fn identical_tickers_compare_with_a_warning() {
        let provider = provider(&["TSLA"], 2021, 2023);

        let result = run(&args("TSLA", "tsla", 2021, 2023), &provider)
            .await
            .expect("command succeeds");

        assert!(result.errors.is_empty());
        assert_eq!(result.data["columns"].as_array().map(Vec::len), Some(11));
        assert_eq!(
            result.warnings,
            vec![String::from("TSLA is compared with itself; one set of columns is reported")]
        );
        let rendered = result.table.expect("table").render();
        assert_eq!(rendered.lines().count(), 3 + 10);
    }

    #[tokio::test]
    async fn with_chart_adds_price_summaries() {
        let provider = provider(&["TSLA", "MSFT"], 2022, 2023);
        let mut args = args("TSLA", "MSFT", 2022, 2023);
        args.with_chart = true;

        let result = run(&args, &provider).await.expect("command succeeds");

        assert!(result.errors.is_empty());
        let chart = &result.data["chart"];
        assert_eq!(chart["title"], "Stock Prices: TSLA vs MSFT (2022-2023)");
        assert_eq!(chart["summaries"].as_array().map(Vec::len), Some(2));
        assert_eq!(chart["summaries"][1]["label"], "MSFT");
        assert!(chart.get("series").is_none());
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn invalid_arguments_are_validation_errors() {
        let provider = provider(&["TSLA", "MSFT"], 2021, 2023);

        let error = run(&args("TSLA", "MSFT", 2023, 2021), &provider)
            .await
            .err()
            .expect("inverted range rejected");

        assert_eq!(error.exit_code(), 2);
    }
}
