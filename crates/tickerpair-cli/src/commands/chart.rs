use serde_json::{json, Value};
use tickerpair_core::{price_chart, MarketDataProvider, PriceChart, SeriesSummary, Symbol, YearRange};

use super::CommandResult;
use crate::cli::ChartArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::output::{format_value, TextTable};

pub async fn run(
    args: &ChartArgs,
    provider: &dyn MarketDataProvider,
) -> Result<CommandResult, CliError> {
    let left = Symbol::parse(&args.left)?;
    let right = Symbol::parse(&args.right)?;
    let years = YearRange::new(args.years.start, args.years.end)?;

    let chart = match price_chart(provider, &left, &right, years).await {
        Ok(chart) => chart,
        Err(error) => return Ok(CommandResult::failed(EnvelopeError::from(&error))),
    };

    let summaries = chart.summaries();
    let warnings = empty_series_warnings(&summaries);
    let table = summary_table(&chart, &summaries);

    let mut data = summary_data(&chart, &summaries);
    data["series"] = if args.summary_only {
        Value::Null
    } else {
        serde_json::to_value(&chart.series)?
    };

    Ok(CommandResult::ok(data)
        .with_table(table)
        .with_warnings(warnings))
}

/// Title, axis labels and per-series summaries, without the observations.
pub(super) fn summary_data(chart: &PriceChart, summaries: &[SeriesSummary]) -> Value {
    json!({
        "title": chart.title,
        "x_label": chart.x_label,
        "y_label": chart.y_label,
        "summaries": summaries,
    })
}

pub(super) fn empty_series_warnings(summaries: &[SeriesSummary]) -> Vec<String> {
    summaries
        .iter()
        .filter(|summary| summary.observations == 0)
        .map(|summary| format!("no prices to plot for {}", summary.label))
        .collect()
}

fn summary_table(chart: &PriceChart, summaries: &[SeriesSummary]) -> TextTable {
    let mut table = TextTable::new(
        ["Series", "Points", "First", "Last", "Min", "Max"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
    .with_title(chart.title.clone());
    for summary in summaries {
        table.push_row(vec![
            summary.label.clone(),
            summary.observations.to_string(),
            format_value(summary.first),
            format_value(summary.last),
            format_value(summary.min),
            format_value(summary.max),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::YearRangeArgs;
    use tickerpair_core::InMemoryProvider;

    fn args(summary_only: bool) -> ChartArgs {
        ChartArgs {
            left: String::from("TSLA"),
            right: String::from("MSFT"),
            years: YearRangeArgs {
                start: 2022,
                end: 2023,
            },
            summary_only,
        }
    }

    fn provider() -> InMemoryProvider {
        let symbols = [
            Symbol::parse("TSLA").expect("valid symbol"),
            Symbol::parse("MSFT").expect("valid symbol"),
        ];
        InMemoryProvider::synthetic(&symbols, YearRange::new(2022, 2023).expect("valid range"))
    }

    #[tokio::test]
    async fn emits_both_series_with_axis_labels() {
        let result = run(&args(false), &provider()).await.expect("command succeeds");

        assert_eq!(result.data["title"], "Stock Prices: TSLA vs MSFT (2022-2023)");
        assert_eq!(result.data["x_label"], "Date");
        assert_eq!(result.data["y_label"], "Stock Price");
        assert_eq!(result.data["series"].as_array().map(Vec::len), Some(2));
        assert_eq!(result.data["series"][1]["label"], "MSFT");
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn summary_only_drops_the_observations() {
        let result = run(&args(true), &provider()).await.expect("command succeeds");

        assert!(result.data["series"].is_null());
        assert_eq!(result.data["summaries"][0]["label"], "TSLA");
        let rendered = result.table.expect("table").render();
        assert!(rendered.starts_with("Stock Prices: TSLA vs MSFT (2022-2023)\nSeries"));
    }
}
