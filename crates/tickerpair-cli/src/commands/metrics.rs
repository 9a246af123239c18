use tickerpair_core::{MarketDataProvider, MetricsCalculator, MetricsError, Symbol};

use super::CommandResult;
use crate::cli::MetricsArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::output::{format_value, TextTable};

pub async fn run(
    args: &MetricsArgs,
    provider: &dyn MarketDataProvider,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    match MetricsCalculator::new(provider).compute(&symbol, args.year).await {
        Ok(metrics) => {
            let mut table = TextTable::new(vec![String::from("Metric"), args.year.to_string()])
                .with_title(symbol.to_string());
            for (name, value) in metrics.iter() {
                table.push_row(vec![name.label().to_owned(), format_value(value)]);
            }
            Ok(CommandResult::ok(serde_json::to_value(&metrics)?).with_table(table))
        }
        Err(error) => Ok(CommandResult::failed(envelope_error(&error))),
    }
}

fn envelope_error(error: &MetricsError) -> EnvelopeError {
    match error {
        MetricsError::Source { source, .. } => {
            EnvelopeError::new(source.code(), error.to_string()).with_retryable(source.retryable())
        }
        other => EnvelopeError::new(other.code(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerpair_core::{InMemoryProvider, YearRange};

    #[tokio::test]
    async fn computes_one_year_for_one_ticker() {
        let symbol = Symbol::parse("AAPL").expect("valid symbol");
        let provider =
            InMemoryProvider::synthetic(&[symbol], YearRange::single(2023).expect("valid year"));
        let args = MetricsArgs {
            symbol: String::from("aapl"),
            year: 2023,
        };

        let result = run(&args, &provider).await.expect("command succeeds");

        assert!(result.errors.is_empty());
        assert_eq!(result.data["symbol"], "AAPL");
        assert_eq!(result.data["year"], 2023);
        assert!(result.data["metrics"]["ROE"].is_number());
        assert!(result.data["metrics"]["PEG Ratio"].is_number());
    }

    #[tokio::test]
    async fn missing_prices_become_an_envelope_error() {
        let symbol = Symbol::parse("AAPL").expect("valid symbol");
        let provider =
            InMemoryProvider::synthetic(&[symbol], YearRange::single(2023).expect("valid year"));
        let args = MetricsArgs {
            symbol: String::from("AAPL"),
            year: 2010,
        };

        let result = run(&args, &provider).await.expect("command succeeds");

        assert_eq!(result.errors[0].code, "metrics.no_price_data");
        assert!(result.data.is_null());
    }

    #[tokio::test]
    async fn provider_failures_keep_their_source_code() {
        let provider = InMemoryProvider::new();
        let args = MetricsArgs {
            symbol: String::from("NOPE"),
            year: 2023,
        };

        let result = run(&args, &provider).await.expect("command succeeds");

        assert_eq!(result.errors[0].code, "source.not_found");
        assert_eq!(result.errors[0].retryable, Some(false));
    }
}
