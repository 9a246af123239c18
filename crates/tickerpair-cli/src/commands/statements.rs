use serde_json::{Map, Value};
use tickerpair_core::{
    FinancialStatement, MarketDataProvider, Symbol, ValidationError, YearRange,
};
use tracing::debug;

use super::CommandResult;
use crate::cli::StatementsArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::output::{format_value, TextTable};

/// Fiscal years the synthetic provider publishes for `statements --mock`.
pub fn mock_years() -> Result<YearRange, ValidationError> {
    YearRange::new(2021, 2024)
}

pub async fn run(
    args: &StatementsArgs,
    provider: &dyn MarketDataProvider,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    let statements = match provider.statements(&symbol).await {
        Ok(statements) => statements,
        Err(error) => return Ok(CommandResult::failed(EnvelopeError::from(&error))),
    };
    let statement = statements.get(args.kind);
    debug!(symbol = %symbol, kind = %args.kind, rows = statement.row_labels().count(), "loaded statement");

    let warnings = if statement.is_empty() {
        vec![format!("{symbol} published no {}", args.kind)]
    } else {
        Vec::new()
    };

    let data = Value::Object(
        [
            (String::from("symbol"), Value::String(symbol.to_string())),
            (String::from("statement"), serde_json::to_value(args.kind)?),
            (String::from("columns"), serde_json::to_value(column_labels(statement))?),
            (String::from("rows"), Value::Object(rows_json(statement))),
        ]
        .into_iter()
        .collect(),
    );

    Ok(CommandResult::ok(data)
        .with_table(statement_table(&symbol, statement))
        .with_warnings(warnings))
}

fn column_labels(statement: &FinancialStatement) -> Vec<String> {
    statement.columns().map(|date| date.to_string()).collect()
}

fn rows_json(statement: &FinancialStatement) -> Map<String, Value> {
    statement
        .row_labels()
        .filter_map(|row| {
            let values = statement.row_values(row)?;
            let values = values
                .into_iter()
                .map(|(_, value)| value.map_or(Value::Null, Value::from))
                .collect();
            Some((row.to_owned(), Value::Array(values)))
        })
        .collect()
}

/// Line items down, period-end dates across, newest first.
fn statement_table(symbol: &Symbol, statement: &FinancialStatement) -> TextTable {
    let mut headers = vec![String::from("Line Item")];
    headers.extend(column_labels(statement));

    let mut table = TextTable::new(headers).with_title(format!("{symbol} {}", statement.kind()));
    for row in statement.row_labels() {
        let mut line = vec![row.to_owned()];
        if let Some(values) = statement.row_values(row) {
            line.extend(values.into_iter().map(|(_, value)| format_value(value)));
        }
        table.push_row(line);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerpair_core::{InMemoryProvider, StatementKind};

    #[tokio::test]
    async fn dumps_columns_newest_first() {
        let symbol = Symbol::parse("MSFT").expect("valid symbol");
        let provider = InMemoryProvider::synthetic(&[symbol], mock_years().expect("valid range"));
        let args = StatementsArgs {
            symbol: String::from("msft"),
            kind: StatementKind::BalanceSheet,
        };

        let result = run(&args, &provider).await.expect("command succeeds");

        assert_eq!(result.data["symbol"], "MSFT");
        assert_eq!(result.data["statement"], "balance_sheet");
        assert_eq!(result.data["columns"][0], "2024-12-31");
        assert_eq!(result.data["columns"].as_array().map(Vec::len), Some(5));
        assert!(result.data["rows"]["Total Assets"][0].is_number());
        let rendered = result.table.expect("table").render();
        assert!(rendered.starts_with("MSFT balance sheet\nLine Item"));
    }

    #[tokio::test]
    async fn unknown_ticker_is_an_envelope_error() {
        let args = StatementsArgs {
            symbol: String::from("NOPE"),
            kind: StatementKind::Income,
        };

        let result = run(&args, &InMemoryProvider::new()).await.expect("command succeeds");

        assert_eq!(result.errors[0].code, "source.not_found");
    }
}
