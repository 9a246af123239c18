mod chart;
mod compare;
mod metrics;
mod statements;

use std::time::Instant;

use serde_json::Value;
use tickerpair_core::{InMemoryProvider, MarketDataProvider, Symbol, YahooAdapter, YahooConfig, YearRange};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;
use crate::output::TextTable;

/// What a command hands back before it is wrapped in an [`Envelope`].
pub struct CommandResult {
    pub data: Value,
    pub table: Option<TextTable>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            table: None,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn failed(error: EnvelopeError) -> Self {
        Self {
            data: Value::Null,
            table: None,
            warnings: Vec::new(),
            errors: vec![error],
        }
    }

    pub fn with_table(mut self, table: TextTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    pub table: Option<TextTable>,
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let provider = build_provider(cli)?;
    let started = Instant::now();

    let result = match &cli.command {
        Command::Compare(args) => compare::run(args, provider.as_ref()).await?,
        Command::Metrics(args) => metrics::run(args, provider.as_ref()).await?,
        Command::Chart(args) => chart::run(args, provider.as_ref()).await?,
        Command::Statements(args) => statements::run(args, provider.as_ref()).await?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(provider = %provider.id(), latency_ms, "command finished");

    let CommandResult {
        data,
        table,
        warnings,
        errors,
    } = result;

    let mut meta = EnvelopeMeta::new(provider.id(), latency_ms);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(CommandOutput {
        envelope: Envelope { meta, data, errors },
        table,
    })
}

fn build_provider(cli: &Cli) -> Result<Box<dyn MarketDataProvider>, CliError> {
    if cli.mock {
        let (symbols, years) = mock_universe(&cli.command)?;
        return Ok(Box::new(InMemoryProvider::synthetic(&symbols, years)));
    }

    let mut config = YahooConfig::from_env();
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    let adapter = YahooAdapter::new(config).map_err(|error| CliError::Command(error.to_string()))?;
    Ok(Box::new(adapter))
}

/// Symbols and years the synthetic provider has to cover for `command`.
fn mock_universe(command: &Command) -> Result<(Vec<Symbol>, YearRange), CliError> {
    let (symbols, years) = match command {
        Command::Compare(args) => (
            vec![args.left.as_str(), args.right.as_str()],
            YearRange::new(args.years.start, args.years.end)?,
        ),
        Command::Chart(args) => (
            vec![args.left.as_str(), args.right.as_str()],
            YearRange::new(args.years.start, args.years.end)?,
        ),
        Command::Metrics(args) => (vec![args.symbol.as_str()], YearRange::single(args.year)?),
        Command::Statements(args) => (vec![args.symbol.as_str()], statements::mock_years()?),
    };

    let symbols = symbols
        .into_iter()
        .map(Symbol::parse)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((symbols, years))
}
