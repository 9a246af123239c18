//! CLI argument definitions for tickerpair.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `compare` | Year-by-year metrics of two tickers |
//! | `metrics` | Metrics of one ticker for one year |
//! | `chart` | Closing prices of two tickers over a year range |
//! | `statements` | Dump one annual financial statement |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//! | `--mock` | `false` | Use deterministic offline data |
//! | `-v` | off | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! tickerpair compare TSLA MSFT --start 2021 --end 2023 --format table
//! tickerpair metrics AAPL --year 2023 --pretty
//! tickerpair chart TSLA MSFT --start 2021 --end 2023
//! tickerpair statements MSFT --kind balance --format table
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickerpair_core::StatementKind;

/// Compare the annual fundamentals of two stock tickers.
#[derive(Debug, Parser)]
#[command(
    name = "tickerpair",
    author,
    version,
    about = "Compare annual fundamentals of two stock tickers",
    long_about = "tickerpair fetches prices, financial statements and company statistics \
for two tickers, derives ten valuation and profitability ratios per calendar year, and \
prints them side by side.\n\
\n\
Use 'tickerpair <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: Single JSON object (default)
    /// - ndjson: One JSON object per line
    /// - table: Text table format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Per-request timeout in milliseconds. Overrides TICKERPAIR_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Serve deterministic synthetic data instead of calling Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text table format for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare two tickers year by year.
    ///
    /// Years where either ticker lacks prices or statement rows are skipped
    /// and reported as warnings.
    ///
    /// # Examples
    ///
    ///   tickerpair compare
    ///   tickerpair compare AAPL MSFT --start 2020 --end 2023 --format table
    ///   tickerpair compare TSLA MSFT --with-chart
    Compare(CompareArgs),

    /// Ratios of one ticker for one year.
    ///
    /// # Examples
    ///
    ///   tickerpair metrics NVDA --year 2023
    Metrics(MetricsArgs),

    /// Closing-price series of two tickers over a year range.
    ///
    /// # Examples
    ///
    ///   tickerpair chart TSLA MSFT --start 2021 --end 2023
    Chart(ChartArgs),

    /// Print one annual financial statement of a ticker.
    ///
    /// # Examples
    ///
    ///   tickerpair statements MSFT
    ///   tickerpair statements MSFT --kind cashflow --format table
    Statements(StatementsArgs),
}

/// Inclusive calendar-year range shared by `compare` and `chart`.
#[derive(Debug, Clone, Copy, Args)]
pub struct YearRangeArgs {
    /// First year of the range.
    #[arg(long, default_value_t = 2021, value_parser = year_parser())]
    pub start: i32,

    /// Last year of the range (inclusive).
    #[arg(long, default_value_t = 2023, value_parser = year_parser())]
    pub end: i32,
}

/// Arguments for the `compare` command.
#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First ticker.
    #[arg(default_value = "TSLA")]
    pub left: String,

    /// Second ticker.
    #[arg(default_value = "MSFT")]
    pub right: String,

    #[command(flatten)]
    pub years: YearRangeArgs,

    /// Also load both price series and report their chart summaries.
    #[arg(long, default_value_t = false)]
    pub with_chart: bool,
}

/// Arguments for the `metrics` command.
#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// Ticker symbol.
    pub symbol: String,

    /// Calendar year to compute.
    #[arg(long, value_parser = year_parser())]
    pub year: i32,
}

/// Arguments for the `chart` command.
#[derive(Debug, Args)]
pub struct ChartArgs {
    /// First ticker.
    #[arg(default_value = "TSLA")]
    pub left: String,

    /// Second ticker.
    #[arg(default_value = "MSFT")]
    pub right: String,

    #[command(flatten)]
    pub years: YearRangeArgs,

    /// Leave the per-day observations out of the output.
    #[arg(long, default_value_t = false)]
    pub summary_only: bool,
}

/// Arguments for the `statements` command.
#[derive(Debug, Args)]
pub struct StatementsArgs {
    /// Ticker symbol.
    pub symbol: String,

    /// Statement to print: income, balance or cashflow.
    #[arg(long, default_value = "income", value_parser = parse_statement_kind)]
    pub kind: StatementKind,
}

fn year_parser() -> clap::builder::RangedI64ValueParser<i32> {
    let (min, max) = (tickerpair_core::MIN_YEAR, tickerpair_core::MAX_YEAR);
    clap::value_parser!(i32).range(i64::from(min)..=i64::from(max))
}

fn parse_statement_kind(value: &str) -> Result<StatementKind, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_defaults_match_the_classic_pair() {
        let cli = Cli::try_parse_from(["tickerpair", "compare"]).expect("parses");
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!((args.left.as_str(), args.right.as_str()), ("TSLA", "MSFT"));
        assert_eq!((args.years.start, args.years.end), (2021, 2023));
        assert!(!args.with_chart);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn compare_chart_is_opt_in() {
        let cli = Cli::try_parse_from(["tickerpair", "compare", "AAPL", "MSFT", "--with-chart"])
            .expect("parses");
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert!(args.with_chart);
    }

    #[test]
    fn rejects_years_outside_supported_range() {
        assert!(Cli::try_parse_from(["tickerpair", "metrics", "MSFT", "--year", "1899"]).is_err());
        assert!(Cli::try_parse_from(["tickerpair", "compare", "--end", "2101"]).is_err());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "tickerpair",
            "statements",
            "msft",
            "--kind",
            "cashflow",
            "--format",
            "table",
            "--mock",
            "-vv",
        ])
        .expect("parses");

        assert!(cli.mock);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Table);
        let Command::Statements(args) = cli.command else {
            panic!("expected statements");
        };
        assert_eq!(args.kind, StatementKind::CashFlow);
    }
}
