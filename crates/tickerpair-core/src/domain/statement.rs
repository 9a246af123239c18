use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

use crate::arithmetic::{to_scalar, CellValue};

/// Row labels as published in provider statements.
pub mod line_items {
    pub const TOTAL_REVENUE: &str = "Total Revenue";
    pub const COST_OF_REVENUE: &str = "Cost Of Revenue";
    pub const GROSS_PROFIT: &str = "Gross Profit";
    pub const OPERATING_INCOME: &str = "Operating Income";
    pub const NET_INCOME: &str = "Net Income";
    pub const EBITDA: &str = "EBITDA";
    pub const DILUTED_EPS: &str = "Diluted EPS";

    pub const TOTAL_ASSETS: &str = "Total Assets";
    pub const TOTAL_LIABILITIES: &str = "Total Liabilities Net Minority Interest";
    pub const TOTAL_EQUITY: &str = "Total Equity Gross Minority Interest";
    pub const STOCKHOLDERS_EQUITY: &str = "Stockholders Equity";
    pub const TOTAL_DEBT: &str = "Total Debt";
    pub const CASH_AND_EQUIVALENTS: &str = "Cash And Cash Equivalents";

    pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
    pub const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";
    pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
}

/// The three statement variants a provider publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [Self; 3] = [Self::Income, Self::BalanceSheet, Self::CashFlow];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income statement",
            Self::BalanceSheet => "balance sheet",
            Self::CashFlow => "cash flow statement",
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "financials" => Ok(Self::Income),
            "balance" | "balance-sheet" | "balance_sheet" => Ok(Self::BalanceSheet),
            "cashflow" | "cash-flow" | "cash_flow" => Ok(Self::CashFlow),
            other => Err(format!(
                "unknown statement '{other}', expected income, balance or cashflow"
            )),
        }
    }
}

/// A statement lookup that cannot be answered from the table's structure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("'{row}' is not a row of the {statement}")]
    MissingRow {
        statement: StatementKind,
        row: String,
    },
}

/// Read-only table of line items by period-end date.
///
/// The fiscal-year label of a column is the year of its period-end date.
/// A row may be blank for some columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialStatement {
    kind: StatementKind,
    columns: BTreeSet<Date>,
    rows: BTreeMap<String, BTreeMap<Date, Option<f64>>>,
}

impl FinancialStatement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: BTreeSet::new(),
            rows: BTreeMap::new(),
        }
    }

    /// Record one cell. Adds the row and the column when they are new.
    pub fn insert(&mut self, row: impl Into<String>, period_end: Date, value: Option<f64>) {
        self.columns.insert(period_end);
        self.rows
            .entry(row.into())
            .or_default()
            .insert(period_end, value.filter(|v| v.is_finite()));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, row: impl Into<String>, period_end: Date, value: Option<f64>) -> Self {
        self.insert(row, period_end, value);
        self
    }

    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Period-end dates, newest first.
    pub fn columns(&self) -> impl Iterator<Item = Date> + '_ {
        self.columns.iter().rev().copied()
    }

    /// Distinct fiscal-year labels, newest first.
    pub fn year_labels(&self) -> Vec<String> {
        let years = self
            .columns
            .iter()
            .map(|date| date.year())
            .collect::<BTreeSet<_>>();
        years.into_iter().rev().map(|year| year.to_string()).collect()
    }

    pub fn row_labels(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Every column of `row`, newest first, blanks included.
    pub fn row_values(&self, row: &str) -> Option<Vec<(Date, Option<f64>)>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns()
                .map(|date| (date, values.get(&date).copied().flatten()))
                .collect(),
        )
    }

    pub fn has_row(&self, row: &str) -> bool {
        self.rows.contains_key(row)
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.columns.iter().any(|date| date.year() == year)
    }

    /// Values of `row` under the fiscal-year label `year`.
    ///
    /// `Ok(None)` when no column carries that label or every matching cell is
    /// blank. A label shared by several columns yields a series.
    pub fn cell(&self, row: &str, year: i32) -> Result<Option<CellValue>, StatementError> {
        let values = self.rows.get(row).ok_or_else(|| StatementError::MissingRow {
            statement: self.kind,
            row: row.to_owned(),
        })?;

        let matching = self
            .columns
            .iter()
            .rev()
            .filter(|date| date.year() == year)
            .collect::<Vec<_>>();

        let present = matching
            .iter()
            .filter_map(|date| values.get(*date).copied().flatten())
            .collect::<Vec<_>>();

        Ok(match present.len() {
            0 => None,
            1 if matching.len() == 1 => Some(CellValue::Scalar(present[0])),
            _ => Some(CellValue::Series(present)),
        })
    }

    /// [`cell`](Self::cell) collapsed with [`to_scalar`].
    pub fn value(&self, row: &str, year: i32) -> Result<Option<f64>, StatementError> {
        Ok(self.cell(row, year)?.map(to_scalar))
    }
}

/// Income statement, balance sheet and cash flow statement of one company.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSet {
    pub income: FinancialStatement,
    pub balance_sheet: FinancialStatement,
    pub cash_flow: FinancialStatement,
}

impl Default for StatementSet {
    fn default() -> Self {
        Self {
            income: FinancialStatement::new(StatementKind::Income),
            balance_sheet: FinancialStatement::new(StatementKind::BalanceSheet),
            cash_flow: FinancialStatement::new(StatementKind::CashFlow),
        }
    }
}

impl StatementSet {
    pub fn get(&self, kind: StatementKind) -> &FinancialStatement {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    pub fn get_mut(&mut self, kind: StatementKind) -> &mut FinancialStatement {
        match kind {
            StatementKind::Income => &mut self.income,
            StatementKind::BalanceSheet => &mut self.balance_sheet,
            StatementKind::CashFlow => &mut self.cash_flow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn income() -> FinancialStatement {
        FinancialStatement::new(StatementKind::Income)
            .with(line_items::NET_INCOME, date!(2023 - 12 - 31), Some(15.0e9))
            .with(line_items::NET_INCOME, date!(2022 - 12 - 31), Some(12.6e9))
            .with(line_items::TOTAL_REVENUE, date!(2023 - 12 - 31), Some(96.8e9))
            .with(line_items::TOTAL_REVENUE, date!(2022 - 12 - 31), None)
    }

    #[test]
    fn looks_up_cells_by_fiscal_year_label() {
        let statement = income();
        assert_eq!(
            statement.cell(line_items::NET_INCOME, 2023),
            Ok(Some(CellValue::Scalar(15.0e9)))
        );
        assert_eq!(statement.value(line_items::NET_INCOME, 2022), Ok(Some(12.6e9)));
        assert_eq!(statement.year_labels(), vec!["2023", "2022"]);
    }

    #[test]
    fn absent_year_and_blank_cells_are_unavailable() {
        let statement = income();
        assert_eq!(statement.value(line_items::NET_INCOME, 2019), Ok(None));
        assert_eq!(statement.value(line_items::TOTAL_REVENUE, 2022), Ok(None));
        assert!(!statement.has_year(2019));
    }

    #[test]
    fn absent_row_is_a_structural_error() {
        let statement = income();
        assert_eq!(
            statement.value(line_items::EBITDA, 2023),
            Err(StatementError::MissingRow {
                statement: StatementKind::Income,
                row: String::from("EBITDA"),
            })
        );
    }

    #[test]
    fn shared_year_label_yields_a_series_that_sums() {
        let statement = FinancialStatement::new(StatementKind::Income)
            .with(line_items::EBITDA, date!(2021 - 01 - 31), Some(4.0))
            .with(line_items::EBITDA, date!(2021 - 12 - 31), Some(6.0));

        assert_eq!(
            statement.cell(line_items::EBITDA, 2021),
            Ok(Some(CellValue::Series(vec![6.0, 4.0])))
        );
        assert_eq!(statement.value(line_items::EBITDA, 2021), Ok(Some(10.0)));
    }

    #[test]
    fn non_finite_inputs_are_stored_blank() {
        let statement = FinancialStatement::new(StatementKind::CashFlow).with(
            line_items::FREE_CASH_FLOW,
            date!(2023 - 06 - 30),
            Some(f64::NAN),
        );
        assert_eq!(statement.value(line_items::FREE_CASH_FLOW, 2023), Ok(None));
    }

    #[test]
    fn parses_statement_kind_aliases() {
        assert_eq!("balance".parse(), Ok(StatementKind::BalanceSheet));
        assert_eq!("Cash-Flow".parse(), Ok(StatementKind::CashFlow));
        assert!("ratios".parse::<StatementKind>().is_err());
    }
}
