//! Plain text tables for presenting API responses in a terminal.

use chrono::{DateTime, Utc};

use crate::ledger::http::reps;

/// Number of minor units assumed when displaying amounts.
const DISPLAY_MINOR_UNITS: u8 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

/// A table of text cells with a header row.
#[derive(Clone, Debug)]
pub struct Table {
    columns: Vec<(String, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[(&str, Align)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, align)| ((*name).to_owned(), *align))
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing cells are rendered empty and extra cells are
    /// dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, (name, _))| {
                self.rows
                    .iter()
                    .map(|row| row[index].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn render_line(&self, cells: &[String], widths: &[usize]) -> String {
        let line = cells
            .iter()
            .zip(widths)
            .zip(&self.columns)
            .map(|((cell, width), (_, align))| match align {
                Align::Left => format!("{:<width$}", cell, width = width),
                Align::Right => format!("{:>width$}", cell, width = width),
            })
            .collect::<Vec<_>>()
            .join("  ");

        line.trim_end().to_owned()
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let headers = self
            .columns
            .iter()
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();
        let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();

        let mut lines = vec![
            self.render_line(&headers, &widths),
            self.render_line(&rule, &widths),
        ];
        lines.extend(self.rows.iter().map(|row| self.render_line(row, &widths)));

        let mut rendered = lines.join("\n");
        rendered.push('\n');

        rendered
    }

    /// Render the table, or `empty` on its own line if there are no rows.
    pub fn render_or(&self, empty: &str) -> String {
        if self.is_empty() {
            format!("{}\n", empty)
        } else {
            self.render()
        }
    }
}

/// Format an integer amount of minor units as a decimal string.
///
/// # Arguments
///
/// * `value` - The amount in minor units.
/// * `minor_units` - The number of decimal places the currency uses.
pub fn format_amount(value: i64, minor_units: u8) -> String {
    let sign = if value.is_negative() { "-" } else { "" };
    let amount_str = value.unsigned_abs().to_string();

    if minor_units == 0 {
        return format!("{}{}", sign, amount_str);
    }

    // Pad so there is always a digit before the decimal point.
    let padded = format!(
        "{:0>width$}",
        amount_str,
        width = usize::from(minor_units) + 1
    );
    let decimal_location = padded.len() - usize::from(minor_units);

    format!(
        "{}{}.{}",
        sign,
        &padded[..decimal_location],
        &padded[decimal_location..]
    )
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

fn format_optional_date(date: Option<DateTime<Utc>>) -> String {
    date.map(format_date).unwrap_or_else(|| "-".to_owned())
}

fn account_status(account: &reps::Account) -> &'static str {
    if account.deleted_at.is_some() {
        "deleted"
    } else if account.closed.is_some() {
        "closed"
    } else {
        "open"
    }
}

pub fn accounts_table(accounts: &[reps::Account]) -> Table {
    let mut table = Table::new(&[
        ("ID", Align::Right),
        ("Name", Align::Left),
        ("Currency", Align::Left),
        ("Opened", Align::Left),
        ("Closed", Align::Left),
        ("Status", Align::Left),
    ]);

    for account in accounts {
        table.push_row(vec![
            account.id.to_string(),
            account.name.clone(),
            account.currency.clone(),
            format_date(account.opened),
            format_optional_date(account.closed),
            account_status(account).to_owned(),
        ]);
    }

    table
}

pub fn balances_table(balances: &reps::AccountBalances) -> Table {
    let mut table = Table::new(&[
        ("ID", Align::Right),
        ("Date", Align::Left),
        ("Amount", Align::Right),
        ("Currency", Align::Left),
    ]);

    for balance in &balances.balances {
        table.push_row(vec![
            balance.id.to_string(),
            format_date(balance.date),
            format_amount(balance.amount, DISPLAY_MINOR_UNITS),
            balances.account.currency.clone(),
        ]);
    }

    table
}

pub fn report_table(report: &reps::BalanceReport) -> Table {
    let mut table = Table::new(&[
        ("ID", Align::Right),
        ("Account", Align::Left),
        ("As of", Align::Left),
        ("Amount", Align::Right),
        ("Currency", Align::Left),
    ]);

    for row in &report.items {
        table.push_row(vec![
            row.account.id.to_string(),
            row.account.name.clone(),
            format_date(row.balance.date),
            format_amount(row.balance.amount, DISPLAY_MINOR_UNITS),
            row.account.currency.clone(),
        ]);
    }

    table
}
