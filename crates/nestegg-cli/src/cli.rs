use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, String> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "date must use valid calendar values".to_string())
}

pub fn parse_year_month(value: &str) -> Result<String, String> {
    let bytes = value.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err("month must use YYYY-MM format".to_string());
    }
    let first_of_month = format!("{value}-01");
    if NaiveDate::parse_from_str(&first_of_month, "%Y-%m-%d").is_err() {
        return Err("month must use valid calendar values".to_string());
    }
    Ok(value.to_string())
}

pub fn parse_tax_rate(value: &str) -> Result<f64, String> {
    let parsed = value
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| "tax rate must be a number between 0 and 100".to_string())?;
    if !(0.0..=100.0).contains(&parsed) {
        return Err("tax rate must be a number between 0 and 100".to_string());
    }
    Ok(parsed)
}

/// Extended help shown after `nestegg import --help`.
pub const IMPORT_AFTER_HELP: &str = "\
How import works:
  Point nestegg at whatever your bank, broker or spreadsheet exported.
  Each row is classified as a holding, a debt, a cash movement or a trade,
  and merged into your local ledger.

  Accepted files:
    .csv / .tsv / .txt   any delimiter (`,` `;` tab `|`), several tables per file
    .xlsx / .xls / .ods  every sheet is read
    .pdf                 text is extracted line by line

  Numbers may use either decimal convention (`1.234,56` or `1,234.56`),
  currency symbols and parentheses for negatives.

What happens to each row:
  holding    merged by name and class; the latest value wins
  debt       merged by name and class; the latest value wins
  movement   skipped when the same date, amount, kind and notes already exist
  trade      folded into one position per ticker and currency

Re-importing the same file is safe: nothing is added twice.

What to do next:
  1. Run `nestegg import <path>` and read the counts it reports.
  2. Run `nestegg summary` to see your net worth and passive income.
  3. Run `nestegg cashflow` to see this month's income and expenses.
";

#[derive(Debug, Parser)]
#[command(
    name = "nestegg",
    version,
    about = "local net worth and cash flow ledger",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import holdings, debts, movements or trades from an exported file
    #[command(after_long_help = IMPORT_AFTER_HELP)]
    Import {
        /// Path to a CSV, spreadsheet or PDF export
        path: String,
        /// Date used for movements without one (YYYY-MM-DD, defaults to today)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show net worth, totals by class and passive income
    Summary {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show income and expenses for one month, recurring entries included
    Cashflow {
        /// Month to report (YYYY-MM, defaults to the current month)
        #[arg(long, value_parser = parse_year_month)]
        month: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Record net worth and passive income for one month, or clear the history
    Snapshot {
        /// Month to record (YYYY-MM, defaults to the current month)
        #[arg(long, value_parser = parse_year_month, conflicts_with = "clear")]
        month: Option<String>,
        /// Delete every recorded snapshot
        #[arg(long)]
        clear: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Print the whole ledger as CSV or as a JSON backup
    Export {
        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,
    },
    /// Replace the ledger with a JSON backup produced by `nestegg export --format json`
    Restore {
        /// Path to the JSON backup
        path: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show or change the base currency and the passive income tax rate
    Settings {
        /// Three-letter currency code (e.g. EUR)
        #[arg(long)]
        currency: Option<String>,
        /// Tax rate applied to passive income, in percent
        #[arg(long, value_parser = parse_tax_rate)]
        tax_rate: Option<f64>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
