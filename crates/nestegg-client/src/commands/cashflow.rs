use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};

use crate::ClientResult;
use crate::commands::common::load_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::CashflowData;
use crate::dates::{format_year_month, parse_year_month};
use crate::recurrence::expand_transactions;
use crate::reports::{monthly_cashflow, trailing_series};

#[derive(Debug, Default)]
pub struct CashflowOptions<'a> {
    /// `YYYY-MM`; the current month when absent.
    pub month: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn run(month: Option<&str>) -> ClientResult<SuccessEnvelope> {
    run_with_options(CashflowOptions {
        month: month.map(std::string::ToString::to_string),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: CashflowOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let month_start = match options.month.as_deref() {
        Some(value) => parse_year_month(value.trim(), "cashflow")?,
        None => current_month_start(),
    };

    let (_, _, state) = load_ledger(options.home_override)?;
    let expanded = expand_transactions(&state.transactions);
    let month = monthly_cashflow(&expanded, month_start);

    let data = CashflowData {
        currency: state.settings.currency.clone(),
        month: format_year_month(&month_start),
        income: month.income,
        expenses: month.expenses,
        result: month.result,
        expenses_by_category: month.expenses_by_category,
        entries: month.entries,
        trailing_months: trailing_series(&expanded, month_start),
    };

    success("cashflow", data)
}

fn current_month_start() -> NaiveDate {
    let today = Local::now().date_naive();
    today.with_day(1).unwrap_or(today)
}
