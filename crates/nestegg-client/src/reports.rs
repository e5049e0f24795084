use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::contracts::types::{CashflowEntry, CashflowMonth, CategoryTotal, ClassTotal};
use crate::dates::{add_months_clamped, format_iso_date, format_year_month};
use crate::model::{Asset, FALLBACK_ASSET_CLASS, IncomeType, LedgerState, Snapshot, TransactionKind};
use crate::recurrence::ExpandedTransaction;

pub const MAX_EFFECTIVE_TAX: f64 = 0.9;
pub const TRAILING_MONTHS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub assets: f64,
    pub liabilities: f64,
    pub net_worth: f64,
    pub passive_gross: f64,
    pub passive_net: f64,
}

pub fn compute_totals(state: &LedgerState) -> Totals {
    let assets = state.assets.iter().map(|asset| finite_or_zero(asset.value)).sum::<f64>();
    let liabilities = state
        .liabilities
        .iter()
        .map(|liability| finite_or_zero(liability.value))
        .sum::<f64>();
    let passive_gross = state.assets.iter().map(passive_annual_gross).sum::<f64>();

    Totals {
        assets,
        liabilities,
        net_worth: assets - liabilities,
        passive_gross,
        passive_net: passive_net(passive_gross, state.settings.tax_rate),
    }
}

/// Yearly passive income before tax for one asset.
///
/// Rent counts even when the asset has no value recorded; every other income type
/// needs both a value and an income value.
pub fn passive_annual_gross(asset: &Asset) -> f64 {
    let value = finite_or_zero(asset.value);
    let income_value = finite_or_zero(asset.income_value);

    if value == 0.0 || income_value == 0.0 {
        return match asset.income_type {
            IncomeType::RentPerMonth => income_value * 12.0,
            _ => 0.0,
        };
    }

    match asset.income_type {
        IncomeType::None => 0.0,
        IncomeType::YieldPct => value * income_value / 100.0,
        IncomeType::AmountPerYear => income_value,
        IncomeType::RentPerMonth => income_value * 12.0,
    }
}

pub fn passive_net(gross: f64, tax_rate: f64) -> f64 {
    let rate = (finite_or_zero(tax_rate) / 100.0).clamp(0.0, MAX_EFFECTIVE_TAX);
    gross * (1.0 - rate)
}

/// Totals per class, largest first; ties by class name.
pub fn group_by_class<'a, I>(items: I) -> Vec<ClassTotal>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut grouped: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (class, value) in items {
        let class = if class.trim().is_empty() {
            FALLBACK_ASSET_CLASS
        } else {
            class.trim()
        };
        let entry = grouped.entry(class.to_string()).or_insert((0.0, 0));
        entry.0 += finite_or_zero(value);
        entry.1 += 1;
    }

    let mut totals = grouped
        .into_iter()
        .map(|(class, (total, count))| ClassTotal {
            class,
            total,
            count,
        })
        .collect::<Vec<ClassTotal>>();
    totals.sort_by(|left, right| {
        right
            .total
            .total_cmp(&left.total)
            .then_with(|| left.class.cmp(&right.class))
    });
    totals
}

#[derive(Debug, Clone)]
pub struct MonthlyCashflow {
    pub income: f64,
    pub expenses: f64,
    pub result: f64,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub entries: Vec<CashflowEntry>,
}

/// Income, expenses and entries for the calendar month containing `month_start`.
pub fn monthly_cashflow(expanded: &[ExpandedTransaction], month_start: NaiveDate) -> MonthlyCashflow {
    let mut in_month = expanded
        .iter()
        .filter(|entry| same_month(entry.date, month_start))
        .collect::<Vec<&ExpandedTransaction>>();
    in_month.sort_by(|left, right| left.date.cmp(&right.date).then_with(|| left.id.cmp(&right.id)));

    let (income, expenses) = sum_by_kind(in_month.iter().copied());

    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    for entry in in_month.iter().filter(|entry| entry.kind == TransactionKind::Expense) {
        *by_category.entry(entry.category.clone()).or_default() += entry.amount;
    }
    let mut expenses_by_category = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect::<Vec<CategoryTotal>>();
    expenses_by_category.sort_by(|left, right| {
        right
            .total
            .total_cmp(&left.total)
            .then_with(|| left.category.cmp(&right.category))
    });

    let entries = in_month
        .into_iter()
        .map(|entry| CashflowEntry {
            id: entry.id.clone(),
            template_id: entry.template_id.clone(),
            kind: entry.kind.as_str().to_string(),
            category: entry.category.clone(),
            amount: entry.amount,
            date: format_iso_date(&entry.date),
            notes: entry.notes.clone(),
            synthetic: entry.synthetic,
        })
        .collect();

    MonthlyCashflow {
        income,
        expenses,
        result: income - expenses,
        expenses_by_category,
        entries,
    }
}

/// Month results for the `TRAILING_MONTHS` months ending at `month_start`, oldest first.
pub fn trailing_series(expanded: &[ExpandedTransaction], month_start: NaiveDate) -> Vec<CashflowMonth> {
    let mut series = Vec::with_capacity(TRAILING_MONTHS);
    for back in (0..TRAILING_MONTHS).rev() {
        let Ok(offset) = i32::try_from(back) else {
            continue;
        };
        let month = add_months_clamped(month_start, -offset);
        let (income, expenses) = sum_by_kind(
            expanded
                .iter()
                .filter(|entry| same_month(entry.date, month)),
        );
        series.push(CashflowMonth {
            month: format_year_month(&month),
            income,
            expenses,
            result: income - expenses,
        });
    }
    series
}

pub fn snapshot_for(state: &LedgerState, month_start: NaiveDate, recorded_at: DateTime<Utc>) -> Snapshot {
    let totals = compute_totals(state);
    Snapshot {
        ym: format_year_month(&month_start),
        assets_total: totals.assets,
        liabilities_total: totals.liabilities,
        net_worth: totals.net_worth,
        passive_gross_annual: totals.passive_gross,
        passive_net_annual: totals.passive_net,
        recorded_at: Some(recorded_at),
    }
}

/// Stores `snapshot`, replacing the one already kept for its month. Returns whether
/// a snapshot was replaced. The list stays ordered by month.
pub fn record_snapshot(snapshots: &mut Vec<Snapshot>, snapshot: Snapshot) -> bool {
    let replaced = match snapshots.iter_mut().find(|existing| existing.ym == snapshot.ym) {
        Some(existing) => {
            *existing = snapshot;
            true
        }
        None => {
            snapshots.push(snapshot);
            false
        }
    };
    snapshots.sort_by(|left, right| left.ym.cmp(&right.ym));
    replaced
}

/// Recorded snapshots, oldest month first.
pub fn snapshot_history(snapshots: &[Snapshot]) -> Vec<Snapshot> {
    let mut history = snapshots.to_vec();
    history.sort_by(|left, right| left.ym.cmp(&right.ym));
    history
}

fn sum_by_kind<'a, I>(entries: I) -> (f64, f64)
where
    I: Iterator<Item = &'a ExpandedTransaction>,
{
    entries.fold((0.0, 0.0), |(income, expenses), entry| match entry.kind {
        TransactionKind::Income => (income + finite_or_zero(entry.amount), expenses),
        TransactionKind::Expense => (income, expenses + finite_or_zero(entry.amount)),
    })
}

fn same_month(date: NaiveDate, month: NaiveDate) -> bool {
    date.year() == month.year() && date.month() == month.month()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
