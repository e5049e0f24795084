use std::path::Path;

use crate::ClientResult;
use crate::commands::common::load_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{PassiveIncomeLine, SummaryData};
use crate::model::LedgerState;
use crate::reports::{compute_totals, group_by_class, passive_annual_gross, snapshot_history};

#[derive(Debug, Default)]
pub struct SummaryOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run() -> ClientResult<SuccessEnvelope> {
    run_with_options(SummaryOptions::default())
}

#[doc(hidden)]
pub fn run_with_options(options: SummaryOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let (_, _, state) = load_ledger(options.home_override)?;
    success("summary", summarize(&state))
}

pub(crate) fn summarize(state: &LedgerState) -> SummaryData {
    let totals = compute_totals(state);

    let mut passive_income = state
        .assets
        .iter()
        .filter_map(|asset| {
            let annual_gross = passive_annual_gross(asset);
            (annual_gross > 0.0).then(|| PassiveIncomeLine {
                asset_id: asset.id.clone(),
                name: asset.name.clone(),
                class: asset.class.clone(),
                income_type: asset.income_type.as_str().to_string(),
                annual_gross,
            })
        })
        .collect::<Vec<PassiveIncomeLine>>();
    passive_income.sort_by(|left, right| right.annual_gross.total_cmp(&left.annual_gross));

    SummaryData {
        currency: state.settings.currency.clone(),
        tax_rate: state.settings.tax_rate,
        total_assets: totals.assets,
        total_liabilities: totals.liabilities,
        net_worth: totals.net_worth,
        passive_income_gross: totals.passive_gross,
        passive_income_net: totals.passive_net,
        passive_income_monthly_net: totals.passive_net / 12.0,
        asset_count: state.assets.len(),
        liability_count: state.liabilities.len(),
        transaction_count: state.transactions.len(),
        assets_by_class: group_by_class(
            state
                .assets
                .iter()
                .map(|asset| (asset.class.as_str(), asset.value)),
        ),
        liabilities_by_class: group_by_class(
            state
                .liabilities
                .iter()
                .map(|liability| (liability.class.as_str(), liability.value)),
        ),
        passive_income,
        favorite_assets: state.assets.iter().filter(|asset| asset.favorite).cloned().collect(),
        favorite_liabilities: state
            .liabilities
            .iter()
            .filter(|liability| liability.favorite)
            .cloned()
            .collect(),
        history: snapshot_history(&state.snapshots),
    }
}
