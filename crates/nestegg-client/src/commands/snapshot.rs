use std::path::Path;

use chrono::{Datelike, Local, NaiveDate, Utc};
use tracing::info;

use crate::commands::common::load_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SnapshotData;
use crate::dates::parse_year_month;
use crate::reports::{record_snapshot, snapshot_for, snapshot_history};
use crate::store::save_state;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct SnapshotOptions<'a> {
    /// `YYYY-MM`; the current month when absent.
    pub month: Option<String>,
    /// Drop every recorded snapshot instead of recording one.
    pub clear: bool,
    pub home_override: Option<&'a Path>,
}

pub fn run(month: Option<&str>, clear: bool) -> ClientResult<SuccessEnvelope> {
    run_with_options(SnapshotOptions {
        month: month.map(std::string::ToString::to_string),
        clear,
        home_override: None,
    })
}

/// Records the current totals under one month, replacing an earlier snapshot of the
/// same month, or clears the history.
#[doc(hidden)]
pub fn run_with_options(options: SnapshotOptions<'_>) -> ClientResult<SuccessEnvelope> {
    if options.clear && options.month.is_some() {
        return Err(ClientError::invalid_argument_for_command(
            "`--clear` cannot be combined with `--month`.",
            Some("snapshot"),
        ));
    }
    let month_start = match options.month.as_deref() {
        Some(value) => parse_year_month(value.trim(), "snapshot")?,
        None => current_month_start(),
    };

    let (_, mut store, mut state) = load_ledger(options.home_override)?;

    if options.clear {
        let removed = state.snapshots.len();
        if removed > 0 {
            state.snapshots.clear();
            save_state(&mut store, &state)?;
        }
        info!(removed, "cleared snapshots");
        return success(
            "snapshot",
            SnapshotData {
                currency: state.settings.currency,
                action: "cleared".to_string(),
                snapshot: None,
                history: Vec::new(),
            },
        );
    }

    let snapshot = snapshot_for(&state, month_start, Utc::now());
    let replaced = record_snapshot(&mut state.snapshots, snapshot.clone());
    save_state(&mut store, &state)?;
    info!(month = %snapshot.ym, replaced, net_worth = snapshot.net_worth, "recorded snapshot");

    success(
        "snapshot",
        SnapshotData {
            currency: state.settings.currency.clone(),
            action: if replaced { "replaced" } else { "recorded" }.to_string(),
            snapshot: Some(snapshot),
            history: snapshot_history(&state.snapshots),
        },
    )
}

fn current_month_start() -> NaiveDate {
    let today = Local::now().date_naive();
    today.with_day(1).unwrap_or(today)
}
