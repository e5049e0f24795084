use std::fs;
use std::path::Path;

use tracing::info;

use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::RestoreData;
use crate::export::state_from_backup;
use crate::store::save_state;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct RestoreOptions<'a> {
    pub path: String,
    pub home_override: Option<&'a Path>,
}

pub fn run(path: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(RestoreOptions {
        path: path.to_string(),
        home_override: None,
    })
}

/// Replaces the whole stored state. The current state is never read, so this also
/// recovers from an undecodable blob.
#[doc(hidden)]
pub fn run_with_options(options: RestoreOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let text = fs::read_to_string(&options.path)
        .map_err(|error| ClientError::invalid_backup(&options.path, &error.to_string()))?;
    let state = state_from_backup(&options.path, &text)?;

    let setup = load_setup(options.home_override)?;
    let mut store = setup.open_store()?;
    save_state(&mut store, &state)?;
    info!(
        path = %options.path,
        assets = state.assets.len(),
        liabilities = state.liabilities.len(),
        transactions = state.transactions.len(),
        "restored backup"
    );

    success(
        "restore",
        RestoreData {
            path: options.path,
            message: "Backup restored; previous data was replaced.".to_string(),
            asset_count: state.assets.len(),
            liability_count: state.liabilities.len(),
            transaction_count: state.transactions.len(),
            settings: state.settings,
        },
    )
}
