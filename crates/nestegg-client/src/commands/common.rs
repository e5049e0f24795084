use std::path::Path;

use crate::ClientResult;
use crate::model::LedgerState;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};
use crate::store::{SqliteStore, load_state};

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    if let Some(path) = home_override {
        return ensure_initialized_at(path);
    }
    ensure_initialized()
}

/// Opens the store and decodes the current state in one step, for read-only commands.
pub(crate) fn load_ledger(
    home_override: Option<&Path>,
) -> ClientResult<(SetupContext, SqliteStore, LedgerState)> {
    let setup = load_setup(home_override)?;
    let store = setup.open_store()?;
    let state = load_state(&store)?;
    Ok((setup, store, state))
}
