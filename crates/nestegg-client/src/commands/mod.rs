pub mod cashflow;
pub(crate) mod common;
pub mod export;
pub mod import;
pub mod restore;
pub mod settings;
pub mod snapshot;
pub mod summary;
