pub mod commands;
pub mod contracts;
pub mod dates;
pub mod error;
mod export;
mod import;
pub mod migrations;
pub mod model;
pub mod recurrence;
pub mod reports;
pub mod setup;
pub mod store;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
