use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const IMPORT_HELP_COMMAND: &str = "nestegg import --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `nestegg {cmd} --help` for usage."),
            None => "Run `nestegg --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn import_source_unreadable(path: &str, detail: &str) -> Self {
        Self::new(
            "import_source_unreadable",
            &format!("Could not read import file `{path}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Rerun `nestegg import <path>`.".to_string(),
            ],
        )
        .with_data(json!({
            "path": path,
            "help_command": IMPORT_HELP_COMMAND,
        }))
    }

    pub fn invalid_backup(path: &str, detail: &str) -> Self {
        Self::new(
            "invalid_backup",
            &format!("`{path}` is not a valid nestegg backup: {detail}"),
            vec![
                "Restore from a file produced by `nestegg export --format json`.".to_string(),
                "Your current data was left unchanged.".to_string(),
            ],
        )
    }

    pub fn state_corrupt(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "state_corrupt",
            &format!("Stored ledger state at `{location}` could not be decoded: {detail}"),
            vec![
                "Restore a backup with `nestegg restore <backup.json>`.".to_string(),
                format!("Or move `{location}` aside to start from an empty ledger."),
            ],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn store_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_init_permission_denied",
            &format!("Cannot initialize storage at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `NESTEGG_HOME` to a writable directory."
            )],
        )
    }

    pub fn store_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_locked",
            &format!("Storage database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn store_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_corrupt",
            &format!("Storage database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite file or restore from a JSON backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Storage migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn store_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_init_failed",
            &format!("Storage initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
