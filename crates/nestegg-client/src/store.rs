use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, Error as SqliteError, OptionalExtension, ffi::ErrorCode, params};
use tracing::debug;

use crate::model::LedgerState;
use crate::{ClientError, ClientResult};

pub const STATE_KEY: &str = "ledger_state_v1";
pub const HOME_ENV_VAR: &str = "NESTEGG_HOME";

/// Where the serialized state blob lives.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&mut self, key: &str, blob: &str) -> ClientResult<()>;
    fn location(&self) -> &Path;
}

pub struct SqliteStore {
    connection: Connection,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> ClientResult<Self> {
        Ok(Self {
            connection: open_connection(db_path)?,
            db_path: db_path.to_path_buf(),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1 LIMIT 1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))
    }

    fn set(&mut self, key: &str, blob: &str) -> ClientResult<()> {
        // Single statement: the blob is either fully replaced or left as it was.
        self.connection
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, blob, Utc::now().timestamp()],
            )
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.db_path
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    location: PathBuf,
    pub writes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            location: PathBuf::from(":memory:"),
            writes: 0,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, blob: &str) -> ClientResult<()> {
        self.values.insert(key.to_string(), blob.to_string());
        self.writes += 1;
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

/// Loads the stored state. A missing blob is an empty ledger; an unreadable one is
/// an error so the next write cannot silently wipe it.
pub fn load_state(store: &dyn KeyValueStore) -> ClientResult<LedgerState> {
    match store.get(STATE_KEY)? {
        None => Ok(LedgerState::default()),
        Some(blob) => serde_json::from_str::<LedgerState>(&blob)
            .map_err(|error| ClientError::state_corrupt(store.location(), &error.to_string())),
    }
}

pub fn save_state(store: &mut dyn KeyValueStore, state: &LedgerState) -> ClientResult<()> {
    let blob = serde_json::to_string(state)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    debug!(bytes = blob.len(), location = %store.location().display(), "writing ledger state");
    store.set(STATE_KEY, &blob)
}

pub fn resolve_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let candidate = match home_override {
        Some(path) => path.to_path_buf(),
        None => {
            if let Some(override_path) = std::env::var_os(HOME_ENV_VAR) {
                PathBuf::from(override_path)
            } else if let Some(home_path) = home::home_dir() {
                home_path.join(".nestegg")
            } else {
                return Err(ClientError::store_init_failed(
                    Path::new("."),
                    "Could not resolve a home directory for local storage.",
                ));
            }
        }
    };

    absolutize(&candidate)
}

pub fn ensure_home_directory(path: &Path) -> ClientResult<()> {
    fs::create_dir_all(path).map_err(|error| map_io_error(path, &error))?;
    set_private_permissions_best_effort(path);
    Ok(())
}

pub fn state_db_path(home: &Path) -> PathBuf {
    home.join("state.db")
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(Duration::from_millis(250))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &std::io::Error) -> ClientError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        return ClientError::store_init_permission_denied(path, &error.to_string());
    }

    ClientError::store_init_failed(path, &error.to_string())
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    let error_code = error.sqlite_error_code();

    if matches!(
        error_code,
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    ) {
        return ClientError::store_locked(path);
    }

    if matches!(error_code, Some(ErrorCode::NotADatabase)) {
        return ClientError::store_corrupt(path);
    }

    if matches!(
        error_code,
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly)
    ) {
        return ClientError::store_init_permission_denied(path, &error.to_string());
    }

    ClientError::store_init_failed(path, &error.to_string())
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::store_init_failed(path, &error.to_string()))
}

#[cfg(unix)]
fn set_private_permissions_best_effort(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn set_private_permissions_best_effort(_path: &Path) {}
