use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");

pub const EXPECTED_USER_VERSION: i64 = 1;

pub const REQUIRED_META_KEYS: [(&str, &str); 2] =
    [("schema_version", "v1"), ("state_key", "ledger_state_v1")];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![M::up(BOOTSTRAP_SQL)]);
    migrations.to_latest(conn)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{EXPECTED_USER_VERSION, run_pending};

    #[test]
    fn bootstrap_creates_the_state_table() {
        let connection = Connection::open_in_memory();
        assert!(connection.is_ok());
        if let Ok(mut connection) = connection {
            assert!(run_pending(&mut connection).is_ok());
            let version = connection.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0));
            assert!(matches!(version, Ok(value) if value == EXPECTED_USER_VERSION));
            let tables = connection.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'",
                [],
                |row| row.get::<_, i64>(0),
            );
            assert!(matches!(tables, Ok(1)));
        }
    }

    #[test]
    fn running_twice_is_a_no_op() {
        let connection = Connection::open_in_memory();
        assert!(connection.is_ok());
        if let Ok(mut connection) = connection {
            assert!(run_pending(&mut connection).is_ok());
            assert!(run_pending(&mut connection).is_ok());
        }
    }
}
