use rusqlite::Connection;
use anyhow::{Result, Context};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Index creation statements extracted for idempotent execution
/// These are safe to run on every init because they use IF NOT EXISTS
const INDEX_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_sweep_runs_created_at ON sweep_runs(created_at);
CREATE INDEX IF NOT EXISTS idx_sweep_runs_term ON sweep_runs(term_years);
CREATE INDEX IF NOT EXISTS idx_variations_run_id ON variations(run_id);
";

/// Latest schema version produced by `run_migrations`
pub const LATEST_VERSION: i64 = 1;

/// Get current database schema version
pub fn get_schema_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to get schema version")?;
    Ok(version)
}

/// Set database schema version
fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(&format!("PRAGMA user_version = {}", version), [])
        .context("Failed to set schema version")?;
    Ok(())
}

/// Migrate from v0 (empty) to v1 (runs, variations, term trigger)
fn migrate_to_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
        .context("Failed to execute v1 schema migration")?;

    conn.execute_batch(INDEX_SQL)
        .context("Failed to create v1 indexes")?;

    Ok(())
}

/// Run all database migrations
/// Uses PRAGMA user_version to track schema state:
/// - v0: Empty database (no tables)
/// - v1: sweep_runs + variations, fixed-period trigger, 3 indexes
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_to_v1(conn)?;
        set_schema_version(conn, 1)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_get_schema_version_new_db() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn test_schema_version_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let conn = Connection::open(&db_path).unwrap();
            set_schema_version(&conn, 42).unwrap();
        }

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 42);
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();

        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"sweep_runs".to_string()));
        assert!(tables.contains(&"variations".to_string()));

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 3);

        let trigger_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type='trigger'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(trigger_count, 1);

        assert_eq!(get_schema_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), LATEST_VERSION);
    }
}
