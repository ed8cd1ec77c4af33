//! Test isolation and database setup helpers
//!
//! Every guard owns its own temporary directory so tests never share a database file

use super::{migrations, RunStore};
use rusqlite::Connection;

/// Test database guard that manages an isolated test database
pub struct TestDbGuard {
    pub temp_dir: tempfile::TempDir,
}

impl TestDbGuard {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().unwrap();
        TestDbGuard { temp_dir }
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("housing_loan.db")
    }

    /// Open a raw connection with the schema applied
    pub fn init_db(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(self.db_path())
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| anyhow::anyhow!("Failed to enable foreign keys: {}", e))?;

        migrations::run_migrations(&conn)?;

        Ok(conn)
    }

    /// Open a store backed by this guard's database file
    pub fn store(&self) -> RunStore {
        RunStore::open(self.db_path()).unwrap()
    }
}

impl Default for TestDbGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_isolation() {
        let guard1 = TestDbGuard::new();
        let conn1 = guard1.init_db().expect("Failed to initialize database");
        conn1
            .execute(
                "INSERT INTO sweep_runs (created_at, principal, term_years, purchase_price, purchase_costs, own_funds, applicant_age, net_monthly_income, living_area_sqm, existing_installments)
                 VALUES ('2025-01-01T00:00:00Z', 1, 10, 1, 1, 1, 30, 1, 50, 0)",
                [],
            )
            .unwrap();

        let guard2 = TestDbGuard::new();
        let conn2 = guard2.init_db().expect("Failed to initialize database");
        let count: i64 = conn2
            .query_row("SELECT COUNT(*) FROM sweep_runs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
