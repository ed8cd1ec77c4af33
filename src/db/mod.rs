use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use serde::Serialize;
use tracing::warn;

use crate::models::{NormalizedVariation, Run, Variation};

pub mod migrations;
pub mod queries;

#[cfg(test)]
pub mod test_helpers;

pub use migrations::run_migrations;
pub use queries::*;

/// Open a connection with the pragmas every store operation relies on
fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    ).with_context(|| format!("Failed to open database at {:?}", db_path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    // journal_mode returns the resulting mode as a row
    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .context("Failed to enable WAL mode")?;

    conn.busy_timeout(std::time::Duration::from_secs(5))
        .context("Failed to set busy timeout")?;

    Ok(conn)
}

/// Counts and the most recent run, as printed by `db_summary`
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub run_count: i64,
    pub variation_count: i64,
    pub unavailable_count: i64,
    pub runs_by_term: Vec<(u32, i64)>,
    pub latest_run: Option<Run>,
}

/// Handle to the run/variation database
///
/// Holds only the path. Every operation opens its own connection and drops it when done,
/// so a failed write never leaves a half-open transaction behind for the next term.
#[derive(Debug, Clone)]
pub struct RunStore {
    db_path: PathBuf,
}

impl RunStore {
    /// Create parent directories and bring the schema up to date
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
            }
        }

        let conn = connect(&db_path)?;
        run_migrations(&conn)?;

        Ok(Self { db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn create_run(&self, run: &Run) -> Result<i64> {
        let conn = connect(&self.db_path)?;
        insert_run(&conn, run)
    }

    pub fn add_variation(&self, run_id: i64, variation: &Variation) -> Result<i64> {
        let conn = connect(&self.db_path)?;
        insert_variation(&conn, run_id, variation)
    }

    /// Persist a run and then each of its variations in grid order
    ///
    /// Each variation is its own statement. When one fails, the run and the variations
    /// already written are deleted again so no short run is ever visible to readers.
    pub fn save_run_with_variations(&self, run: &Run, variations: &[Variation]) -> Result<i64> {
        let conn = connect(&self.db_path)?;
        let run_id = insert_run(&conn, run)?;
        for variation in variations {
            if let Err(e) = insert_variation(&conn, run_id, variation) {
                if let Err(cleanup) = delete_run(&conn, run_id) {
                    warn!(run_id, error = %format!("{:#}", cleanup), "failed to remove partial run");
                }
                return Err(e);
            }
        }
        Ok(run_id)
    }

    pub fn list_runs(&self) -> Result<Vec<Run>> {
        let conn = connect(&self.db_path)?;
        select_runs(&conn)
    }

    pub fn get_run(&self, run_id: i64) -> Result<Option<Run>> {
        let conn = connect(&self.db_path)?;
        select_run(&conn, run_id)
    }

    pub fn list_variations(&self, run_id: i64) -> Result<Vec<Variation>> {
        let conn = connect(&self.db_path)?;
        select_variations(&conn, run_id)
    }

    pub fn latest_run_per_term(&self) -> Result<BTreeMap<u32, Run>> {
        let conn = connect(&self.db_path)?;
        let runs = select_latest_run_per_term(&conn)?;
        Ok(runs.into_iter().map(|run| (run.term_years, run)).collect())
    }

    pub fn normalized_variations(&self, run_id: i64) -> Result<Vec<NormalizedVariation>> {
        let variations = self.list_variations(run_id)?;
        Ok(variations.iter().map(NormalizedVariation::from).collect())
    }

    pub fn summary(&self) -> Result<StoreSummary> {
        let conn = connect(&self.db_path)?;
        let latest_run = select_runs(&conn)?.into_iter().next();

        Ok(StoreSummary {
            run_count: count_runs(&conn)?,
            variation_count: count_variations(&conn)?,
            unavailable_count: count_unavailable_variations(&conn)?,
            runs_by_term: count_runs_by_term(&conn)?,
            latest_run,
        })
    }
}
