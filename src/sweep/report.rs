use serde::Serialize;
use tracing::info;

/// Result of sweeping one loan term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermOutcome {
    pub term_years: u32,
    /// Id of the stored run; `None` when persisting failed
    pub run_id: Option<i64>,
    pub cells: usize,
    /// Cells where the panel yielded nothing
    pub failed_cells: usize,
    pub persist_error: Option<String>,
}

/// Per-term outcomes of a sweep session, in sweep order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub terms: Vec<TermOutcome>,
}

impl SweepReport {
    pub fn total_cells(&self) -> usize {
        self.terms.iter().map(|t| t.cells).sum()
    }

    pub fn failed_cells(&self) -> usize {
        self.terms.iter().map(|t| t.failed_cells).sum()
    }

    pub fn persisted_runs(&self) -> usize {
        self.terms.iter().filter(|t| t.run_id.is_some()).count()
    }

    pub fn log_summary(&self) {
        for term in &self.terms {
            info!(
                term = term.term_years,
                run_id = ?term.run_id,
                cells = term.cells,
                failed = term.failed_cells,
                "term summary"
            );
        }
        info!(
            terms = self.terms.len(),
            runs = self.persisted_runs(),
            cells = self.total_cells(),
            failed = self.failed_cells(),
            "sweep summary"
        );
    }
}
