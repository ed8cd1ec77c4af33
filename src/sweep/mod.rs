// Parameter sweep controller
// For every loan term, sets the term slider once and walks the fixed-period slider
// over the valid grid, reading the results panel after each move. Each term becomes
// one Run with one Variation per grid cell.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::browser::{Diagnostics, Locator, Page};
use crate::config::SweepConfig;
use crate::db::RunStore;
use crate::error::{recover, Result, SweepError};
use crate::extractor::QuoteExtractor;
use crate::models::{QuoteFields, Run, RunParameters, Variation};

pub mod report;

pub use report::{SweepReport, TermOutcome};

pub const FIXED_PERIOD_STEP: u32 = 5;

/// Fixed-rate periods for a term: 0, 5, 10, … up to the largest multiple of 5 ≤ term
pub fn fixed_period_grid(term_years: u32) -> Vec<u32> {
    (0..=term_years).step_by(FIXED_PERIOD_STEP as usize).collect()
}

/// Positive terms, deduplicated, highest first
pub fn normalize_terms(terms: &[u32]) -> Vec<u32> {
    let mut terms: Vec<u32> = terms.iter().copied().filter(|&t| t > 0).collect();
    terms.sort_unstable_by(|a, b| b.cmp(a));
    terms.dedup();
    terms
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    pub terms: Vec<u32>,
    pub term_slider: Locator,
    pub fixed_period_slider: Locator,
    /// Wait after every slider move before the first read
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    /// Upper bound on polling for a stable panel
    pub settle_cap: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            terms: crate::config::DEFAULT_TERMS.to_vec(),
            term_slider: Locator::id("laufzeitslider"),
            fixed_period_slider: Locator::id("fixverzinsungslider"),
            settle_delay: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(250),
            settle_cap: Duration::from_millis(10_000),
        }
    }
}

impl SweepSettings {
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            terms: config.terms.clone(),
            settle_delay: config.settle_delay,
            settle_cap: config.settle_cap,
            ..Default::default()
        }
    }

    pub fn normalized_terms(&self) -> Vec<u32> {
        normalize_terms(&self.terms)
    }
}

pub struct SweepController {
    settings: SweepSettings,
    extractor: QuoteExtractor,
    diagnostics: Diagnostics,
}

impl SweepController {
    pub fn new(settings: SweepSettings, extractor: QuoteExtractor, diagnostics: Diagnostics) -> Self {
        Self {
            settings,
            extractor,
            diagnostics,
        }
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Sweep every configured term and persist one run per term
    ///
    /// Storage failures skip the affected run. A session-fatal error stops the sweep after the
    /// cells read so far for the current term are stored (padded with empty cells).
    pub async fn run(&self, page: &mut dyn Page, store: &RunStore, params: &RunParameters) -> Result<SweepReport> {
        let terms = self.settings.normalized_terms();
        info!(terms = ?terms, "starting sweep");

        let mut report = SweepReport::default();
        let mut previous: Option<QuoteFields> = None;

        for term in terms {
            let (outcome, fatal) = self.sweep_term(page, store, params, term, &mut previous).await;
            report.terms.push(outcome);

            if let Some(e) = fatal {
                error!(term, error = %e, "sweep aborted");
                report.log_summary();
                return Err(e);
            }
        }

        self.diagnostics.capture(page, "results_final").await;
        report.log_summary();
        Ok(report)
    }

    async fn sweep_term(
        &self,
        page: &mut dyn Page,
        store: &RunStore,
        params: &RunParameters,
        term: u32,
        previous: &mut Option<QuoteFields>,
    ) -> (TermOutcome, Option<SweepError>) {
        let grid = fixed_period_grid(term);
        info!(term, grid = ?grid, "sweeping term");

        let mut variations = Vec::with_capacity(grid.len());
        let mut fatal = self.move_slider(page, &self.settings.term_slider, term).await.err();

        if fatal.is_none() {
            for &fixed_period in &grid {
                match self.sweep_cell(page, term, fixed_period, previous).await {
                    Ok(variation) => variations.push(variation),
                    Err(e) => {
                        fatal = Some(e);
                        break;
                    }
                }
            }
        }

        if variations.len() < grid.len() {
            warn!(term, scraped = variations.len(), grid = grid.len(), "padding unscraped cells");
            variations.extend(grid[variations.len()..].iter().map(|&fp| Variation::unavailable(fp)));
        }

        let mut outcome = TermOutcome {
            term_years: term,
            run_id: None,
            cells: variations.len(),
            failed_cells: variations.iter().filter(|v| v.is_unavailable()).count(),
            persist_error: None,
        };

        let run = Run::new(params, term);
        match store.save_run_with_variations(&run, &variations) {
            Ok(run_id) => {
                info!(term, run_id, cells = outcome.cells, failed = outcome.failed_cells, "run stored");
                outcome.run_id = Some(run_id);
            }
            Err(e) => {
                let e = SweepError::from(e);
                error!(term, category = e.category(), error = %e, "failed to store run, continuing");
                outcome.persist_error = Some(e.to_string());
            }
        }

        (outcome, fatal)
    }

    async fn sweep_cell(
        &self,
        page: &mut dyn Page,
        term: u32,
        fixed_period: u32,
        previous: &mut Option<QuoteFields>,
    ) -> Result<Variation> {
        self.move_slider(page, &self.settings.fixed_period_slider, fixed_period).await?;

        let mut quote = self.settle(page).await?;
        if quote.is_empty() || previous.as_ref() == Some(&quote) {
            debug!(term, fixed_period, empty = quote.is_empty(), "panel empty or unchanged, retrying once");
            sleep(self.settings.settle_delay).await;
            quote = self.settle(page).await?;
        }

        if quote.is_empty() {
            warn!(term, fixed_period, "no quote captured");
        } else {
            info!(term, fixed_period, fields = quote.len(), "quote captured");
        }

        self.diagnostics
            .capture(page, &Diagnostics::cell_prefix(term, fixed_period))
            .await;

        let variation = Variation::from_quote(fixed_period, &quote);
        *previous = Some(quote);
        Ok(variation)
    }

    /// Set a slider without read-back; a missing slider is only logged
    async fn move_slider(&self, page: &mut dyn Page, slider: &Locator, value: u32) -> Result<()> {
        if !recover(page.set_slider(slider, value).await, false, "slider")? {
            warn!(slider = %slider, value, "slider not found");
        }
        Ok(())
    }

    /// Wait, then poll until two consecutive non-empty reads agree or the cap is hit
    async fn settle(&self, page: &mut dyn Page) -> Result<QuoteFields> {
        sleep(self.settings.settle_delay).await;

        let deadline = Instant::now() + self.settings.settle_cap;
        let mut last = self.extractor.extract(page).await?;
        while Instant::now() < deadline {
            sleep(self.settings.poll_interval).await;
            let current = self.extractor.extract(page).await?;
            if !current.is_empty() && current == last {
                return Ok(current);
            }
            last = current;
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeElement, FakePage, FakeState};
    use crate::browser::GridRow;
    use crate::db::test_helpers::TestDbGuard;
    use rstest::rstest;

    fn fast_settings(terms: Vec<u32>) -> SweepSettings {
        SweepSettings {
            terms,
            settle_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            settle_cap: Duration::from_millis(20),
            ..Default::default()
        }
    }

    fn controller(terms: Vec<u32>) -> SweepController {
        SweepController::new(fast_settings(terms), QuoteExtractor::default(), Diagnostics::disabled())
    }

    /// Installment derived from both slider positions so every cell differs
    fn quote_grid(state: &FakeState) -> Option<Vec<GridRow>> {
        let term: u32 = state.value("laufzeitslider")?.parse().ok()?;
        let fixed: u32 = state.value("fixverzinsungslider")?.parse().ok()?;
        Some(vec![
            ("Rate".to_string(), format!("€ {}", 1000 + term * 10 + fixed)),
            ("Zinssatz".to_string(), format!("3,{:03} %", fixed * 10)),
            ("Laufzeit".to_string(), format!("{} Jahre", term)),
        ])
    }

    fn calculator() -> FakePage {
        FakePage::new()
            .with(FakeElement::slider("laufzeitslider", 35))
            .with(FakeElement::slider("fixverzinsungslider", 0))
            .with_grid(quote_grid)
    }

    #[rstest]
    #[case(35, vec![0, 5, 10, 15, 20, 25, 30, 35])]
    #[case(30, vec![0, 5, 10, 15, 20, 25, 30])]
    #[case(17, vec![0, 5, 10, 15])]
    #[case(5, vec![0, 5])]
    #[case(4, vec![0])]
    #[case(1, vec![0])]
    fn test_fixed_period_grid(#[case] term: u32, #[case] expected: Vec<u32>) {
        assert_eq!(fixed_period_grid(term), expected);
    }

    #[test]
    fn test_normalize_terms() {
        assert_eq!(normalize_terms(&[15, 35, 0, 20, 35]), vec![35, 20, 15]);
        assert!(normalize_terms(&[0]).is_empty());
    }

    #[tokio::test]
    async fn test_sweep_stores_one_run_per_term() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = calculator();

        let report = controller(vec![10, 20])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(report.terms.len(), 2);
        assert_eq!(report.terms[0].term_years, 20);
        assert_eq!(report.total_cells(), 5 + 3);
        assert_eq!(report.failed_cells(), 0);

        let latest = store.latest_run_per_term().unwrap();
        let run_20 = &latest[&20];
        let variations = store.list_variations(run_20.id).unwrap();
        let periods: Vec<u32> = variations.iter().map(|v| v.fixed_period_years).collect();
        assert_eq!(periods, vec![0, 5, 10, 15, 20]);
        assert_eq!(variations[1].monthly_installment, Some(1205.0));
        assert_eq!(variations[1].loan_term, "20 Jahre");
        assert_eq!(run_20.notes, "Multi-term sweep (results sliders) - 20 years");

        // term slider set once per term, fixed-period slider once per cell
        let term_moves = page.slider_log.iter().filter(|(s, _)| s == "#laufzeitslider").count();
        assert_eq!(term_moves, 2);
    }

    #[tokio::test]
    async fn test_missing_panel_stores_null_cells() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = FakePage::new()
            .with(FakeElement::slider("laufzeitslider", 35))
            .with(FakeElement::slider("fixverzinsungslider", 0));

        let report = controller(vec![5])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(report.failed_cells(), 2);
        let run_id = report.terms[0].run_id.unwrap();
        let variations = store.list_variations(run_id).unwrap();
        assert_eq!(variations.len(), 2);
        assert!(variations.iter().all(|v| v.monthly_installment.is_none()));
        assert!(variations.iter().all(|v| v.interest_rate == "-" && v.collateral == "-"));
    }

    #[tokio::test]
    async fn test_fatal_error_persists_padded_partial_term() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = calculator();
        // each cell reads the panel at least twice; lose the session during the third cell
        page.lose_session_after_reads = Some(5);

        let err = controller(vec![20, 10])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::SessionLost(_)));

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].term_years, 20);

        let variations = store.list_variations(runs[0].id).unwrap();
        assert_eq!(variations.len(), 5);
        assert!(variations[0].monthly_installment.is_some());
        assert!(variations[4].is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_slider_is_not_fatal() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = FakePage::new().with_grid(|_| Some(vec![("Rate".to_string(), "€ 1.500".to_string())]));

        let report = controller(vec![5])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(report.terms[0].cells, 2);
        assert_eq!(report.failed_cells(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_term_and_continues() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        guard
            .init_db()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_term_20 BEFORE INSERT ON sweep_runs WHEN NEW.term_years = 20
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();
        let mut page = calculator();

        let report = controller(vec![20, 10])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(report.terms.len(), 2);
        assert_eq!(report.terms[0].term_years, 20);
        assert_eq!(report.terms[0].run_id, None);
        assert!(report.terms[0].persist_error.as_deref().unwrap().contains("disk full"));
        assert!(report.terms[1].run_id.is_some());
        assert_eq!(report.persisted_runs(), 1);

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].term_years, 10);
        assert_eq!(store.list_variations(runs[0].id).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_variation_write_leaves_no_short_run() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        guard
            .init_db()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_fixed_10 BEFORE INSERT ON variations WHEN NEW.fixed_period_years = 10
                 BEGIN SELECT RAISE(ABORT, 'write failed'); END;",
            )
            .unwrap();
        let mut page = calculator();

        let report = controller(vec![15, 5])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(report.terms[0].run_id, None);
        assert!(report.terms[1].run_id.is_some());

        let latest = store.latest_run_per_term().unwrap();
        assert!(!latest.contains_key(&15));
        let run_5 = &latest[&5];
        assert_eq!(store.list_variations(run_5.id).unwrap().len(), fixed_period_grid(5).len());
        assert_eq!(store.summary().unwrap().variation_count, 2);
    }

    #[tokio::test]
    async fn test_unchanged_panel_is_read_again_once() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = FakePage::new()
            .with(FakeElement::slider("laufzeitslider", 35))
            .with(FakeElement::slider("fixverzinsungslider", 0))
            .with_grid(|_| Some(vec![("Rate".to_string(), "€ 1.500".to_string())]));

        let report = controller(vec![5])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        // cell 0: one settle (2 reads); cell 5 matches cell 0, so a second settle follows
        assert_eq!(page.grid_reads, 2 + 2 + 2);

        // the stale quote is kept rather than retried again
        assert_eq!(report.terms[0].cells, 2);
        let variations = store.list_variations(report.terms[0].run_id.unwrap()).unwrap();
        assert_eq!(variations.len(), 2);
        assert!(variations.iter().all(|v| v.monthly_installment == Some(1500.0)));
    }

    #[tokio::test]
    async fn test_changing_panel_is_read_without_retry() {
        let guard = TestDbGuard::new();
        let store = guard.store();
        let mut page = calculator();

        controller(vec![5])
            .run(&mut page, &store, &RunParameters::default())
            .await
            .unwrap();

        assert_eq!(page.grid_reads, 2 + 2);
    }
}
