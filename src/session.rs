// Scoped sweep session
// Navigator once, then the sweep, then close the browser regardless of outcome

use tracing::{info, warn};

use crate::browser::{Diagnostics, Page};
use crate::config::SweepConfig;
use crate::db::RunStore;
use crate::error::Result;
use crate::extractor::QuoteExtractor;
use crate::navigator::{default_screens, FormNavigator, NavigatorSettings};
use crate::sweep::{SweepController, SweepReport, SweepSettings};

/// Drive one page through the wizard and the full sweep
///
/// `page.close()` always runs. A close failure is logged and never replaces the sweep's
/// own result.
pub async fn run_session<P: Page>(page: &mut P, config: &SweepConfig, store: &RunStore) -> Result<SweepReport> {
    let result = drive(page, config, store).await;

    if let Err(e) = page.close().await {
        warn!(error = %e, sweep_ok = result.is_ok(), "browser cleanup failed");
    }

    result
}

async fn drive(page: &mut dyn Page, config: &SweepConfig, store: &RunStore) -> Result<SweepReport> {
    let diagnostics = Diagnostics::new(config.screenshot_dir());
    let settings = SweepSettings::from_config(config);
    let initial_term = settings.normalized_terms().first().copied().unwrap_or_default();

    let navigator = FormNavigator::new(NavigatorSettings::from_config(config), diagnostics.clone());
    let screens = default_screens(&config.run, initial_term);
    navigator.reach_results(page, &screens).await?;
    info!("results screen reached");

    let controller = SweepController::new(settings, QuoteExtractor::default(), diagnostics);
    controller.run(page, store, &config.run).await
}
