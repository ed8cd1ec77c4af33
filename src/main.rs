//! loan_sweep entry point
//!
//! Opens one WebDriver session, walks the calculator wizard to the results screen and
//! sweeps every (term, fixed period) cell into the run database.

use loan_sweep::{run_session, RunStore, SweepConfig, SweepError, WebDriverPage};

fn fatal(what: &str, error: &dyn std::fmt::Display, hints: &[&str]) -> ! {
    eprintln!("[loan_sweep] FATAL ERROR: {}", what);
    eprintln!("[loan_sweep] Error details: {}", error);
    if !hints.is_empty() {
        eprintln!("[loan_sweep] Please check:");
        for hint in hints {
            eprintln!("[loan_sweep]   - {}", hint);
        }
    }
    std::process::exit(1);
}

fn main() {
    loan_sweep::utils::load_env().ok();

    let config = match SweepConfig::from_env() {
        Ok(config) => config,
        Err(e) => fatal("Invalid configuration", &e, &["LOAN_SWEEP_* variables in the environment or .env"]),
    };

    if let Err(e) = loan_sweep::utils::init_logging(&config.data_dir, &config.log_level) {
        fatal("Failed to initialize logging", &format!("{:#}", e), &["Write permissions in the data directory"]);
    }

    // Store problems are fatal before the browser is started, never after
    let store = match RunStore::open(&config.db_path) {
        Ok(store) => store,
        Err(e) => fatal(
            "Failed to open the run database",
            &format!("{:#}", e),
            &["File system permissions in the data directory", "Available disk space"],
        ),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => fatal("Failed to start the async runtime", &e, &[]),
    };

    let result: Result<_, SweepError> = runtime.block_on(async {
        let mut page = WebDriverPage::connect(&config.browser).await?;
        run_session(&mut page, &config, &store).await
    });

    match result {
        Ok(report) => {
            tracing::info!(
                runs = report.persisted_runs(),
                cells = report.total_cells(),
                failed = report.failed_cells(),
                db = %config.db_path.display(),
                "sweep finished"
            );
        }
        Err(e) => {
            tracing::error!(category = e.category(), error = %e, "sweep failed");
            fatal(
                "Sweep aborted",
                &e,
                &[
                    "WebDriver is running at WEBDRIVER_URL",
                    "The calculator is reachable at LOAN_SWEEP_ENTRY_URL",
                    "Screenshots in the screenshots directory",
                ],
            );
        }
    }
}
