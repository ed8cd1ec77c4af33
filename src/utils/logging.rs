use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "loan_sweep.log";

/// Filter used when `RUST_LOG` is unset: our crate at `level`, dependencies at warn
fn default_filter(level: &str) -> String {
    format!("warn,loan_sweep={level},db_summary={level}")
}

/// Initialize logging to stderr and to `{data_dir}/loan_sweep.log`
///
/// The file is opened in append mode and never truncated. `RUST_LOG` overrides `level`.
/// Returns the log file path.
pub fn init_logging(data_dir: &Path, level: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let log_path = data_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {:?}", log_path))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(log_path = %log_path.display(), "logging initialized");
    Ok(log_path)
}
