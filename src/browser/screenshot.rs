use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Page;

/// Writes timestamped diagnostic screenshots; a missing directory disables capture
///
/// Capture never fails the caller: errors are logged and `None` is returned.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
}

impl Diagnostics {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// `{prefix}-{YYYYmmdd-HHMMSS}.png`
    pub fn file_name(prefix: &str) -> String {
        format!("{}-{}.png", prefix, Local::now().format("%Y%m%d-%H%M%S"))
    }

    /// Prefix used for the screenshot of one sweep cell
    pub fn cell_prefix(term_years: u32, fixed_period_years: u32) -> String {
        format!("results_term_{}y_fixed_{}y", term_years, fixed_period_years)
    }

    /// Take a screenshot and write it under the configured directory
    pub async fn capture<P: Page + ?Sized>(&self, page: &mut P, prefix: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;

        let bytes = match page.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(prefix, error = %e, "screenshot capture failed");
                return None;
            }
        };

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "cannot create screenshot directory");
            return None;
        }

        let path = dir.join(Self::file_name(prefix));
        match std::fs::write(&path, &bytes) {
            Ok(()) => {
                debug!(path = %path.display(), bytes = bytes.len(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write screenshot");
                None
            }
        }
    }
}
