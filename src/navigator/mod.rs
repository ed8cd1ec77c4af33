// Form navigator
// Drives the calculator wizard from the entry page to the results screen, once per session.
// Element-level problems are logged and skipped; only an unreachable entry page or a
// results panel that never shows up ends the session.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::{Diagnostics, GridLayout, Locator, Page};
use crate::config::SweepConfig;
use crate::error::{recover, Result, SweepError};

pub mod screens;
pub mod strategy;

pub use screens::{default_screens, ScreenSpec};
pub use strategy::{ApplyOutcome, FieldSpec, FieldStrategy, FieldValue, StrategyChain};

pub const CONSENT_BUTTONS: [&str; 5] = [
    "Alle akzeptieren",
    "Akzeptieren",
    "Zustimmen",
    "Einverstanden",
    "Accept all",
];

pub const VALIDATION_SELECTOR: &str = ".alert-danger, .error, [class*='error'], [class*='danger']";

#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorSettings {
    pub entry_url: String,
    /// How long to wait for a screen's marker texts
    pub marker_timeout: Duration,
    /// How long to wait for the results panel after the last form screen
    pub results_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause after advancing before validation messages are read
    pub validation_delay: Duration,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            entry_url: crate::config::DEFAULT_ENTRY_URL.to_string(),
            marker_timeout: Duration::from_secs(20),
            results_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            validation_delay: Duration::from_secs(2),
        }
    }
}

impl NavigatorSettings {
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            entry_url: config.entry_url.clone(),
            ..Default::default()
        }
    }
}

/// What happened on one wizard screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenOutcome {
    pub name: String,
    /// Marker text appeared before the timeout
    pub ready: bool,
    pub fields_applied: Vec<String>,
    pub fields_unverified: Vec<String>,
    pub advanced: bool,
    pub validation_messages: Vec<String>,
}

pub struct FormNavigator {
    settings: NavigatorSettings,
    chain: StrategyChain,
    diagnostics: Diagnostics,
    layout: GridLayout,
}

impl FormNavigator {
    pub fn new(settings: NavigatorSettings, diagnostics: Diagnostics) -> Self {
        Self {
            settings,
            chain: StrategyChain::default(),
            diagnostics,
            layout: GridLayout::default(),
        }
    }

    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Walk the wizard and stop once the results panel is on the page
    ///
    /// # Errors
    /// `EntryUnreachable` when the entry URL fails to load, `ResultsUnreachable` when the
    /// panel does not appear in time, or any session-fatal browser error on the way
    pub async fn reach_results(&self, page: &mut dyn Page, screens: &[ScreenSpec]) -> Result<Vec<ScreenOutcome>> {
        info!(url = %self.settings.entry_url, "opening calculator");
        page.goto(&self.settings.entry_url)
            .await
            .map_err(|e| SweepError::EntryUnreachable(format!("{}: {}", self.settings.entry_url, e)))?;

        self.accept_cookies(page).await?;

        let mut outcomes = Vec::with_capacity(screens.len());
        for screen in screens {
            let outcome = self.run_screen(page, screen).await?;
            info!(
                screen = %outcome.name,
                ready = outcome.ready,
                applied = outcome.fields_applied.len(),
                unverified = outcome.fields_unverified.len(),
                advanced = outcome.advanced,
                "screen done"
            );
            outcomes.push(outcome);
        }

        self.wait_for_results_panel(page).await?;
        Ok(outcomes)
    }

    /// Best-effort click on a cookie consent button
    async fn accept_cookies(&self, page: &mut dyn Page) -> Result<bool> {
        for name in CONSENT_BUTTONS {
            if recover(page.click(&Locator::button(name)).await, false, "consent")? {
                info!(button = name, "cookie consent accepted");
                return Ok(true);
            }
        }
        debug!("no cookie consent banner found");
        Ok(false)
    }

    async fn wait_for_markers(&self, page: &mut dyn Page, markers: &[&str]) -> Result<bool> {
        if markers.is_empty() {
            return Ok(true);
        }
        let deadline = Instant::now() + self.settings.marker_timeout;
        loop {
            for marker in markers {
                if recover(page.is_visible(&Locator::text(*marker)).await, false, "marker")? {
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    async fn run_screen(&self, page: &mut dyn Page, screen: &ScreenSpec) -> Result<ScreenOutcome> {
        let mut outcome = ScreenOutcome {
            name: screen.name.to_string(),
            ready: self.wait_for_markers(page, &screen.markers).await?,
            fields_applied: Vec::new(),
            fields_unverified: Vec::new(),
            advanced: false,
            validation_messages: Vec::new(),
        };

        if !outcome.ready {
            warn!(screen = screen.name, markers = ?screen.markers, "screen markers not visible");
            self.diagnostics
                .capture(page, &format!("{}-debug", screen.name))
                .await;
        }

        for (field, value) in &screen.fields {
            let applied = self.chain.apply(page, field, value).await?;
            if applied.verified {
                outcome.fields_applied.push(applied.field);
            } else {
                outcome.fields_unverified.push(applied.field);
            }
        }

        self.diagnostics.capture(page, screen.name).await;

        for name in &screen.advance {
            if recover(page.click(&Locator::button(*name)).await, false, "advance")? {
                debug!(screen = screen.name, button = name, "advanced");
                outcome.advanced = true;
                break;
            }
        }
        if !screen.advance.is_empty() && !outcome.advanced {
            warn!(screen = screen.name, buttons = ?screen.advance, "no advance button could be clicked");
        }

        if screen.check_validation {
            sleep(self.settings.validation_delay).await;
            outcome.validation_messages =
                recover(page.read_texts(VALIDATION_SELECTOR).await, Vec::new(), "validation")?;
            for message in &outcome.validation_messages {
                warn!(screen = screen.name, message = %message, "validation message");
            }
        }

        Ok(outcome)
    }

    async fn wait_for_results_panel(&self, page: &mut dyn Page) -> Result<()> {
        let deadline = Instant::now() + self.settings.results_timeout;
        loop {
            if recover(page.read_grid(&self.layout).await, None, "results panel")?.is_some() {
                info!("results panel present");
                return Ok(());
            }
            if Instant::now() >= deadline {
                self.diagnostics.capture(page, "results-unreachable").await;
                return Err(SweepError::ResultsUnreachable(format!(
                    "panel {} not visible after {:?}",
                    self.layout.panel, self.settings.results_timeout
                )));
            }
            sleep(self.settings.poll_interval).await;
        }
    }
}
