//! Sweep configuration
//!
//! Built once at startup from the environment (optionally seeded by `.env`) and passed
//! by reference into every component.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SweepError};
use crate::models::RunParameters;
use crate::utils::env::{env_bool, env_list, env_parse, env_string};

pub const DEFAULT_ENTRY_URL: &str = "https://durchblicker.at/kreditrechner";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_TERMS: [u32; 5] = [35, 30, 25, 20, 15];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Firefox,
    Chrome,
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firefox" | "gecko" => Ok(BrowserKind::Firefox),
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            other => Err(format!("unknown browser '{}', expected firefox or chrome", other)),
        }
    }
}

/// WebDriver endpoint and browser capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub kind: BrowserKind,
    pub headless: bool,
    /// Page-load and script timeout handed to the driver
    pub command_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            kind: BrowserKind::Firefox,
            headless: true,
            command_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub screenshots_dir: PathBuf,
    pub capture_screenshots: bool,
    pub log_level: String,
    pub browser: BrowserConfig,
    pub entry_url: String,
    /// Loan terms in years, in the order given; the sweep normalizes them
    pub terms: Vec<u32>,
    pub settle_delay: Duration,
    pub settle_cap: Duration,
    pub run: RunParameters,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            db_path: data_dir.join("housing_loan.db"),
            screenshots_dir: data_dir.join("screenshots"),
            data_dir,
            capture_screenshots: true,
            log_level: "info".to_string(),
            browser: BrowserConfig::default(),
            entry_url: DEFAULT_ENTRY_URL.to_string(),
            terms: DEFAULT_TERMS.to_vec(),
            settle_delay: Duration::from_millis(2000),
            settle_cap: Duration::from_millis(10_000),
            run: RunParameters::default(),
        }
    }
}

impl SweepConfig {
    /// Read configuration from `LOAN_SWEEP_*` and `WEBDRIVER_URL` variables
    ///
    /// # Errors
    /// `InvalidConfig` when a variable is present but malformed, or when the result
    /// fails [`SweepConfig::validate`]
    pub fn from_env() -> Result<Self> {
        let mut config = SweepConfig::default();

        if let Some(dir) = env_string("LOAN_SWEEP_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.db_path = env_string("LOAN_SWEEP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.join("housing_loan.db"));
        config.screenshots_dir = env_string("LOAN_SWEEP_SCREENSHOTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.join("screenshots"));

        if let Some(enabled) = env_bool("LOAN_SWEEP_SCREENSHOTS")? {
            config.capture_screenshots = enabled;
        }
        if let Some(level) = env_string("LOAN_SWEEP_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(url) = env_string("WEBDRIVER_URL") {
            config.browser.webdriver_url = url;
        }
        if let Some(kind) = env_parse::<BrowserKind>("LOAN_SWEEP_BROWSER")? {
            config.browser.kind = kind;
        }
        if let Some(headless) = env_bool("LOAN_SWEEP_HEADLESS")? {
            config.browser.headless = headless;
        }

        if let Some(url) = env_string("LOAN_SWEEP_ENTRY_URL") {
            config.entry_url = url;
        }
        if let Some(terms) = env_list::<u32>("LOAN_SWEEP_TERMS")? {
            config.terms = terms;
        }
        if let Some(ms) = env_parse::<u64>("LOAN_SWEEP_SETTLE_MS")? {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("LOAN_SWEEP_SETTLE_CAP_MS")? {
            config.settle_cap = Duration::from_millis(ms);
        }

        let run = &mut config.run;
        if let Some(v) = env_parse("LOAN_SWEEP_PRINCIPAL")? {
            run.principal = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_PURCHASE_PRICE")? {
            run.purchase_price = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_PURCHASE_COSTS")? {
            run.purchase_costs = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_OWN_FUNDS")? {
            run.own_funds = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_AGE")? {
            run.applicant_age = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_NET_INCOME")? {
            run.net_monthly_income = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_LIVING_AREA")? {
            run.living_area_sqm = v;
        }
        if let Some(v) = env_parse("LOAN_SWEEP_INSTALLMENTS")? {
            run.existing_installments = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the sweep cannot act on
    pub fn validate(&self) -> Result<()> {
        if !self.terms.iter().any(|&t| t > 0) {
            return Err(SweepError::InvalidConfig(
                "no positive loan term configured".to_string(),
            ));
        }
        if self.settle_cap < self.settle_delay {
            return Err(SweepError::InvalidConfig(format!(
                "settle cap ({:?}) is shorter than the settle delay ({:?})",
                self.settle_cap, self.settle_delay
            )));
        }
        if self.entry_url.is_empty() {
            return Err(SweepError::InvalidConfig("entry URL is empty".to_string()));
        }
        let run = &self.run;
        for (name, value) in [
            ("principal", run.principal),
            ("purchase price", run.purchase_price),
            ("net monthly income", run.net_monthly_income),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SweepError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Screenshot directory, or `None` when screenshots are disabled
    pub fn screenshot_dir(&self) -> Option<PathBuf> {
        self.capture_screenshots.then(|| self.screenshots_dir.clone())
    }
}
