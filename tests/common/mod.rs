//! Common helpers for integration tests
//!
//! `FakeCalculator` stands in for a live browser: every form control exists, every
//! marker is visible, and the results grid is computed from the two slider positions
//! so each (term, fixed period) cell yields a distinct quote.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use loan_sweep::browser::{GridLayout, GridRow};
use loan_sweep::{Locator, Page, Result, RunStore, SweepConfig, SweepError};

pub const TERM_SLIDER: &str = "#laufzeitslider";
pub const FIXED_SLIDER: &str = "#fixverzinsungslider";

#[derive(Debug, Default)]
pub struct FakeCalculator {
    /// Last written value per locator (Display form)
    pub values: HashMap<String, String>,
    pub visited: Vec<String>,
    pub clicks: Vec<String>,
    /// Every slider move as (locator, value)
    pub slider_moves: Vec<(String, u32)>,
    /// Cells whose panel renders without any rows
    pub blank_cells: Vec<(u32, u32)>,
    /// Moving the term slider to this value kills the session
    pub lose_session_on_term: Option<u32>,
    pub close_calls: usize,
    closed: bool,
}

impl FakeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blank_cell(mut self, term: u32, fixed_period: u32) -> Self {
        self.blank_cells.push((term, fixed_period));
        self
    }

    pub fn slider(&self, key: &str) -> Option<u32> {
        self.values.get(key).and_then(|v| v.parse().ok())
    }

    /// Installment the fake quotes for a cell
    pub fn installment(term: u32, fixed_period: u32) -> f64 {
        f64::from(1000 + term * 10 + fixed_period)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(SweepError::SessionLost("session closed".to_string()));
        }
        Ok(())
    }

    fn rows(&self) -> Vec<GridRow> {
        let term = self.slider(TERM_SLIDER).unwrap_or(35);
        let fixed = self.slider(FIXED_SLIDER).unwrap_or(0);
        if self.blank_cells.contains(&(term, fixed)) {
            return Vec::new();
        }

        let mut rows = vec![
            ("Rate".to_string(), format!("€ {}", Self::installment(term, fixed))),
            ("Zinssatz".to_string(), format!("3,{:03} % p.a.", fixed * 10)),
            ("Laufzeit".to_string(), format!("{} Jahre", term)),
            ("Effektiver Zinssatz".to_string(), "3,500 % p.a.".to_string()),
            ("Kreditbetrag".to_string(), "406.500,00 €".to_string()),
            ("Besicherung".to_string(), "Pfandrecht".to_string()),
        ];
        if fixed > 0 {
            rows.push((
                "Anschlusskondition".to_string(),
                format!("3,020 % p.a. variabel ({} Jahre)", term - fixed),
            ));
        }
        rows
    }
}

#[async_trait]
impl Page for FakeCalculator {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.check_open()?;
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<bool> {
        self.check_open()?;
        self.values.insert(locator.to_string(), value.to_string());
        Ok(true)
    }

    async fn read_value(&mut self, locator: &Locator) -> Result<Option<String>> {
        self.check_open()?;
        Ok(self.values.get(&locator.to_string()).cloned())
    }

    async fn select(&mut self, locator: &Locator, value: &str, label: &str) -> Result<bool> {
        self.check_open()?;
        self.values
            .insert(locator.to_string(), format!("{} {}", value, label));
        Ok(true)
    }

    async fn read_selection(&mut self, locator: &Locator) -> Result<Option<String>> {
        self.check_open()?;
        Ok(self.values.get(&locator.to_string()).cloned())
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool> {
        self.check_open()?;
        self.clicks.push(locator.to_string());
        Ok(true)
    }

    async fn set_slider(&mut self, locator: &Locator, value: u32) -> Result<bool> {
        self.check_open()?;
        let key = locator.to_string();
        if key == TERM_SLIDER && self.lose_session_on_term == Some(value) {
            self.closed = true;
            return Err(SweepError::SessionLost("browser crashed".to_string()));
        }
        self.slider_moves.push((key.clone(), value));
        self.values.insert(key, value.to_string());
        Ok(true)
    }

    async fn is_visible(&mut self, _locator: &Locator) -> Result<bool> {
        self.check_open()?;
        Ok(true)
    }

    async fn read_texts(&mut self, _css: &str) -> Result<Vec<String>> {
        self.check_open()?;
        Ok(Vec::new())
    }

    async fn read_grid(&mut self, _layout: &GridLayout) -> Result<Option<Vec<GridRow>>> {
        self.check_open()?;
        Ok(Some(self.rows()))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.check_open()?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        self.closed = true;
        Ok(())
    }
}

/// Isolated data directory with an opened store
pub struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    pub store: RunStore,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RunStore::open(temp_dir.path().join("housing_loan.db")).expect("Failed to open store");
        Self { temp_dir, store }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn db_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Config pointing at this environment with millisecond settle timings
    pub fn config(&self, terms: &[u32]) -> SweepConfig {
        let data_dir = self.data_dir();
        SweepConfig {
            db_path: self.db_path(),
            screenshots_dir: data_dir.join("screenshots"),
            data_dir,
            capture_screenshots: false,
            entry_url: "https://calculator.test/kreditrechner".to_string(),
            terms: terms.to_vec(),
            settle_delay: Duration::from_millis(1),
            settle_cap: Duration::from_millis(20),
            ..Default::default()
        }
    }
}
