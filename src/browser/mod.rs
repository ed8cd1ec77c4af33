// Browser collaborator for the loan calculator
// Defines the Page capability used by the navigator, sweep and extractor,
// plus the WebDriver-backed implementation and screenshot diagnostics

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

pub mod screenshot;
pub mod scripts;
pub mod webdriver;

#[cfg(test)]
pub mod fake;

pub use screenshot::Diagnostics;
pub use webdriver::WebDriverPage;

/// How an element on the page is found
///
/// Serialized as `{"kind": "...", "value": "..."}` so the injected scripts can resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Element id without the leading `#`
    Id(String),
    /// First element matching a CSS selector
    Css(String),
    /// Form control associated with a label whose text contains the given string
    Label(String),
    /// Smallest visible element whose text contains the given string
    Text(String),
    /// Visible button (or button-like element) whose text contains the given string
    Button(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn label(value: impl Into<String>) -> Self {
        Locator::Label(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Locator::Text(value.into())
    }

    pub fn button(value: impl Into<String>) -> Self {
        Locator::Button(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "#{}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::Label(v) => write!(f, "label={}", v),
            Locator::Text(v) => write!(f, "text={}", v),
            Locator::Button(v) => write!(f, "button={}", v),
        }
    }
}

/// Where the labeled key/value grid of the results panel lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    /// Container of the whole grid
    pub panel: String,
    /// One element per key/value row, relative to the panel
    pub row: String,
    /// Label cell, relative to the row (first match wins)
    pub label: String,
    /// Value cell, relative to the row
    pub value: String,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            panel: "[data-sentry-component=\"Finanzierungsdetails\"]".to_string(),
            row: "div.grid.grid-cols-subgrid".to_string(),
            label: "div".to_string(),
            value: "div.text-bluegrey span".to_string(),
        }
    }
}

/// A `(label, value)` pair read from a grid row, both trimmed
pub type GridRow = (String, String);

/// Capabilities the sweep needs from a live calculator page
///
/// Lookups that miss return `Ok(false)` / `Ok(None)`; `Err` is reserved for failures of the
/// session or the transport itself, which callers treat as fatal via
/// [`SweepError::is_session_fatal`](crate::error::SweepError::is_session_fatal).
#[async_trait]
pub trait Page: Send {
    /// Load a URL and wait for the document to finish loading
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Replace the value of a text or numeric input, firing input/change/blur
    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<bool>;

    /// Current value of an input
    async fn read_value(&mut self, locator: &Locator) -> Result<Option<String>>;

    /// Pick a single choice, matching either its option value or its visible label
    async fn select(&mut self, locator: &Locator, value: &str, label: &str) -> Result<bool>;

    /// Value and visible text of the current choice, space separated
    async fn read_selection(&mut self, locator: &Locator) -> Result<Option<String>>;

    async fn click(&mut self, locator: &Locator) -> Result<bool>;

    /// Set a range input and dispatch synthetic `change` and `input` events
    async fn set_slider(&mut self, locator: &Locator, value: u32) -> Result<bool>;

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool>;

    /// Trimmed, non-empty inner texts of all visible elements matching a CSS selector
    async fn read_texts(&mut self, css: &str) -> Result<Vec<String>>;

    /// Rows of the labeled grid, or `None` when the panel is not on the page
    async fn read_grid(&mut self, layout: &GridLayout) -> Result<Option<Vec<GridRow>>>;

    /// Full-page PNG bytes
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    /// End the browser session; safe to call more than once
    async fn close(&mut self) -> Result<()>;
}
