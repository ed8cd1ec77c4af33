// Ordered fallback strategies for applying one form field
// Each strategy knows how to find the control; applying and read-back verification
// are shared. StrategyChain tries them in order until one verifies.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::browser::{Locator, Page};
use crate::error::Result;

/// Value to put into a form control
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text or numeric input
    Text(String),
    /// Single choice; matched by option value or by visible label
    Choice { value: String, label: String },
    /// Range input
    Slider(u32),
}

impl FieldValue {
    pub fn text(value: impl ToString) -> Self {
        FieldValue::Text(value.to_string())
    }

    pub fn choice(value: &str, label: &str) -> Self {
        FieldValue::Choice {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// One form field and the anchors each strategy can use to find it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    /// Stable identifier: id or CSS selector
    pub primary: Option<Locator>,
    /// Text of the field's label
    pub label: Option<String>,
    /// Visible text near or on the control
    pub text: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            primary: None,
            label: None,
            text: None,
        }
    }

    pub fn primary(mut self, locator: Locator) -> Self {
        self.primary = Some(locator);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

/// Lowercase alphanumerics only, so "500.000" and "500000" compare equal
pub fn canonical(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

async fn apply_value(page: &mut dyn Page, locator: &Locator, value: &FieldValue) -> Result<bool> {
    match value {
        FieldValue::Text(text) => page.fill(locator, text).await,
        FieldValue::Choice { value, label } => page.select(locator, value, label).await,
        FieldValue::Slider(n) => page.set_slider(locator, *n).await,
    }
}

async fn verify_value(page: &mut dyn Page, locator: &Locator, value: &FieldValue) -> Result<bool> {
    match value {
        FieldValue::Text(text) => Ok(page
            .read_value(locator)
            .await?
            .map_or(false, |actual| canonical(&actual) == canonical(text))),
        FieldValue::Choice { value, label } => {
            let selection = match page.read_selection(locator).await? {
                Some(selection) => canonical(&selection),
                None => return Ok(false),
            };
            let wanted_value = canonical(value);
            let wanted_label = canonical(label);
            Ok((!wanted_value.is_empty() && selection.contains(&wanted_value))
                || (!wanted_label.is_empty() && selection.contains(&wanted_label)))
        }
        FieldValue::Slider(n) => Ok(page
            .read_value(locator)
            .await?
            .and_then(|actual| actual.trim().parse::<f64>().ok())
            .map_or(false, |actual| actual == f64::from(*n))),
    }
}

/// Result of applying a value with one strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Strategy has no anchor for this field
    NotApplicable,
    /// Control not found or refused the value
    NotApplied,
    /// Value written but read-back differs
    Unverified,
    Verified,
}

#[async_trait]
pub trait FieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Locator this strategy would use for the field
    fn locate(&self, field: &FieldSpec) -> Option<Locator>;

    /// Apply the value through this strategy's locator and read it back
    async fn try_apply(&self, page: &mut dyn Page, field: &FieldSpec, value: &FieldValue) -> Result<Attempt> {
        let locator = match self.locate(field) {
            Some(locator) => locator,
            None => return Ok(Attempt::NotApplicable),
        };

        if !apply_value(page, &locator, value).await? {
            return Ok(Attempt::NotApplied);
        }

        if verify_value(page, &locator, value).await? {
            Ok(Attempt::Verified)
        } else {
            Ok(Attempt::Unverified)
        }
    }
}

/// Stable id or CSS selector
pub struct ByPrimary;

#[async_trait]
impl FieldStrategy for ByPrimary {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn locate(&self, field: &FieldSpec) -> Option<Locator> {
        field.primary.clone()
    }
}

/// Control associated with the field's label text
pub struct ByLabel;

#[async_trait]
impl FieldStrategy for ByLabel {
    fn name(&self) -> &'static str {
        "label"
    }

    fn locate(&self, field: &FieldSpec) -> Option<Locator> {
        field.label.as_deref().map(Locator::label)
    }
}

/// Visible text on or around the control
pub struct ByText;

#[async_trait]
impl FieldStrategy for ByText {
    fn name(&self) -> &'static str {
        "text"
    }

    fn locate(&self, field: &FieldSpec) -> Option<Locator> {
        field.text.as_deref().map(Locator::text)
    }
}

/// What happened to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub field: String,
    /// Some strategy wrote the value
    pub applied: bool,
    /// Read-back matched
    pub verified: bool,
    /// Strategy that produced the final state
    pub strategy: Option<&'static str>,
}

/// Strategies tried in order until one verifies
pub struct StrategyChain {
    strategies: Vec<Box<dyn FieldStrategy>>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![Box::new(ByPrimary), Box::new(ByLabel), Box::new(ByText)])
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn FieldStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Apply a field; only session-fatal errors escape
    pub async fn apply(&self, page: &mut dyn Page, field: &FieldSpec, value: &FieldValue) -> Result<ApplyOutcome> {
        let mut outcome = ApplyOutcome {
            field: field.name.clone(),
            applied: false,
            verified: false,
            strategy: None,
        };

        for strategy in &self.strategies {
            let attempt = match strategy.try_apply(page, field, value).await {
                Ok(attempt) => attempt,
                Err(e) if e.is_session_fatal() => return Err(e),
                Err(e) => {
                    debug!(field = %field.name, strategy = strategy.name(), error = %e, "strategy failed");
                    Attempt::NotApplied
                }
            };

            match attempt {
                Attempt::Verified => {
                    outcome.applied = true;
                    outcome.verified = true;
                    outcome.strategy = Some(strategy.name());
                    debug!(field = %field.name, strategy = strategy.name(), "field applied");
                    return Ok(outcome);
                }
                Attempt::Unverified => {
                    outcome.applied = true;
                    outcome.strategy = Some(strategy.name());
                    debug!(field = %field.name, strategy = strategy.name(), "read-back mismatch, trying next strategy");
                }
                Attempt::NotApplied | Attempt::NotApplicable => {}
            }
        }

        warn!(
            field = %field.name,
            applied = outcome.applied,
            strategies = ?self.names(),
            "field could not be verified, continuing"
        );
        Ok(outcome)
    }
}
