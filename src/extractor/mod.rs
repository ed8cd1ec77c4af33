// Quote extraction from the results panel
// Reads the labeled key/value grid and maps display labels onto QuoteField

use tracing::{debug, warn};

use crate::browser::{GridLayout, GridRow, Page};
use crate::error::Result;
use crate::models::{QuoteField, QuoteFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Exact,
    Prefix,
}

/// Display label (normalized) → canonical field
///
/// Order matters for prefix entries: the first matching row of the table wins.
const SYNONYMS: &[(&str, QuoteField, Match)] = &[
    ("rate", QuoteField::MonthlyInstallment, Match::Exact),
    ("monatliche rate", QuoteField::MonthlyInstallment, Match::Exact),
    ("effektiver zinssatz", QuoteField::EffectiveRate, Match::Prefix),
    ("effektivzinssatz", QuoteField::EffectiveRate, Match::Prefix),
    ("zinssatz", QuoteField::InterestRate, Match::Exact),
    ("sollzinssatz", QuoteField::InterestRate, Match::Prefix),
    ("laufzeit", QuoteField::LoanTerm, Match::Exact),
    ("kreditlaufzeit", QuoteField::LoanTerm, Match::Exact),
    ("anschlusskondition", QuoteField::FollowUpCondition, Match::Prefix),
    ("auszahlungsbetrag", QuoteField::PayoutAmount, Match::Exact),
    ("einberechnete kosten", QuoteField::CapitalizedFees, Match::Prefix),
    ("kreditbetrag", QuoteField::PrincipalAmount, Match::Exact),
    ("zu zahlender gesamtbetrag", QuoteField::TotalRepayable, Match::Exact),
    ("gesamtbetrag", QuoteField::TotalRepayable, Match::Exact),
    ("besicherung", QuoteField::Collateral, Match::Exact),
];

/// Lowercase, collapse whitespace (including NBSP), drop trailing `:` and footnote `*`
pub fn normalize_label(label: &str) -> String {
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .to_lowercase()
}

/// Canonical field for a display label, `None` for labels we don't track
pub fn canonical_field(label: &str) -> Option<QuoteField> {
    let label = normalize_label(label);
    SYNONYMS
        .iter()
        .find(|(pattern, _, kind)| match kind {
            Match::Exact => label == *pattern,
            Match::Prefix => label.starts_with(pattern),
        })
        .map(|(_, field, _)| *field)
}

/// Fold grid rows into a field map; first occurrence of a field wins, empty values are skipped
pub fn fields_from_rows(rows: &[GridRow]) -> QuoteFields {
    let mut fields = QuoteFields::new();
    for (label, value) in rows {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match canonical_field(label) {
            Some(field) => {
                fields.entry(field).or_insert_with(|| value.to_string());
            }
            None => debug!(label = %label, "ignoring unknown result label"),
        }
    }
    fields
}

/// Reads quote fields from the results panel of a page
#[derive(Debug, Clone, Default)]
pub struct QuoteExtractor {
    layout: GridLayout,
}

impl QuoteExtractor {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Extract the current quote
    ///
    /// An absent panel yields an empty map. Element-level failures are logged and also
    /// yield an empty map; only session-fatal errors are returned.
    pub async fn extract<P: Page + ?Sized>(&self, page: &mut P) -> Result<QuoteFields> {
        let rows = match page.read_grid(&self.layout).await {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                debug!(panel = %self.layout.panel, "results panel not present");
                return Ok(QuoteFields::new());
            }
            Err(e) if e.is_session_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, category = e.category(), "results panel read failed");
                return Ok(QuoteFields::new());
            }
        };

        let fields = fields_from_rows(&rows);
        debug!(rows = rows.len(), fields = fields.len(), "extracted quote");
        Ok(fields)
    }
}
