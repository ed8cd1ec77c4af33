use serde::{Deserialize, Serialize};

use super::quote::{QuoteField, QuoteFields};
use super::run::now_timestamp;
use crate::normalize::{self, NumericKind, SENTINEL};

/// One scraped quote for a fixed-rate period within a run
///
/// Amounts are parsed at scrape time; rate and term texts are stored verbatim and
/// only normalized on the read side (see [`NormalizedVariation`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    pub id: i64,
    pub run_id: i64,
    pub fixed_period_years: u32,
    pub monthly_installment: Option<f64>,
    pub interest_rate: String,
    pub loan_term: String,
    pub follow_up_rate: Option<String>,
    pub effective_rate: String,
    pub payout_amount: Option<f64>,
    pub capitalized_fees: Option<f64>,
    pub principal_amount: Option<f64>,
    pub total_repayable: Option<f64>,
    pub collateral: String,
    pub scraped_at: String,
}

impl Variation {
    /// Build a variation from one extracted panel; missing fields become null / "-"
    pub fn from_quote(fixed_period_years: u32, quote: &QuoteFields) -> Self {
        let text = |field: QuoteField| {
            quote
                .get(&field)
                .cloned()
                .unwrap_or_else(|| SENTINEL.to_string())
        };
        let amount = |field: QuoteField| {
            normalize::normalize(NumericKind::Currency, quote.get(&field).map(String::as_str))
        };

        Self {
            id: 0,
            run_id: 0,
            fixed_period_years,
            monthly_installment: amount(QuoteField::MonthlyInstallment),
            interest_rate: text(QuoteField::InterestRate),
            loan_term: text(QuoteField::LoanTerm),
            follow_up_rate: quote.get(&QuoteField::FollowUpCondition).cloned(),
            effective_rate: text(QuoteField::EffectiveRate),
            payout_amount: amount(QuoteField::PayoutAmount),
            capitalized_fees: amount(QuoteField::CapitalizedFees),
            principal_amount: amount(QuoteField::PrincipalAmount),
            total_repayable: amount(QuoteField::TotalRepayable),
            collateral: text(QuoteField::Collateral),
            scraped_at: now_timestamp(),
        }
    }

    /// Placeholder row for a cell where no offer could be read
    pub fn unavailable(fixed_period_years: u32) -> Self {
        Self::from_quote(fixed_period_years, &QuoteFields::new())
    }

    /// True when the panel yielded nothing usable for this cell
    pub fn is_unavailable(&self) -> bool {
        self.monthly_installment.is_none()
            && self.payout_amount.is_none()
            && self.capitalized_fees.is_none()
            && self.principal_amount.is_none()
            && self.total_repayable.is_none()
            && normalize::is_sentinel(&self.interest_rate)
            && normalize::is_sentinel(&self.effective_rate)
            && normalize::is_sentinel(&self.loan_term)
            && normalize::is_sentinel(&self.collateral)
    }
}

/// Numeric projection of a variation for charting and aggregation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedVariation {
    pub id: i64,
    pub run_id: i64,
    pub fixed_period_years: u32,
    pub monthly_installment: Option<f64>,
    pub interest_rate_pct: Option<f64>,
    pub effective_rate_pct: Option<f64>,
    pub follow_up_rate_pct: Option<f64>,
    pub loan_term_months: Option<i64>,
    pub payout_amount: Option<f64>,
    pub capitalized_fees: Option<f64>,
    pub principal_amount: Option<f64>,
    pub total_repayable: Option<f64>,
    pub scraped_at: String,
}

impl From<&Variation> for NormalizedVariation {
    fn from(v: &Variation) -> Self {
        // Amounts are already canonical; re-normalizing them is a no-op
        let renormalize = |value: Option<f64>| {
            value.and_then(|n| normalize::parse_currency(&n.to_string()))
        };

        Self {
            id: v.id,
            run_id: v.run_id,
            fixed_period_years: v.fixed_period_years,
            monthly_installment: renormalize(v.monthly_installment),
            interest_rate_pct: normalize::parse_percent(&v.interest_rate),
            effective_rate_pct: normalize::parse_percent(&v.effective_rate),
            follow_up_rate_pct: v.follow_up_rate.as_deref().and_then(normalize::parse_percent),
            loan_term_months: normalize::parse_duration_months(&v.loan_term),
            payout_amount: renormalize(v.payout_amount),
            capitalized_fees: renormalize(v.capitalized_fees),
            principal_amount: renormalize(v.principal_amount),
            total_repayable: renormalize(v.total_repayable),
            scraped_at: v.scraped_at.clone(),
        }
    }
}
