use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical field vocabulary of the results panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuoteField {
    MonthlyInstallment,
    InterestRate,
    LoanTerm,
    FollowUpCondition,
    EffectiveRate,
    PayoutAmount,
    CapitalizedFees,
    PrincipalAmount,
    TotalRepayable,
    Collateral,
}

impl QuoteField {
    pub const ALL: [QuoteField; 10] = [
        QuoteField::MonthlyInstallment,
        QuoteField::InterestRate,
        QuoteField::LoanTerm,
        QuoteField::FollowUpCondition,
        QuoteField::EffectiveRate,
        QuoteField::PayoutAmount,
        QuoteField::CapitalizedFees,
        QuoteField::PrincipalAmount,
        QuoteField::TotalRepayable,
        QuoteField::Collateral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteField::MonthlyInstallment => "monthly_installment",
            QuoteField::InterestRate => "interest_rate",
            QuoteField::LoanTerm => "loan_term",
            QuoteField::FollowUpCondition => "follow_up_condition",
            QuoteField::EffectiveRate => "effective_rate",
            QuoteField::PayoutAmount => "payout_amount",
            QuoteField::CapitalizedFees => "capitalized_fees",
            QuoteField::PrincipalAmount => "principal_amount",
            QuoteField::TotalRepayable => "total_repayable",
            QuoteField::Collateral => "collateral",
        }
    }
}

/// Raw display text per canonical field, as read from one results panel
pub type QuoteFields = BTreeMap<QuoteField, String>;
