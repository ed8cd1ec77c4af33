use serde::{Deserialize, Serialize};

/// Fixed inputs shared by every run of one sweep session
///
/// Everything except the term is constant across a session; the sweep stamps the
/// term per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunParameters {
    pub principal: f64,
    pub purchase_price: f64,
    pub purchase_costs: f64,
    pub own_funds: f64,
    pub applicant_age: u32,
    pub net_monthly_income: f64,
    pub living_area_sqm: u32,
    pub existing_installments: f64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            principal: 500_000.0,
            purchase_price: 500_000.0,
            purchase_costs: 50_000.0,
            own_funds: 150_000.0,
            applicant_age: 45,
            net_monthly_income: 8_500.0,
            living_area_sqm: 100,
            existing_installments: 300.0,
        }
    }
}

/// One sweep execution for a single loan term
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: i64,
    pub created_at: String,
    pub principal: f64,
    pub term_years: u32,
    pub purchase_price: f64,
    pub purchase_costs: f64,
    pub own_funds: f64,
    pub applicant_age: u32,
    pub net_monthly_income: f64,
    pub living_area_sqm: u32,
    pub existing_installments: f64,
    pub notes: String,
}

impl Run {
    pub fn new(params: &RunParameters, term_years: u32) -> Self {
        Self {
            id: 0,
            created_at: now_timestamp(),
            principal: params.principal,
            term_years,
            purchase_price: params.purchase_price,
            purchase_costs: params.purchase_costs,
            own_funds: params.own_funds,
            applicant_age: params.applicant_age,
            net_monthly_income: params.net_monthly_income,
            living_area_sqm: params.living_area_sqm,
            existing_installments: params.existing_installments,
            notes: format!("Multi-term sweep (results sliders) - {} years", term_years),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn parameters(&self) -> RunParameters {
        RunParameters {
            principal: self.principal,
            purchase_price: self.purchase_price,
            purchase_costs: self.purchase_costs,
            own_funds: self.own_funds,
            applicant_age: self.applicant_age,
            net_monthly_income: self.net_monthly_income,
            living_area_sqm: self.living_area_sqm,
            existing_installments: self.existing_installments,
        }
    }
}

/// UTC timestamp with microsecond precision; lexicographic order equals time order
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
