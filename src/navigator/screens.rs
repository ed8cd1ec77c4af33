// Wizard screen definitions for the housing-loan calculator
// Ids and option values are the calculator's own; labels are the German UI texts

use crate::browser::Locator;
use crate::models::RunParameters;

use super::strategy::{FieldSpec, FieldValue};

/// One wizard screen: what to wait for, what to fill, how to leave it
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSpec {
    pub name: &'static str,
    /// Any one of these texts visible means the screen is ready
    pub markers: Vec<&'static str>,
    pub fields: Vec<(FieldSpec, FieldValue)>,
    /// Button texts tried in order; empty for the final screen
    pub advance: Vec<&'static str>,
    /// Scan for validation messages after advancing
    pub check_validation: bool,
}

/// Whole numbers without decimals, everything else as-is
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

fn input(name: &str, primary: Locator, label: &str, value: impl ToString) -> (FieldSpec, FieldValue) {
    (
        FieldSpec::new(name).primary(primary).label(label).text(label),
        FieldValue::text(value),
    )
}

fn choice(name: &str, primary: Locator, label: &str, value: &str, option: &str) -> (FieldSpec, FieldValue) {
    (
        FieldSpec::new(name).primary(primary).label(label).text(label),
        FieldValue::choice(value, option),
    )
}

pub fn loan_parameters(params: &RunParameters, initial_term: u32) -> ScreenSpec {
    ScreenSpec {
        name: "screen1",
        markers: vec!["Kreditbetrag"],
        fields: vec![
            input(
                "principal",
                Locator::css("#kreditbetrag, input[id*='kreditbetrag']"),
                "Kreditbetrag",
                format_amount(params.principal),
            ),
            (
                FieldSpec::new("initial_term")
                    .primary(Locator::id("laufzeit"))
                    .label("Laufzeit")
                    .text("Laufzeit"),
                FieldValue::Slider(initial_term),
            ),
        ],
        advance: vec!["Jetzt berechnen", "Berechnen"],
        check_validation: false,
    }
}

pub fn project_details(params: &RunParameters) -> ScreenSpec {
    ScreenSpec {
        name: "screen2",
        markers: vec!["Finanzierungsvorhaben", "Art der Immobilie"],
        fields: vec![
            choice("purpose", Locator::id("select_immokredit_projekt_vorhaben"), "Finanzierungsvorhaben", "kauf", "Kauf"),
            choice("search_phase", Locator::id("select_immokredit_projekt_suchphaseKauf"), "Suchphase", "recherche", "Recherche"),
            choice("property_type", Locator::id("select_immokredit_projekt_immobilie"), "Art der Immobilie", "wohnung", "Eigentumswohnung"),
            choice("construction_state", Locator::id("select_immokredit_projekt_inBau"), "Immobilie in Bau", "fertig", "bestehende Immobilie"),
            choice("location", Locator::id("select_immokredit_projekt_lage"), "Lage der Immobilie", "wien", "Wien"),
            choice("usage", Locator::id("select_immokredit_projekt_nutzung"), "Nutzung", "eigen", "Eigennutzung"),
            input(
                "purchase_price",
                Locator::id("input_immokredit_projektkosten_kaufpreis"),
                "Kaufpreis",
                format_amount(params.purchase_price),
            ),
            input(
                "purchase_costs",
                Locator::id("input_immokredit_projektkosten_kaufnebenkosten"),
                "Kaufnebenkosten",
                format_amount(params.purchase_costs),
            ),
            input(
                "own_funds",
                Locator::id("input_immokredit_projektkosten_eigenmittel"),
                "Eigenmittel",
                format_amount(params.own_funds),
            ),
        ],
        advance: vec!["Weiter", "Nächster Schritt", "Fortfahren"],
        check_validation: false,
    }
}

pub fn household(params: &RunParameters) -> ScreenSpec {
    ScreenSpec {
        name: "screen3",
        markers: vec!["Ihr Alter"],
        fields: vec![
            input(
                "applicant_age",
                Locator::css("input[id*='haushalt'][id*='alter'], #input_immokredit_haushalt_alter"),
                "Ihr Alter",
                params.applicant_age,
            ),
            choice(
                "second_applicant",
                Locator::css("div.row[data-storage*='haushalt'][data-storage*='zweite']"),
                "Finanzierung mit zweiter Person",
                "false",
                "Nein",
            ),
            choice(
                "children",
                Locator::css("select[id*='haushalt'][id*='kinder'], #select_immokredit_haushalt_kinder"),
                "Anzahl unterhaltspflichtiger Kinder",
                "keine",
                "Keine",
            ),
            choice(
                "employment",
                Locator::id("select_immokredit_haushalt_berufsituation"),
                "Ihre berufliche Situation",
                "erwerb",
                "Angestellt",
            ),
            input(
                "net_monthly_income",
                Locator::id("input_immokredit_haushalt_einkommen"),
                "Ihr Netto-Einkommen",
                format_amount(params.net_monthly_income),
            ),
            input(
                "living_area",
                Locator::id("input_immokredit_haushalt_nutzflaeche"),
                "Wohnnutzfläche",
                params.living_area_sqm,
            ),
            input(
                "existing_installments",
                Locator::css("input[id*='leasing'], input[id*='kredit'][id*='rate']"),
                "Kredit-/Leasingraten",
                format_amount(params.existing_installments),
            ),
            choice(
                "vehicles",
                Locator::css("select[id*='kfz'], #select_immokredit_haushalt_kfz"),
                "Anzahl der KFZ",
                "none",
                "keine",
            ),
        ],
        advance: vec!["Berechnen", "Jetzt berechnen", "Angebote berechnen"],
        check_validation: true,
    }
}

pub fn results() -> ScreenSpec {
    ScreenSpec {
        name: "screen4",
        markers: vec!["Kreditangebote", "Ergebnisse", "Angebote"],
        fields: Vec::new(),
        advance: Vec::new(),
        check_validation: false,
    }
}

/// The four wizard screens in order
pub fn default_screens(params: &RunParameters, initial_term: u32) -> Vec<ScreenSpec> {
    vec![
        loan_parameters(params, initial_term),
        project_details(params),
        household(params),
        results(),
    ]
}
