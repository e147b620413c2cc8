use serde::{Deserialize, Serialize};

/// Oil price assumed when the form does not carry an override (€/L).
pub const DEFAULT_OIL_PRICE_EUR_LITRE: f64 = 1.3;

/// Canonical lead record. Serde names are the canonical form keys; every
/// field is an explicit `Option`: after normalization a field is either a
/// concrete value or null, never missing with locale ambiguity attached.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadNormalized {
    #[serde(rename = "lammitysmuoto")]
    pub heating_type: Option<String>,
    #[serde(rename = "pinta_ala")]
    pub floor_area_m2: Option<f64>,
    #[serde(rename = "huonekorkeus")]
    pub ceiling_height_m: Option<f64>,
    #[serde(rename = "rakennusvuosi")]
    pub construction_year: Option<i32>,
    #[serde(rename = "asukasmaara")]
    pub residents: Option<i64>,
    #[serde(rename = "kokonaismenekki")]
    pub total_consumption: Option<f64>,
    #[serde(rename = "vuosikustannus")]
    pub annual_cost_eur: Option<f64>,
    #[serde(rename = "energiantarve")]
    pub energy_need_kwh: Option<f64>,
    #[serde(rename = "oljyn_hinta")]
    pub oil_price_eur_litre: Option<f64>,
}

impl LeadNormalized {
    pub fn heating_label(&self) -> &str {
        self.heating_type.as_deref().unwrap_or("")
    }

    /// Annual energy need in kWh, zero when unknown.
    pub fn energy_need(&self) -> f64 {
        self.energy_need_kwh.unwrap_or(0.0)
    }

    /// Reported consumption when it is a usable positive figure.
    pub fn reported_consumption(&self) -> Option<f64> {
        self.total_consumption.filter(|v| *v > 0.0)
    }

    /// Reported annual heating cost when it is a usable positive figure.
    pub fn reported_annual_cost(&self) -> Option<f64> {
        self.annual_cost_eur.filter(|v| *v > 0.0)
    }

    /// Plausibility check applied after coercion. Violations never abort
    /// normalization; they are logged and the record is used as-is.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        if self.floor_area_m2.is_some_and(|v| !(0.0..=100_000.0).contains(&v)) {
            violations.push("pinta_ala out of range".to_string());
        }
        if self.ceiling_height_m.is_some_and(|v| !(0.0..=10.0).contains(&v)) {
            violations.push("huonekorkeus out of range".to_string());
        }
        if self.construction_year.is_some_and(|v| !(1800..=2100).contains(&v)) {
            violations.push("rakennusvuosi out of range".to_string());
        }
        if self.residents.is_some_and(|v| v < 0) {
            violations.push("asukasmaara negative".to_string());
        }
        if self.total_consumption.is_some_and(|v| v < 0.0) {
            violations.push("kokonaismenekki negative".to_string());
        }
        if self.annual_cost_eur.is_some_and(|v| v < 0.0) {
            violations.push("vuosikustannus negative".to_string());
        }
        if self.energy_need_kwh.is_some_and(|v| v < 0.0) {
            violations.push("energiantarve negative".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
