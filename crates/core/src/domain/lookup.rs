use serde::{Deserialize, Serialize};

/// Unit prices and CO₂ intensities supplied by external configuration.
/// Immutable for the duration of one calculation; the defaults make the
/// engine usable standalone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupContext {
    /// €/kWh for the heat-pump electricity draw.
    pub electricity_eur_kwh: f64,
    /// €/L for heating oil.
    pub oil_eur_litre: f64,
    /// €/MWh for natural gas. Carried for callers; the gas strategy trusts
    /// the reported annual cost instead of deriving from this.
    pub gas_eur_mwh: f64,
    /// kg CO₂ per litre of heating oil burned.
    pub oil_co2_kg_litre: f64,
    /// kg CO₂ per kWh of gas heating.
    pub gas_co2_kg_kwh: f64,
    /// kg CO₂ per kWh of grid electricity.
    pub electricity_co2_kg_kwh: f64,
}

impl Default for LookupContext {
    fn default() -> Self {
        Self {
            electricity_eur_kwh: 0.15,
            oil_eur_litre: 1.3,
            gas_eur_mwh: 65.0,
            oil_co2_kg_litre: 2.66,
            gas_co2_kg_kwh: 0.201,
            electricity_co2_kg_kwh: 0.181,
        }
    }
}
