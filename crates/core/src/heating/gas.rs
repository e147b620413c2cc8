use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::{Consumption, StrategyResultBasics};
use crate::numeric::round_to_i64;

use super::{has_gas_token, heating_label_lower, HeatingStrategy, PdfRow, StrategyKind};

pub const GAS_MAINTENANCE_EUR_YEAR: i64 = 300;

const ROWS: &[PdfRow] = &[
    PdfRow { key: "kulutus", label: "Kaasun kulutus", unit: "m³/v" },
    PdfRow { key: "vuosikustannus", label: "Lämmityskustannus", unit: "€/v" },
    PdfRow { key: "co2", label: "CO₂-päästöt", unit: "kg/v" },
    PdfRow { key: "huolto", label: "Huoltokulut", unit: "€/v" },
];

#[derive(Clone, Copy, Debug, Default)]
pub struct Gas;

impl HeatingStrategy for Gas {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Gas
    }

    fn matches(&self, lead: &LeadNormalized) -> bool {
        has_gas_token(&heating_label_lower(lead))
    }

    /// Cost is taken from the reported yearly figure as-is; billing data
    /// already aggregates the m³ price, so `gas_eur_mwh` is not consulted.
    fn compute_basics(
        &self,
        lead: &LeadNormalized,
        lookups: &LookupContext,
    ) -> StrategyResultBasics {
        let cubic_metres = lead.reported_consumption().unwrap_or(0.0);
        let annual_cost = lead.reported_annual_cost().unwrap_or(0.0);

        StrategyResultBasics {
            annual_cost_eur: round_to_i64(annual_cost),
            consumption: Consumption::CubicMetres(round_to_i64(cubic_metres)),
            co2_kg_year: round_to_i64(lead.energy_need() * lookups.gas_co2_kg_kwh),
            maintenance_eur_year: GAS_MAINTENANCE_EUR_YEAR,
        }
    }

    fn pdf_rows(&self) -> &'static [PdfRow] {
        ROWS
    }
}

#[cfg(test)]
mod tests {
    use super::{Gas, GAS_MAINTENANCE_EUR_YEAR};
    use crate::domain::lead::LeadNormalized;
    use crate::domain::lookup::LookupContext;
    use crate::domain::metrics::Consumption;
    use crate::heating::HeatingStrategy;

    #[test]
    fn takes_consumption_and_cost_as_reported() {
        let lead = LeadNormalized {
            heating_type: Some("Kaasulämmitys".to_string()),
            total_consumption: Some(1850.6),
            annual_cost_eur: Some(1720.0),
            energy_need_kwh: Some(18_000.0),
            ..LeadNormalized::default()
        };

        let basics = Gas.compute_basics(&lead, &LookupContext::default());
        assert_eq!(basics.consumption, Consumption::CubicMetres(1851));
        assert_eq!(basics.annual_cost_eur, 1720);
        // 18 000 kWh * 0.201 kg/kWh
        assert_eq!(basics.co2_kg_year, 3618);
        assert_eq!(basics.maintenance_eur_year, GAS_MAINTENANCE_EUR_YEAR);
    }

    #[test]
    fn missing_reported_figures_degrade_to_zero() {
        let lead = LeadNormalized {
            heating_type: Some("Kaasu".to_string()),
            ..LeadNormalized::default()
        };

        let basics = Gas.compute_basics(&lead, &LookupContext::default());
        assert_eq!(basics.consumption, Consumption::CubicMetres(0));
        assert_eq!(basics.annual_cost_eur, 0);
        assert_eq!(basics.co2_kg_year, 0);
    }
}
