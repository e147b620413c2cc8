use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::{Consumption, StrategyResultBasics};
use crate::numeric::round_to_i64;

use super::{
    has_oil_token, has_wood_token, heating_label_lower, HeatingStrategy, PdfRow, StrategyKind,
};

pub const WOOD_MAINTENANCE_EUR_YEAR: i64 = 200;

const ROWS: &[PdfRow] = &[
    PdfRow { key: "kulutus", label: "Puun kulutus", unit: "p-m³/v" },
    PdfRow { key: "vuosikustannus", label: "Lämmityskustannus", unit: "€/v" },
    PdfRow { key: "co2", label: "CO₂-päästöt", unit: "kg/v" },
    PdfRow { key: "huolto", label: "Huoltokulut", unit: "€/v" },
];

#[derive(Clone, Copy, Debug, Default)]
pub struct Wood;

impl HeatingStrategy for Wood {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Wood
    }

    fn matches(&self, lead: &LeadNormalized) -> bool {
        let label = heating_label_lower(lead);
        has_wood_token(&label) && !has_oil_token(&label)
    }

    /// Biomass is treated as carbon-neutral in this model, so CO₂ is zero.
    fn compute_basics(
        &self,
        lead: &LeadNormalized,
        _lookups: &LookupContext,
    ) -> StrategyResultBasics {
        let stacked = lead.reported_consumption().unwrap_or(0.0);
        let annual_cost = lead.reported_annual_cost().unwrap_or(0.0);

        StrategyResultBasics {
            annual_cost_eur: round_to_i64(annual_cost),
            consumption: Consumption::StackedCubicMetres(round_to_i64(stacked)),
            co2_kg_year: 0,
            maintenance_eur_year: WOOD_MAINTENANCE_EUR_YEAR,
        }
    }

    fn pdf_rows(&self) -> &'static [PdfRow] {
        ROWS
    }
}

#[cfg(test)]
mod tests {
    use super::Wood;
    use crate::domain::lead::LeadNormalized;
    use crate::domain::lookup::LookupContext;
    use crate::domain::metrics::Consumption;
    use crate::heating::HeatingStrategy;

    #[test]
    fn wood_reports_zero_co2() {
        let lead = LeadNormalized {
            heating_type: Some("Puulämmitys".to_string()),
            total_consumption: Some(14.0),
            annual_cost_eur: Some(900.0),
            energy_need_kwh: Some(20_000.0),
            ..LeadNormalized::default()
        };

        let basics = Wood.compute_basics(&lead, &LookupContext::default());
        assert_eq!(basics.consumption, Consumption::StackedCubicMetres(14));
        assert_eq!(basics.annual_cost_eur, 900);
        assert_eq!(basics.co2_kg_year, 0);
    }

    #[test]
    fn does_not_match_mixed_labels() {
        let lead = LeadNormalized {
            heating_type: Some("Puu ja öljy".to_string()),
            ..LeadNormalized::default()
        };
        assert!(!Wood.matches(&lead));
    }
}
