use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::{Consumption, StrategyResultBasics};
use crate::numeric::round_to_i64;

use super::{
    has_oil_token, has_wood_token, heating_label_lower, HeatingStrategy, PdfRow, StrategyKind,
};

/// Assumed energy content of heating oil.
pub const OIL_KWH_PER_LITRE: f64 = 10.0;
pub const OIL_MAINTENANCE_EUR_YEAR: i64 = 200;

const ROWS: &[PdfRow] = &[
    PdfRow { key: "kulutus", label: "Öljyn kulutus", unit: "l/v" },
    PdfRow { key: "vuosikustannus", label: "Lämmityskustannus", unit: "€/v" },
    PdfRow { key: "co2", label: "CO₂-päästöt", unit: "kg/v" },
    PdfRow { key: "huolto", label: "Huoltokulut", unit: "€/v" },
];

#[derive(Clone, Copy, Debug, Default)]
pub struct Oil;

impl HeatingStrategy for Oil {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Oil
    }

    fn matches(&self, lead: &LeadNormalized) -> bool {
        let label = heating_label_lower(lead);
        has_oil_token(&label) && !has_wood_token(&label)
    }

    fn compute_basics(
        &self,
        lead: &LeadNormalized,
        lookups: &LookupContext,
    ) -> StrategyResultBasics {
        oil_basics(lead, lookups, OIL_MAINTENANCE_EUR_YEAR)
    }

    fn pdf_rows(&self) -> &'static [PdfRow] {
        ROWS
    }
}

/// Shared oil model: litres come from the reported consumption when
/// usable, otherwise from the annual energy need at 10 kWh per litre.
/// Cost prefers the reported figure, then litres times the oil price
/// (lead override before lookup). Rounded once, here.
pub(crate) fn oil_basics(
    lead: &LeadNormalized,
    lookups: &LookupContext,
    maintenance_eur_year: i64,
) -> StrategyResultBasics {
    let litres = lead
        .reported_consumption()
        .unwrap_or_else(|| lead.energy_need() / OIL_KWH_PER_LITRE);

    let oil_price = lead
        .oil_price_eur_litre
        .filter(|price| *price > 0.0)
        .unwrap_or(lookups.oil_eur_litre);

    let annual_cost = lead.reported_annual_cost().unwrap_or(litres * oil_price);

    StrategyResultBasics {
        annual_cost_eur: round_to_i64(annual_cost),
        consumption: Consumption::Litres(round_to_i64(litres)),
        co2_kg_year: round_to_i64(litres * lookups.oil_co2_kg_litre),
        maintenance_eur_year,
    }
}
