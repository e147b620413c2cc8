use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::StrategyResultBasics;

use super::oil::oil_basics;
use super::{
    has_oil_token, has_wood_token, heating_label_lower, HeatingStrategy, PdfRow, StrategyKind,
};

pub const OILWOOD_MAINTENANCE_EUR_YEAR: i64 = 200;

const ROWS: &[PdfRow] = &[
    PdfRow { key: "kulutus", label: "Öljyn kulutus (öljy + puu)", unit: "l/v" },
    PdfRow { key: "vuosikustannus", label: "Lämmityskustannus", unit: "€/v" },
    PdfRow { key: "co2", label: "CO₂-päästöt", unit: "kg/v" },
    PdfRow { key: "huolto", label: "Huoltokulut", unit: "€/v" },
];

/// Numerically identical to the oil model. Kept as a distinct variant so
/// PDF labeling and future divergence never touch `Oil`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OilWoodMixed;

impl HeatingStrategy for OilWoodMixed {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OilWoodMixed
    }

    fn matches(&self, lead: &LeadNormalized) -> bool {
        let label = heating_label_lower(lead);
        has_oil_token(&label) && has_wood_token(&label)
    }

    fn compute_basics(
        &self,
        lead: &LeadNormalized,
        lookups: &LookupContext,
    ) -> StrategyResultBasics {
        oil_basics(lead, lookups, OILWOOD_MAINTENANCE_EUR_YEAR)
    }

    fn pdf_rows(&self) -> &'static [PdfRow] {
        ROWS
    }
}
