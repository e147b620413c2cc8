//! Heating strategy engine: one mutually exclusive cost/consumption/CO₂
//! model per fuel, selected by a first-match scan over a fixed list.

pub mod gas;
pub mod oil;
pub mod oilwood;
pub mod wood;

use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::StrategyResultBasics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    OilWoodMixed,
    Oil,
    Gas,
    Wood,
}

/// One line item the PDF renderer draws for a strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PdfRow {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
}

pub trait HeatingStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;
    fn matches(&self, lead: &LeadNormalized) -> bool;
    fn compute_basics(
        &self,
        lead: &LeadNormalized,
        lookups: &LookupContext,
    ) -> StrategyResultBasics;
    fn pdf_rows(&self) -> &'static [PdfRow];
}

/// Selection order is significant: the mixed predicate must run before Oil
/// and Wood, whose predicates exclude the other fuel's token.
pub const STRATEGY_ORDER: [&dyn HeatingStrategy; 4] =
    [&oilwood::OilWoodMixed, &oil::Oil, &gas::Gas, &wood::Wood];

/// Pick the strategy for a lead. Never fails: Oil is the fallback for
/// empty or unrecognized heating labels.
pub fn select_strategy(lead: &LeadNormalized) -> &'static dyn HeatingStrategy {
    for strategy in STRATEGY_ORDER {
        if strategy.matches(lead) {
            return strategy;
        }
    }
    &oil::Oil
}

pub(crate) fn heating_label_lower(lead: &LeadNormalized) -> String {
    lead.heating_label().to_lowercase()
}

pub(crate) fn has_oil_token(label: &str) -> bool {
    label.contains("öljy") || label.contains("oljy")
}

pub(crate) fn has_wood_token(label: &str) -> bool {
    label.contains("puu")
}

pub(crate) fn has_gas_token(label: &str) -> bool {
    label.contains("kaasu")
}

#[cfg(test)]
mod tests {
    use super::{select_strategy, StrategyKind};
    use crate::domain::lead::LeadNormalized;

    fn lead_with_label(label: &str) -> LeadNormalized {
        LeadNormalized { heating_type: Some(label.to_string()), ..LeadNormalized::default() }
    }

    #[test]
    fn mixed_label_takes_precedence_over_plain_fuels() {
        let selected = select_strategy(&lead_with_label("Puu ja öljy"));
        assert_eq!(selected.kind(), StrategyKind::OilWoodMixed);
    }

    #[test]
    fn single_fuel_labels_select_their_own_strategy() {
        assert_eq!(select_strategy(&lead_with_label("Öljylämmitys")).kind(), StrategyKind::Oil);
        assert_eq!(select_strategy(&lead_with_label("Kaasulämmitys")).kind(), StrategyKind::Gas);
        assert_eq!(select_strategy(&lead_with_label("Puulämmitys")).kind(), StrategyKind::Wood);
    }

    #[test]
    fn oil_is_the_fallback_for_unknown_or_missing_labels() {
        assert_eq!(select_strategy(&lead_with_label("Kaukolämpö")).kind(), StrategyKind::Oil);
        assert_eq!(select_strategy(&lead_with_label("")).kind(), StrategyKind::Oil);
        assert_eq!(select_strategy(&LeadNormalized::default()).kind(), StrategyKind::Oil);
    }

    #[test]
    fn selection_is_deterministic_and_exhaustive() {
        for label in ["öljy", "puu", "kaasu", "puu ja öljy", "sähkö", ""] {
            let first = select_strategy(&lead_with_label(label)).kind();
            let second = select_strategy(&lead_with_label(label)).kind();
            assert_eq!(first, second);
        }
    }
}
