//! Metrics aggregation: the selected strategy's current-system basics
//! combined with the fixed heat-pump model into a symmetric comparison.

use crate::domain::lead::LeadNormalized;
use crate::domain::lookup::LookupContext;
use crate::domain::metrics::{CostProjection, CurrentSystem, Metrics, NewSystem};
use crate::heating::{select_strategy, HeatingStrategy};
use crate::numeric::round_to_i64;

/// Coefficient of performance assumed for the new heat-pump system.
pub const HEAT_PUMP_COP: f64 = 3.8;

/// Pure function of the normalized lead and lookup context. Selects the
/// heating strategy internally.
pub fn compute_metrics(lead: &LeadNormalized, lookups: &LookupContext) -> Metrics {
    compute_metrics_with(select_strategy(lead), lead, lookups)
}

/// Aggregate with an explicitly chosen strategy. The new-system side is
/// independent of the strategy: electricity draw from the energy need at
/// the fixed COP, cost and CO₂ from the rounded draw.
pub fn compute_metrics_with(
    strategy: &dyn HeatingStrategy,
    lead: &LeadNormalized,
    lookups: &LookupContext,
) -> Metrics {
    let basics = strategy.compute_basics(lead, lookups);

    let electricity_kwh_year = round_to_i64(lead.energy_need() / HEAT_PUMP_COP);
    let new_annual_cost = round_to_i64(electricity_kwh_year as f64 * lookups.electricity_eur_kwh);
    let new_co2 = round_to_i64(electricity_kwh_year as f64 * lookups.electricity_co2_kg_kwh);

    Metrics {
        strategy: strategy.kind(),
        current: CurrentSystem {
            cost: CostProjection::from_annual(basics.annual_cost_eur),
            consumption: basics.consumption,
            co2_kg_year: basics.co2_kg_year,
            maintenance_eur_year: basics.maintenance_eur_year,
        },
        new_system: NewSystem {
            cost: CostProjection::from_annual(new_annual_cost),
            electricity_kwh_year,
            co2_kg_year: new_co2,
        },
    }
}
