use serde::{Deserialize, Serialize};

use crate::heating::StrategyKind;

/// Annual fuel consumption of the current system. Exactly one unit applies
/// per heating strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum Consumption {
    Litres(i64),
    CubicMetres(i64),
    StackedCubicMetres(i64),
}

impl Consumption {
    pub fn amount(&self) -> i64 {
        match self {
            Self::Litres(v) | Self::CubicMetres(v) | Self::StackedCubicMetres(v) => *v,
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Litres(_) => "l",
            Self::CubicMetres(_) => "m³",
            Self::StackedCubicMetres(_) => "p-m³",
        }
    }
}

/// Output of one heating strategy: created fresh per calculation, never
/// mutated, never cached across leads. All values are rounded here, once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyResultBasics {
    pub annual_cost_eur: i64,
    pub consumption: Consumption,
    pub co2_kg_year: i64,
    pub maintenance_eur_year: i64,
}

/// 1/5/10-year cost projection. The multi-year figures are exact integer
/// multiples of the already-rounded year-1 value; they are never
/// re-rounded per horizon, so the printed columns stay consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostProjection {
    pub year1: i64,
    pub year5: i64,
    pub year10: i64,
}

impl CostProjection {
    pub fn from_annual(year1: i64) -> Self {
        Self { year1, year5: year1 * 5, year10: year1 * 10 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSystem {
    pub cost: CostProjection,
    pub consumption: Consumption,
    pub co2_kg_year: i64,
    pub maintenance_eur_year: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSystem {
    pub cost: CostProjection,
    pub electricity_kwh_year: i64,
    pub co2_kg_year: i64,
}

/// The aggregate current-vs-heat-pump comparison handed to the report
/// layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub strategy: StrategyKind,
    pub current: CurrentSystem,
    pub new_system: NewSystem,
}
