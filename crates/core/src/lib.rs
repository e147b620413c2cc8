pub mod audit;
pub mod config;
pub mod domain;
pub mod heating;
pub mod metrics;
pub mod normalize;
pub mod numeric;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::lead::{LeadNormalized, DEFAULT_OIL_PRICE_EUR_LITRE};
pub use domain::lookup::LookupContext;
pub use domain::metrics::{
    Consumption, CostProjection, CurrentSystem, Metrics, NewSystem, StrategyResultBasics,
};
pub use heating::{select_strategy, HeatingStrategy, PdfRow, StrategyKind, STRATEGY_ORDER};
pub use metrics::{compute_metrics, compute_metrics_with, HEAT_PUMP_COP};
pub use normalize::{normalize_lead, NormalizedLead};
pub use numeric::{format_number, parse_number, parse_number_str, round_to_i64};
