pub mod lead;
pub mod lookup;
pub mod metrics;
