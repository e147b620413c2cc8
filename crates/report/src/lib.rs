pub mod fields;
pub mod format;
pub mod formula;
pub mod pipeline;
pub mod shortcode;

pub use fields::{build_fields, ReportField};
pub use format::{format_date, format_value, DisplayType, FormatOptions};
pub use formula::{evaluate, parse, FormulaDefinition, FormulaError, FormulaTable};
pub use pipeline::{build_report, resolution_values, Report, ReportRequest, ReportTables};
pub use shortcode::{
    resolve, CountingReference, LookupTable, ReferenceSource, Resolution, ResolveContext,
    UuidReference, EXECUTION_FAILED_TEXT,
};
