//! Display-type formatting for resolved report values.
//!
//! The business compares PDF output byte-for-byte, so these rules are
//! exact: EUR with 0 fraction digits, decimals with 1, space grouping and
//! comma decimal from the core formatter, dates as `d.M.yyyy`.

use chrono::NaiveDate;
use serde_json::Value;

use lampo_core::{format_number, parse_number};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayType {
    Currency,
    Number,
    Decimal,
    Percentage,
    Date,
}

impl DisplayType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "currency" => Some(Self::Currency),
            "number" => Some(Self::Number),
            "decimal" => Some(Self::Decimal),
            "percentage" => Some(Self::Percentage),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    fn default_decimals(&self) -> usize {
        match self {
            Self::Decimal => 1,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatOptions {
    pub decimals: Option<usize>,
    pub suffix: Option<String>,
}

/// Format a resolved value per display type. Total: numeric garbage
/// formats as `"0"`, unparseable dates pass through unchanged.
pub fn format_value(raw: &Value, display: DisplayType, options: &FormatOptions) -> String {
    let decimals = options.decimals.unwrap_or(display.default_decimals());

    let mut rendered = match display {
        DisplayType::Currency => format!("{} €", format_number(parse_number(raw), decimals)),
        DisplayType::Number | DisplayType::Decimal => format_number(parse_number(raw), decimals),
        DisplayType::Percentage => format!("{} %", format_number(parse_number(raw), decimals)),
        DisplayType::Date => format_date_value(raw),
    };

    if let Some(suffix) = &options.suffix {
        rendered.push(' ');
        rendered.push_str(suffix);
    }

    rendered
}

/// Render a date for the report: `7.8.2026`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.format("%-d"), date.format("%-m"), date.format("%Y"))
}

fn format_date_value(raw: &Value) -> String {
    let Some(text) = raw.as_str() else {
        return String::new();
    };

    // ISO dates and RFC 3339 timestamps; anything else passes through.
    let candidate = text.get(..10).unwrap_or(text);
    match NaiveDate::parse_from_str(candidate, "%Y-%m-%d") {
        Ok(date) => format_date(date),
        Err(_) => text.to_string(),
    }
}
