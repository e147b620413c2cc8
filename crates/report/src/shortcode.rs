//! Shortcode resolution: template text with embedded tokens to the literal
//! strings placed into emails, previews, and PDF fields.
//!
//! Tokens are resolved left to right, non-overlapping, in one linear scan.
//! Resolution never fails: an unresolvable token degrades and the first
//! problem is surfaced on the `Resolution`, not thrown.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::format::{format_date, format_value, DisplayType, FormatOptions};
use crate::formula::{evaluate, FormulaTable};

/// Substituted for a formula that parses or evaluates with an error.
pub const EXECUTION_FAILED_TEXT: &str = "Formula execution failed";

/// Named scalar constants from the external store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    #[serde(flatten)]
    entries: BTreeMap<String, Value>,
}

impl LookupTable {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }
}

/// Source of freshly minted report references for `AUTO_GENERATE`.
pub trait ReferenceSource: Send + Sync {
    fn next_reference(&self) -> String;
}

/// Default source: an 8-character uppercase reference derived from a UUID.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidReference;

impl ReferenceSource for UuidReference {
    fn next_reference(&self) -> String {
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    }
}

/// Deterministic counter source for tests and batch runs.
#[derive(Debug, Default)]
pub struct CountingReference {
    counter: AtomicU64,
}

impl ReferenceSource for CountingReference {
    fn next_reference(&self) -> String {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("LMP-{next:06}")
    }
}

/// Everything one resolution pass may read. Treated as an immutable
/// snapshot for the duration of the call.
pub struct ResolveContext<'a> {
    pub values: &'a Map<String, Value>,
    pub formulas: &'a FormulaTable,
    pub lookups: &'a LookupTable,
    pub today: NaiveDate,
    pub reference: &'a dyn ReferenceSource,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub text: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Resolve every token in `template`. Always returns a string; the first
/// formula problem flips `success` and is reported in `error` while
/// resolution continues.
pub fn resolve(template: &str, ctx: &ResolveContext<'_>) -> Resolution {
    let mut out = String::with_capacity(template.len());
    let mut success = true;
    let mut error: Option<String> = None;
    let fail = |success: &mut bool, error: &mut Option<String>, message: String| {
        *success = false;
        if error.is_none() {
            *error = Some(message);
        }
    };

    let mut rest = template;
    while let Some(start) = rest.find(['{', '[']) {
        out.push_str(&replace_sentinels(&rest[..start], ctx));

        let open = rest.as_bytes()[start];
        let close_char = if open == b'{' { '}' } else { ']' };
        let Some(offset) = rest[start + 1..].find(close_char) else {
            // Unterminated token: keep the tail verbatim.
            out.push_str(&replace_sentinels(&rest[start..], ctx));
            rest = "";
            break;
        };

        let inner = &rest[start + 1..start + 1 + offset];
        if open == b'{' {
            out.push_str(&field_text(inner, ctx));
        } else if let Some(name) = inner.strip_prefix("calc:") {
            match ctx.formulas.get(name) {
                Some(definition) => match evaluate(definition, ctx.values) {
                    Ok(value) => out.push_str(&render_f64(value)),
                    Err(err) => {
                        out.push_str(EXECUTION_FAILED_TEXT);
                        fail(&mut success, &mut error, format!("formula `{name}`: {err}"));
                    }
                },
                None => {
                    out.push('[');
                    out.push_str(inner);
                    out.push(']');
                    fail(&mut success, &mut error, format!("unknown formula `{name}`"));
                }
            }
        } else if let Some(name) = inner.strip_prefix("lookup:") {
            if let Some(value) = ctx.lookups.get(name) {
                out.push_str(&display_value(value));
            }
            // Missing lookup keys resolve to nothing.
        } else if let Some(body) = inner.strip_prefix("format:") {
            match resolve_format(body, ctx) {
                Ok(text) => out.push_str(&text),
                Err(FormatTokenError::Formula(message)) => {
                    out.push_str(EXECUTION_FAILED_TEXT);
                    fail(&mut success, &mut error, message);
                }
                Err(FormatTokenError::Malformed) => {
                    out.push('[');
                    out.push_str(inner);
                    out.push(']');
                }
            }
        } else {
            // Plain bracketed text is not a shortcode; keep it.
            out.push('[');
            out.push_str(inner);
            out.push(']');
        }

        rest = &rest[start + 1 + offset + 1..];
    }
    out.push_str(&replace_sentinels(rest, ctx));

    Resolution { text: out, success, error }
}

enum FormatTokenError {
    Malformed,
    Formula(String),
}

/// `[format:source:type[:decimals=N][,suffix=S]]`: source is a context
/// field or a formula name; formulas win when both exist.
fn resolve_format(body: &str, ctx: &ResolveContext<'_>) -> Result<String, FormatTokenError> {
    let mut parts = body.splitn(3, ':');
    let source = parts.next().unwrap_or_default().trim();
    let type_token = parts.next().ok_or(FormatTokenError::Malformed)?.trim();
    let display = DisplayType::from_token(type_token).ok_or(FormatTokenError::Malformed)?;

    let mut options = FormatOptions::default();
    if let Some(raw_options) = parts.next() {
        for option in raw_options.split([':', ',']) {
            let option = option.trim();
            if option.is_empty() {
                continue;
            }
            match option.split_once('=') {
                Some(("decimals", value)) => {
                    options.decimals = value.trim().parse::<usize>().ok();
                }
                Some(("suffix", value)) => {
                    options.suffix = Some(value.trim().to_string());
                }
                _ => {}
            }
        }
    }

    let value = match ctx.formulas.get(source) {
        Some(definition) => match evaluate(definition, ctx.values) {
            Ok(result) => Value::from(result),
            Err(err) => {
                return Err(FormatTokenError::Formula(format!("formula `{source}`: {err}")))
            }
        },
        None => ctx.values.get(source).cloned().unwrap_or(Value::Null),
    };

    Ok(format_value(&value, display, &options))
}

fn field_text(name: &str, ctx: &ResolveContext<'_>) -> String {
    match ctx.values.get(name.trim()) {
        Some(value) => display_value(value),
        None => String::new(),
    }
}

/// Sentinel tokens are replaced only in literal template text, never in
/// resolved values.
fn replace_sentinels(text: &str, ctx: &ResolveContext<'_>) -> String {
    let mut replaced = if text.contains("CURRENT_DATE") {
        text.replace("CURRENT_DATE", &format_date(ctx.today))
    } else {
        text.to_string()
    };
    if replaced.contains("AUTO_GENERATE") {
        replaced = replaced.replace("AUTO_GENERATE", &ctx.reference.next_reference());
    }
    replaced
}

/// Raw rendering for `{field}` substitution: numbers without trailing
/// zeros, nulls as nothing, structures as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => integer.to_string(),
            None => render_f64(number.as_f64().unwrap_or(0.0)),
        },
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn render_f64(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 9e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::{json, Map, Value};

    use crate::formula::{FormulaDefinition, FormulaTable};

    use super::{
        resolve, CountingReference, LookupTable, ReferenceSource, ResolveContext,
        EXECUTION_FAILED_TEXT,
    };

    struct Fixture {
        values: Map<String, Value>,
        formulas: FormulaTable,
        lookups: LookupTable,
        reference: CountingReference,
    }

    impl Fixture {
        fn new() -> Self {
            let mut values = Map::new();
            values.insert("etunimi".to_string(), json!("Aino"));
            values.insert("vuosikustannus".to_string(), json!(3200));
            values.insert("kustannus_uusi_1v".to_string(), json!(947));

            let mut formulas = FormulaTable::default();
            formulas.insert(
                "saasto-1v",
                FormulaDefinition {
                    expression: "vuosikustannus - kustannus_uusi_1v".to_string(),
                    variables: Vec::new(),
                },
            );
            formulas.insert(
                "rikki",
                FormulaDefinition { expression: "tuntematon * 2".to_string(), variables: Vec::new() },
            );

            let mut lookups = LookupTable::default();
            lookups.insert("sahkon_hinta", json!(0.15));

            Self { values, formulas, lookups, reference: CountingReference::default() }
        }

        fn ctx(&self) -> ResolveContext<'_> {
            ResolveContext {
                values: &self.values,
                formulas: &self.formulas,
                lookups: &self.lookups,
                today: NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid date"),
                reference: &self.reference,
            }
        }
    }

    #[test]
    fn literal_templates_resolve_to_themselves() {
        let fixture = Fixture::new();
        let resolution = resolve("Hei, tässä laskelmasi.", &fixture.ctx());
        assert_eq!(resolution.text, "Hei, tässä laskelmasi.");
        assert!(resolution.success);
        assert!(resolution.error.is_none());
    }

    #[test]
    fn fields_calcs_and_lookups_substitute_inline() {
        let fixture = Fixture::new();
        let resolution = resolve(
            "{etunimi}: säästö [calc:saasto-1v] €, sähkö [lookup:sahkon_hinta] €/kWh",
            &fixture.ctx(),
        );
        assert_eq!(resolution.text, "Aino: säästö 2253 €, sähkö 0.15 €/kWh");
        assert!(resolution.success);
    }

    #[test]
    fn format_token_applies_locale_rules() {
        let fixture = Fixture::new();
        let resolution =
            resolve("Yhteensä [format:vuosikustannus:currency]", &fixture.ctx());
        assert_eq!(resolution.text, "Yhteensä 3 200 €");
    }

    #[test]
    fn format_token_resolves_formula_sources_with_options() {
        let fixture = Fixture::new();
        let resolution =
            resolve("[format:saasto-1v:number:decimals=1,suffix=euroa]", &fixture.ctx());
        assert_eq!(resolution.text, "2 253,0 euroa");
    }

    #[test]
    fn unknown_formula_keeps_the_token_and_flags_failure() {
        let fixture = Fixture::new();
        let resolution = resolve("Savings: [calc:missing-formula] €", &fixture.ctx());
        assert_eq!(resolution.text, "Savings: [calc:missing-formula] €");
        assert!(!resolution.success);
        assert!(resolution.error.as_deref().unwrap_or("").contains("missing-formula"));
    }

    #[test]
    fn failing_formula_substitutes_the_failure_text() {
        let fixture = Fixture::new();
        let resolution = resolve("Tulos: [calc:rikki]", &fixture.ctx());
        assert_eq!(resolution.text, format!("Tulos: {EXECUTION_FAILED_TEXT}"));
        assert!(!resolution.success);
    }

    #[test]
    fn missing_fields_and_lookups_resolve_to_empty() {
        let fixture = Fixture::new();
        let resolution = resolve("a{poissa}b[lookup:poissa]c", &fixture.ctx());
        assert_eq!(resolution.text, "abc");
        assert!(resolution.success);
    }

    #[test]
    fn sentinels_substitute_date_and_reference() {
        let fixture = Fixture::new();
        let resolution = resolve("CURRENT_DATE / viite AUTO_GENERATE", &fixture.ctx());
        assert_eq!(resolution.text, "7.8.2026 / viite LMP-000001");
    }

    #[test]
    fn counting_reference_is_sequential() {
        let reference = CountingReference::default();
        assert_eq!(reference.next_reference(), "LMP-000001");
        assert_eq!(reference.next_reference(), "LMP-000002");
    }

    #[test]
    fn unterminated_and_foreign_brackets_stay_verbatim() {
        let fixture = Fixture::new();
        assert_eq!(resolve("[huomio] teksti", &fixture.ctx()).text, "[huomio] teksti");
        assert_eq!(resolve("avoin [calc:saasto-1v", &fixture.ctx()).text, "avoin [calc:saasto-1v");
    }
}
