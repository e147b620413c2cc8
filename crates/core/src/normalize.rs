//! Lead normalization: alias-prone raw form input to the canonical record.
//!
//! The policy throughout is best-effort: malformed input degrades to an
//! empty-typed record with a log entry, never an error. A failed
//! calculation must not block lead capture.

use serde_json::{Map, Value};

use crate::domain::lead::{LeadNormalized, DEFAULT_OIL_PRICE_EUR_LITRE};
use crate::numeric::parse_number;

/// Legacy and alternate form keys mapped onto canonical keys. A mapping is
/// applied only when the canonical key is absent from the submission.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("lammitystapa", "lammitysmuoto"),
    ("menekki", "kokonaismenekki"),
    ("vuosittainen_kustannus", "vuosikustannus"),
    ("lammityskulut_vuodessa", "vuosikustannus"),
    ("pinta-ala", "pinta_ala"),
    ("asuinpinta_ala", "pinta_ala"),
    ("huone_korkeus", "huonekorkeus"),
    ("asukkaita", "asukasmaara"),
    ("energian_tarve", "energiantarve"),
    ("oljynhinta", "oljyn_hinta"),
];

/// Normalization result: the canonical record plus a human-readable audit
/// log of every alias and fallback that was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedLead {
    pub lead: LeadNormalized,
    pub log: Vec<String>,
}

/// Normalize an arbitrary raw submission. Total: any JSON value produces a
/// usable record.
pub fn normalize_lead(raw: &Value) -> NormalizedLead {
    let mut log = Vec::new();

    let mut object = match raw.as_object() {
        Some(map) => map.clone(),
        None => {
            log.push("input:invalid_shape".to_string());
            Map::new()
        }
    };

    for (old, canonical) in KEY_ALIASES {
        if object.contains_key(*canonical) {
            continue;
        }
        if let Some(value) = object.remove(*old) {
            object.insert((*canonical).to_string(), value);
            log.push(format!("alias:{old} -> {canonical}"));
        }
    }

    let lead = coerce(&object);

    if let Err(violations) = lead.validate() {
        log.push("normalized:validation_failed".to_string());
        for violation in violations {
            log.push(format!("validation:{violation}"));
        }
    }

    NormalizedLead { lead, log }
}

fn coerce(object: &Map<String, Value>) -> LeadNormalized {
    LeadNormalized {
        heating_type: text_field(object, "lammitysmuoto"),
        floor_area_m2: number_field(object, "pinta_ala"),
        ceiling_height_m: number_field(object, "huonekorkeus"),
        construction_year: integer_field(object, "rakennusvuosi").map(|v| v as i32),
        residents: integer_field(object, "asukasmaara"),
        total_consumption: number_field(object, "kokonaismenekki"),
        annual_cost_eur: number_field(object, "vuosikustannus"),
        energy_need_kwh: number_field(object, "energiantarve"),
        oil_price_eur_litre: Some(
            number_field(object, "oljyn_hinta").unwrap_or(DEFAULT_OIL_PRICE_EUR_LITRE),
        ),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_number(value)),
    }
}

/// Integer fields truncate toward zero, matching lenient integer parsing
/// of inputs like `"1985.7"`.
fn integer_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    number_field(object, key).map(|v| v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::normalize_lead;
    use crate::domain::lead::DEFAULT_OIL_PRICE_EUR_LITRE;

    #[test]
    fn resolves_aliases_and_logs_each_substitution() {
        let raw = json!({
            "lammitystapa": "Öljylämmitys",
            "vuosittainen_kustannus": "3 200",
        });

        let outcome = normalize_lead(&raw);
        assert_eq!(outcome.lead.heating_type.as_deref(), Some("Öljylämmitys"));
        assert_eq!(outcome.lead.annual_cost_eur, Some(3200.0));
        assert!(outcome.log.contains(&"alias:lammitystapa -> lammitysmuoto".to_string()));
        assert!(outcome.log.contains(&"alias:vuosittainen_kustannus -> vuosikustannus".to_string()));
    }

    #[test]
    fn alias_is_ignored_when_canonical_key_present() {
        let raw = json!({
            "vuosikustannus": 2800,
            "vuosittainen_kustannus": 9999,
        });

        let outcome = normalize_lead(&raw);
        assert_eq!(outcome.lead.annual_cost_eur, Some(2800.0));
        assert!(outcome.log.is_empty());
    }

    #[test]
    fn normalization_is_idempotent_for_canonical_input() {
        let raw = json!({
            "lammitysmuoto": "Kaasulämmitys",
            "pinta_ala": 140.5,
            "huonekorkeus": 2.5,
            "rakennusvuosi": 1995,
            "asukasmaara": 3,
            "kokonaismenekki": 2100.0,
            "vuosikustannus": 1900.0,
            "energiantarve": 21_000.0,
            "oljyn_hinta": 1.3,
        });

        let first = normalize_lead(&raw);
        assert!(first.log.is_empty());

        let reserialized = serde_json::to_value(&first.lead).expect("serialize");
        let second = normalize_lead(&reserialized);
        assert_eq!(second.lead, first.lead);
        assert!(second.log.is_empty());
    }

    #[test]
    fn coerces_locale_formatted_numbers() {
        let raw = json!({
            "lammitysmuoto": "Öljylämmitys",
            "kokonaismenekki": "2 500,5",
            "rakennusvuosi": "1985.7",
        });

        let outcome = normalize_lead(&raw);
        assert_eq!(outcome.lead.total_consumption, Some(2500.5));
        assert_eq!(outcome.lead.construction_year, Some(1985));
    }

    #[test]
    fn defaults_oil_price_when_absent() {
        let outcome = normalize_lead(&json!({}));
        assert_eq!(outcome.lead.oil_price_eur_litre, Some(DEFAULT_OIL_PRICE_EUR_LITRE));
    }

    #[test]
    fn non_object_input_degrades_to_empty_record() {
        let outcome = normalize_lead(&json!("not a form"));
        assert_eq!(outcome.lead.heating_type, None);
        assert!(outcome.log.contains(&"input:invalid_shape".to_string()));
    }

    #[test]
    fn implausible_values_are_logged_but_kept() {
        let raw = json!({"rakennusvuosi": 17, "vuosikustannus": -100});

        let outcome = normalize_lead(&raw);
        assert!(outcome.log.contains(&"normalized:validation_failed".to_string()));
        assert_eq!(outcome.lead.construction_year, Some(17));
        assert_eq!(outcome.lead.annual_cost_eur, Some(-100.0));
    }
}
