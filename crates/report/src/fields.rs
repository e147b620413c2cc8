//! PDF field mapping: the selected strategy's line items plus the fixed
//! current-vs-new comparison block, as final display strings.

use serde::{Deserialize, Serialize};
use serde_json::json;

use lampo_core::{format_number, HeatingStrategy, Metrics};

use crate::format::{format_value, DisplayType, FormatOptions};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportField {
    pub key: String,
    pub label: String,
    pub value: String,
}

impl ReportField {
    fn new(key: &str, label: &str, value: String) -> Self {
        Self { key: key.to_string(), label: label.to_string(), value }
    }
}

/// Build the ordered field list the PDF renderer fills in: the strategy's
/// own rows first, then the comparison block.
pub fn build_fields(strategy: &dyn HeatingStrategy, metrics: &Metrics) -> Vec<ReportField> {
    let mut fields = Vec::new();

    for row in strategy.pdf_rows() {
        let amount = match row.key {
            "kulutus" => metrics.current.consumption.amount(),
            "vuosikustannus" => metrics.current.cost.year1,
            "co2" => metrics.current.co2_kg_year,
            "huolto" => metrics.current.maintenance_eur_year,
            _ => continue,
        };
        fields.push(ReportField::new(
            row.key,
            row.label,
            format!("{} {}", format_number(amount as f64, 0), row.unit),
        ));
    }

    let currency = |amount: i64| -> String {
        format_value(&json!(amount), DisplayType::Currency, &FormatOptions::default())
    };

    fields.push(ReportField::new(
        "kustannus_nyt_1v",
        "Nykyinen kustannus / vuosi",
        currency(metrics.current.cost.year1),
    ));
    fields.push(ReportField::new(
        "kustannus_nyt_5v",
        "Nykyinen kustannus / 5 vuotta",
        currency(metrics.current.cost.year5),
    ));
    fields.push(ReportField::new(
        "kustannus_nyt_10v",
        "Nykyinen kustannus / 10 vuotta",
        currency(metrics.current.cost.year10),
    ));
    fields.push(ReportField::new(
        "kustannus_uusi_1v",
        "Lämpöpumpun kustannus / vuosi",
        currency(metrics.new_system.cost.year1),
    ));
    fields.push(ReportField::new(
        "kustannus_uusi_5v",
        "Lämpöpumpun kustannus / 5 vuotta",
        currency(metrics.new_system.cost.year5),
    ));
    fields.push(ReportField::new(
        "kustannus_uusi_10v",
        "Lämpöpumpun kustannus / 10 vuotta",
        currency(metrics.new_system.cost.year10),
    ));
    fields.push(ReportField::new(
        "sahko_kwh",
        "Lämpöpumpun sähkönkulutus",
        format!("{} kWh/v", format_number(metrics.new_system.electricity_kwh_year as f64, 0)),
    ));
    fields.push(ReportField::new(
        "co2_uusi",
        "CO₂-päästöt lämpöpumpulla",
        format!("{} kg/v", format_number(metrics.new_system.co2_kg_year as f64, 0)),
    ));

    for (key, label, years) in [
        ("saasto_1v", "Säästö / vuosi", 1i64),
        ("saasto_5v", "Säästö / 5 vuotta", 5),
        ("saasto_10v", "Säästö / 10 vuotta", 10),
    ] {
        let saving = (metrics.current.cost.year1 - metrics.new_system.cost.year1) * years;
        fields.push(ReportField::new(key, label, currency(saving)));
    }

    fields
}

#[cfg(test)]
mod tests {
    use lampo_core::{compute_metrics, select_strategy, LeadNormalized, LookupContext};

    use super::build_fields;

    fn oil_lead() -> LeadNormalized {
        LeadNormalized {
            heating_type: Some("Öljylämmitys".to_string()),
            total_consumption: Some(2400.0),
            energy_need_kwh: Some(24_000.0),
            oil_price_eur_litre: Some(1.3),
            ..LeadNormalized::default()
        }
    }

    #[test]
    fn strategy_rows_come_first_with_units() {
        let lead = oil_lead();
        let lookups = LookupContext::default();
        let strategy = select_strategy(&lead);
        let metrics = compute_metrics(&lead, &lookups);

        let fields = build_fields(strategy, &metrics);
        assert_eq!(fields[0].key, "kulutus");
        assert_eq!(fields[0].value, "2 400 l/v");
        assert_eq!(fields[1].key, "vuosikustannus");
        assert_eq!(fields[1].value, "3 120 €/v");
    }

    #[test]
    fn savings_follow_the_multiplied_year_one_rule() {
        let lead = oil_lead();
        let lookups = LookupContext::default();
        let metrics = compute_metrics(&lead, &lookups);

        let fields = build_fields(select_strategy(&lead), &metrics);
        let annual = fields.iter().find(|f| f.key == "saasto_1v").expect("saasto_1v");
        let decade = fields.iter().find(|f| f.key == "saasto_10v").expect("saasto_10v");

        // 3120 - 947 = 2173 per year, exactly tenfold over ten years.
        assert_eq!(annual.value, "2 173 €");
        assert_eq!(decade.value, "21 730 €");
    }
}
