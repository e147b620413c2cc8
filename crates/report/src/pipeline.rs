//! The one-call report pipeline: raw submission in, fully resolved report
//! data out. Normalization, strategy selection, metrics aggregation, and
//! template resolution all degrade rather than fail, so the report always
//! comes back, and every degradation is audited.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use lampo_core::{
    compute_metrics_with, normalize_lead, select_strategy, AuditCategory, AuditEvent,
    AuditOutcome, AuditSink, LeadNormalized, LookupContext, Metrics, StrategyKind,
};

use crate::fields::{build_fields, ReportField};
use crate::formula::{FormulaDefinition, FormulaTable};
use crate::shortcode::{resolve, LookupTable, ReferenceSource, Resolution, ResolveContext, UuidReference};

/// Formula, lookup, and field-template tables as one store document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTables {
    #[serde(default)]
    pub formulas: FormulaTable,
    #[serde(default)]
    pub lookups: LookupTable,
    #[serde(default)]
    pub field_templates: BTreeMap<String, String>,
}

impl ReportTables {
    /// Built-in tables used when the store supplies none: the standard
    /// savings formulas and report boilerplate.
    pub fn builtin(lookups: &LookupContext) -> Self {
        let mut tables = Self::default();

        tables.formulas.insert(
            "saasto-1v",
            FormulaDefinition {
                expression: "kustannus_nyt_1v - kustannus_uusi_1v".to_string(),
                variables: vec!["kustannus_nyt_1v".to_string(), "kustannus_uusi_1v".to_string()],
            },
        );
        tables.formulas.insert(
            "saasto-5v",
            FormulaDefinition {
                expression: "(kustannus_nyt_1v - kustannus_uusi_1v) * 5".to_string(),
                variables: vec!["kustannus_nyt_1v".to_string(), "kustannus_uusi_1v".to_string()],
            },
        );
        tables.formulas.insert(
            "saasto-10v",
            FormulaDefinition {
                expression: "(kustannus_nyt_1v - kustannus_uusi_1v) * 10".to_string(),
                variables: vec!["kustannus_nyt_1v".to_string(), "kustannus_uusi_1v".to_string()],
            },
        );
        tables.formulas.insert(
            "co2-vahennys",
            FormulaDefinition {
                expression: "co2_nyt - co2_uusi".to_string(),
                variables: vec!["co2_nyt".to_string(), "co2_uusi".to_string()],
            },
        );

        tables.lookups.insert("sahkon_hinta", json!(lookups.electricity_eur_kwh));
        tables.lookups.insert("oljyn_hinta", json!(lookups.oil_eur_litre));
        tables.lookups.insert("kaasun_hinta_mwh", json!(lookups.gas_eur_mwh));

        tables.field_templates.insert("paivays".to_string(), "CURRENT_DATE".to_string());
        tables.field_templates.insert("viite".to_string(), "AUTO_GENERATE".to_string());
        tables.field_templates.insert(
            "otsikko".to_string(),
            "Lämpöpumpun säästölaskelma: {lammitysmuoto}".to_string(),
        );
        tables.field_templates.insert(
            "yhteenveto".to_string(),
            "Nykyinen lämmitys maksaa [format:kustannus_nyt_1v:currency] vuodessa. \
             Lämpöpumpulla kustannus on [format:kustannus_uusi_1v:currency] ja säästät \
             [format:saasto-1v:currency] joka vuosi, [format:saasto-10v:currency] \
             kymmenessä vuodessa."
                .to_string(),
        );

        tables
    }
}

/// One report request. `today` and `reference` are injectable so output is
/// deterministic under test.
pub struct ReportRequest<'a> {
    pub raw_lead: &'a Value,
    pub lookups: &'a LookupContext,
    pub tables: &'a ReportTables,
    pub today: NaiveDate,
    pub reference: &'a dyn ReferenceSource,
    pub correlation_id: String,
}

static DEFAULT_REFERENCE: UuidReference = UuidReference;

impl<'a> ReportRequest<'a> {
    pub fn new(raw_lead: &'a Value, lookups: &'a LookupContext, tables: &'a ReportTables) -> Self {
        Self {
            raw_lead,
            lookups,
            tables,
            today: Utc::now().date_naive(),
            reference: &DEFAULT_REFERENCE,
            correlation_id: "report".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub lead: LeadNormalized,
    pub log: Vec<String>,
    pub strategy: StrategyKind,
    pub metrics: Metrics,
    pub fields: Vec<ReportField>,
    pub resolutions: BTreeMap<String, Resolution>,
    pub success: bool,
    pub errors: Vec<String>,
}

pub fn build_report(request: &ReportRequest<'_>, sink: &dyn AuditSink) -> Report {
    let lead_ref = request
        .raw_lead
        .get("id")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let normalized = normalize_lead(request.raw_lead);
    let degraded = normalized.log.iter().any(|line| !line.starts_with("alias:"));
    if degraded {
        warn!(
            event_name = "report.normalize_degraded",
            correlation_id = %request.correlation_id,
            log = ?normalized.log,
            "lead normalization degraded"
        );
    }
    sink.emit(
        AuditEvent::new(
            lead_ref.clone(),
            request.correlation_id.clone(),
            "normalize.completed",
            AuditCategory::Normalize,
            "normalizer",
            if degraded { AuditOutcome::Degraded } else { AuditOutcome::Success },
        )
        .with_metadata("log_entries", normalized.log.len().to_string()),
    );

    let strategy = select_strategy(&normalized.lead);
    sink.emit(
        AuditEvent::new(
            lead_ref.clone(),
            request.correlation_id.clone(),
            "strategy.selected",
            AuditCategory::Strategy,
            "strategy-engine",
            AuditOutcome::Success,
        )
        .with_metadata("kind", format!("{:?}", strategy.kind())),
    );

    let metrics = compute_metrics_with(strategy, &normalized.lead, request.lookups);
    let fields = build_fields(strategy, &metrics);

    let values = resolution_values(&normalized.lead, &metrics);
    let ctx = ResolveContext {
        values: &values,
        formulas: &request.tables.formulas,
        lookups: &request.tables.lookups,
        today: request.today,
        reference: request.reference,
    };

    let mut resolutions = BTreeMap::new();
    let mut errors = Vec::new();
    for (field, template) in &request.tables.field_templates {
        let resolution = resolve(template, &ctx);
        if let Some(error) = &resolution.error {
            warn!(
                event_name = "report.formula_failed",
                correlation_id = %request.correlation_id,
                field = %field,
                error = %error,
                "template resolution degraded"
            );
            sink.emit(
                AuditEvent::new(
                    lead_ref.clone(),
                    request.correlation_id.clone(),
                    "resolve.formula_failed",
                    AuditCategory::Resolve,
                    "resolver",
                    AuditOutcome::Failed,
                )
                .with_metadata("field", field.clone())
                .with_metadata("error", error.clone()),
            );
            errors.push(format!("{field}: {error}"));
        }
        resolutions.insert(field.clone(), resolution);
    }

    let success = errors.is_empty();
    info!(
        event_name = "report.built",
        correlation_id = %request.correlation_id,
        strategy = ?strategy.kind(),
        success,
        "report data assembled"
    );
    sink.emit(
        AuditEvent::new(
            lead_ref,
            request.correlation_id.clone(),
            "report.built",
            AuditCategory::Metrics,
            "report-pipeline",
            if success { AuditOutcome::Success } else { AuditOutcome::Degraded },
        )
        .with_metadata("fields", fields.len().to_string()),
    );

    Report {
        lead: normalized.lead,
        log: normalized.log,
        strategy: strategy.kind(),
        metrics,
        fields,
        resolutions,
        success,
        errors,
    }
}

/// The flat value map templates and formulas resolve against: the
/// canonical lead fields plus the computed metric figures.
pub fn resolution_values(lead: &LeadNormalized, metrics: &Metrics) -> Map<String, Value> {
    let mut values = match serde_json::to_value(lead) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    values.insert("strategia".to_string(), json!(metrics.strategy));
    values.insert("kustannus_nyt_1v".to_string(), json!(metrics.current.cost.year1));
    values.insert("kustannus_nyt_5v".to_string(), json!(metrics.current.cost.year5));
    values.insert("kustannus_nyt_10v".to_string(), json!(metrics.current.cost.year10));
    values.insert("kulutus_nyt".to_string(), json!(metrics.current.consumption.amount()));
    values.insert(
        "kulutus_yksikko".to_string(),
        json!(metrics.current.consumption.unit_label()),
    );
    values.insert("co2_nyt".to_string(), json!(metrics.current.co2_kg_year));
    values.insert("huolto_nyt".to_string(), json!(metrics.current.maintenance_eur_year));
    values.insert("kustannus_uusi_1v".to_string(), json!(metrics.new_system.cost.year1));
    values.insert("kustannus_uusi_5v".to_string(), json!(metrics.new_system.cost.year5));
    values.insert("kustannus_uusi_10v".to_string(), json!(metrics.new_system.cost.year10));
    values.insert("sahko_kwh".to_string(), json!(metrics.new_system.electricity_kwh_year));
    values.insert("co2_uusi".to_string(), json!(metrics.new_system.co2_kg_year));

    values
}
