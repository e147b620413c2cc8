use serde::Serialize;
use serde_json::json;

use lampo_core::{
    compute_metrics, normalize_lead, AppConfig, LoadOptions, StrategyKind,
};
use lampo_report::{evaluate, parse, resolution_values, ReportTables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_formula_tables(&config));
            checks.push(check_normalization_roundtrip());
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "formula_table_health",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "normalization_roundtrip",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Every table formula must parse and evaluate against a reference lead.
fn check_formula_tables(config: &AppConfig) -> DoctorCheck {
    let lookups = config.lookup_context();
    let tables = ReportTables::builtin(&lookups);

    let normalized = normalize_lead(&reference_lead());
    let metrics = compute_metrics(&normalized.lead, &lookups);
    let values = resolution_values(&normalized.lead, &metrics);

    let mut problems = Vec::new();
    for (name, definition) in tables.formulas.iter() {
        if let Err(error) = parse(&definition.expression) {
            problems.push(format!("{name}: {error}"));
            continue;
        }
        if let Err(error) = evaluate(definition, &values) {
            problems.push(format!("{name}: {error}"));
        }
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "formula_table_health",
            status: CheckStatus::Pass,
            details: "all built-in formulas parse and evaluate".to_string(),
        }
    } else {
        DoctorCheck {
            name: "formula_table_health",
            status: CheckStatus::Fail,
            details: problems.join("; "),
        }
    }
}

/// A canonical lead must normalize with no alias entries and select the
/// expected strategy.
fn check_normalization_roundtrip() -> DoctorCheck {
    let outcome = normalize_lead(&reference_lead());
    if !outcome.log.is_empty() {
        return DoctorCheck {
            name: "normalization_roundtrip",
            status: CheckStatus::Fail,
            details: format!("canonical lead produced log entries: {:?}", outcome.log),
        };
    }

    let metrics =
        compute_metrics(&outcome.lead, &AppConfig::default().lookup_context());
    if metrics.strategy != StrategyKind::Oil {
        return DoctorCheck {
            name: "normalization_roundtrip",
            status: CheckStatus::Fail,
            details: format!("reference lead selected {:?}, expected Oil", metrics.strategy),
        };
    }

    DoctorCheck {
        name: "normalization_roundtrip",
        status: CheckStatus::Pass,
        details: "canonical lead normalizes cleanly and selects the oil strategy".to_string(),
    }
}

fn reference_lead() -> serde_json::Value {
    json!({
        "lammitysmuoto": "Öljylämmitys",
        "pinta_ala": 150.0,
        "huonekorkeus": 2.6,
        "rakennusvuosi": 1990,
        "asukasmaara": 4,
        "kokonaismenekki": 2400.0,
        "vuosikustannus": 3100.0,
        "energiantarve": 24_000.0,
        "oljyn_hinta": 1.3,
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let status = match check.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skipped",
        };
        lines.push(format!("- {} [{}]: {}", check.name, status, check.details));
    }
    lines.join("\n")
}
