use std::path::Path;

use chrono::Utc;
use serde_json::json;

use lampo_core::{compute_metrics, normalize_lead, AppConfig, LoadOptions};
use lampo_report::{resolution_values, resolve, ResolveContext, UuidReference};

use super::calculate::{read_json, render};
use super::report::load_tables;
use super::CommandResult;

pub fn run(template: &Path, input: &Path, tables_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("resolve", "config_validation", error.to_string(), 2)
        }
    };

    let template_text = match std::fs::read_to_string(template) {
        Ok(text) => text,
        Err(error) => {
            return CommandResult::failure(
                "resolve",
                "input",
                format!("could not read `{}`: {error}", template.display()),
                1,
            )
        }
    };

    let raw = match read_json(input) {
        Ok(raw) => raw,
        Err(error) => return CommandResult::failure("resolve", "input", format!("{error:#}"), 1),
    };

    let tables =
        match load_tables("resolve", tables_path, config.report.tables_path.as_deref(), &config) {
            Ok(tables) => tables,
            Err(result) => return *result,
        };

    let normalized = normalize_lead(&raw);
    let metrics = compute_metrics(&normalized.lead, &config.lookup_context());
    let values = resolution_values(&normalized.lead, &metrics);

    let reference = UuidReference;
    let resolution = resolve(
        &template_text,
        &ResolveContext {
            values: &values,
            formulas: &tables.formulas,
            lookups: &tables.lookups,
            today: Utc::now().date_naive(),
            reference: &reference,
        },
    );

    let exit_code = u8::from(!resolution.success);
    let output = render(&json!(resolution), false);
    CommandResult { exit_code, output }
}
