use std::path::Path;

use anyhow::Context as _;
use serde_json::{json, Value};

use lampo_core::{
    compute_metrics, normalize_lead, AppConfig, ConfigOverrides, LoadOptions,
};

use super::CommandResult;

pub fn run(input: &Path, pretty: bool, oil_price: Option<f64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { oil_eur_litre: oil_price, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("calculate", "config_validation", error.to_string(), 2)
        }
    };

    let raw = match read_json(input) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure("calculate", "input", format!("{error:#}"), 1)
        }
    };

    let normalized = normalize_lead(&raw);
    let metrics = compute_metrics(&normalized.lead, &config.lookup_context());

    let payload = json!({
        "normalized": normalized.lead,
        "log": normalized.log,
        "metrics": metrics,
    });

    CommandResult::payload(render(&payload, pretty))
}

pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("`{}` is not valid JSON", path.display()))
}

pub(crate) fn render(payload: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    rendered.unwrap_or_else(|error| format!("{{\"error\":\"serialization: {error}\"}}"))
}
