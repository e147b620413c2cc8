use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lampo_core::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let pricing_rows = [
        ("pricing.electricity_eur_kwh", "LAMPO_PRICING_ELECTRICITY_EUR_KWH", config.pricing.electricity_eur_kwh),
        ("pricing.oil_eur_litre", "LAMPO_PRICING_OIL_EUR_LITRE", config.pricing.oil_eur_litre),
        ("pricing.gas_eur_mwh", "LAMPO_PRICING_GAS_EUR_MWH", config.pricing.gas_eur_mwh),
        ("pricing.oil_co2_kg_litre", "LAMPO_PRICING_OIL_CO2_KG_LITRE", config.pricing.oil_co2_kg_litre),
        ("pricing.gas_co2_kg_kwh", "LAMPO_PRICING_GAS_CO2_KG_KWH", config.pricing.gas_co2_kg_kwh),
        ("pricing.electricity_co2_kg_kwh", "LAMPO_PRICING_ELECTRICITY_CO2_KG_KWH", config.pricing.electricity_co2_kg_kwh),
    ];
    for (key, env_key, value) in pricing_rows {
        lines.push(render_line(
            key,
            &value.to_string(),
            field_source(key, Some(env_key), config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    let tables_path = config
        .report
        .tables_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "report.tables_path",
        &tables_path,
        field_source(
            "report.tables_path",
            Some("LAMPO_REPORT_TABLES_PATH"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some("LAMPO_LOGGING_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some("LAMPO_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("lampo.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/lampo.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
