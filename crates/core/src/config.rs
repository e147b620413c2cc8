use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::lookup::LookupContext;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Unit prices and emission factors. This section is the source of the
/// calculation engine's `LookupContext`.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub electricity_eur_kwh: f64,
    pub oil_eur_litre: f64,
    pub gas_eur_mwh: f64,
    pub oil_co2_kg_litre: f64,
    pub gas_co2_kg_kwh: f64,
    pub electricity_co2_kg_kwh: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Optional path to a formula/lookup/template tables file.
    pub tables_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub oil_eur_litre: Option<f64>,
    pub electricity_eur_kwh: Option<f64>,
    pub tables_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let lookups = LookupContext::default();
        Self {
            pricing: PricingConfig {
                electricity_eur_kwh: lookups.electricity_eur_kwh,
                oil_eur_litre: lookups.oil_eur_litre,
                gas_eur_mwh: lookups.gas_eur_mwh,
                oil_co2_kg_litre: lookups.oil_co2_kg_litre,
                gas_co2_kg_kwh: lookups.gas_co2_kg_kwh,
                electricity_co2_kg_kwh: lookups.electricity_co2_kg_kwh,
            },
            report: ReportConfig { tables_path: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    report: Option<ReportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    electricity_eur_kwh: Option<f64>,
    oil_eur_litre: Option<f64>,
    gas_eur_mwh: Option<f64>,
    oil_co2_kg_litre: Option<f64>,
    gas_co2_kg_kwh: Option<f64>,
    electricity_co2_kg_kwh: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportPatch {
    tables_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load with precedence: programmatic overrides > environment > file >
    /// defaults.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("lampo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The lookup table handed to the calculation engine.
    pub fn lookup_context(&self) -> LookupContext {
        LookupContext {
            electricity_eur_kwh: self.pricing.electricity_eur_kwh,
            oil_eur_litre: self.pricing.oil_eur_litre,
            gas_eur_mwh: self.pricing.gas_eur_mwh,
            oil_co2_kg_litre: self.pricing.oil_co2_kg_litre,
            gas_co2_kg_kwh: self.pricing.gas_co2_kg_kwh,
            electricity_co2_kg_kwh: self.pricing.electricity_co2_kg_kwh,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(value) = pricing.electricity_eur_kwh {
                self.pricing.electricity_eur_kwh = value;
            }
            if let Some(value) = pricing.oil_eur_litre {
                self.pricing.oil_eur_litre = value;
            }
            if let Some(value) = pricing.gas_eur_mwh {
                self.pricing.gas_eur_mwh = value;
            }
            if let Some(value) = pricing.oil_co2_kg_litre {
                self.pricing.oil_co2_kg_litre = value;
            }
            if let Some(value) = pricing.gas_co2_kg_kwh {
                self.pricing.gas_co2_kg_kwh = value;
            }
            if let Some(value) = pricing.electricity_co2_kg_kwh {
                self.pricing.electricity_co2_kg_kwh = value;
            }
        }

        if let Some(report) = patch.report {
            if let Some(tables_path) = report.tables_path {
                self.report.tables_path = Some(tables_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LAMPO_PRICING_ELECTRICITY_EUR_KWH") {
            self.pricing.electricity_eur_kwh =
                parse_f64("LAMPO_PRICING_ELECTRICITY_EUR_KWH", &value)?;
        }
        if let Some(value) = read_env("LAMPO_PRICING_OIL_EUR_LITRE") {
            self.pricing.oil_eur_litre = parse_f64("LAMPO_PRICING_OIL_EUR_LITRE", &value)?;
        }
        if let Some(value) = read_env("LAMPO_PRICING_GAS_EUR_MWH") {
            self.pricing.gas_eur_mwh = parse_f64("LAMPO_PRICING_GAS_EUR_MWH", &value)?;
        }
        if let Some(value) = read_env("LAMPO_PRICING_OIL_CO2_KG_LITRE") {
            self.pricing.oil_co2_kg_litre = parse_f64("LAMPO_PRICING_OIL_CO2_KG_LITRE", &value)?;
        }
        if let Some(value) = read_env("LAMPO_PRICING_GAS_CO2_KG_KWH") {
            self.pricing.gas_co2_kg_kwh = parse_f64("LAMPO_PRICING_GAS_CO2_KG_KWH", &value)?;
        }
        if let Some(value) = read_env("LAMPO_PRICING_ELECTRICITY_CO2_KG_KWH") {
            self.pricing.electricity_co2_kg_kwh =
                parse_f64("LAMPO_PRICING_ELECTRICITY_CO2_KG_KWH", &value)?;
        }

        if let Some(value) = read_env("LAMPO_REPORT_TABLES_PATH") {
            self.report.tables_path = Some(PathBuf::from(value));
        }

        let log_level = read_env("LAMPO_LOGGING_LEVEL").or_else(|| read_env("LAMPO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("LAMPO_LOGGING_FORMAT").or_else(|| read_env("LAMPO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(oil_eur_litre) = overrides.oil_eur_litre {
            self.pricing.oil_eur_litre = oil_eur_litre;
        }
        if let Some(electricity_eur_kwh) = overrides.electricity_eur_kwh {
            self.pricing.electricity_eur_kwh = electricity_eur_kwh;
        }
        if let Some(tables_path) = overrides.tables_path {
            self.report.tables_path = Some(tables_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prices = [
            ("pricing.electricity_eur_kwh", self.pricing.electricity_eur_kwh),
            ("pricing.oil_eur_litre", self.pricing.oil_eur_litre),
            ("pricing.gas_eur_mwh", self.pricing.gas_eur_mwh),
        ];
        for (key, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a positive number, got {value}"
                )));
            }
        }

        let factors = [
            ("pricing.oil_co2_kg_litre", self.pricing.oil_co2_kg_litre),
            ("pricing.gas_co2_kg_kwh", self.pricing.gas_co2_kg_kwh),
            ("pricing.electricity_co2_kg_kwh", self.pricing.electricity_co2_kg_kwh),
        ];
        for (key, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

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

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::{Mutex, OnceLock};

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    // Env-touching tests share one lock so overrides never bleed between
    // parallel test threads.
    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn defaults_match_the_standalone_lookup_context() {
        let _guard = env_lock().lock().expect("env lock");
        let config = AppConfig::load(LoadOptions::default()).expect("default load");

        assert_eq!(config.pricing.electricity_eur_kwh, 0.15);
        assert_eq!(config.pricing.oil_eur_litre, 1.3);
        assert_eq!(config.logging.format, LogFormat::Compact);

        let lookups = config.lookup_context();
        assert_eq!(lookups.oil_co2_kg_litre, 2.66);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let _guard = env_lock().lock().expect("env lock");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[pricing]\noil_eur_litre = 1.55\n\n[logging]\nlevel = \"debug\"\nformat = \"json\"\n"
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("load with file");

        assert_eq!(config.pricing.oil_eur_litre, 1.55);
        assert_eq!(config.pricing.electricity_eur_kwh, 0.15);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn env_overrides_file_values() {
        let _guard = env_lock().lock().expect("env lock");
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[pricing]\noil_eur_litre = 1.55\n").expect("write config");

        std::env::set_var("LAMPO_PRICING_OIL_EUR_LITRE", "1.72");
        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        });
        std::env::remove_var("LAMPO_PRICING_OIL_EUR_LITRE");

        assert_eq!(config.expect("load").pricing.oil_eur_litre, 1.72);
    }

    #[test]
    fn programmatic_overrides_win_over_everything() {
        let _guard = env_lock().lock().expect("env lock");
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                oil_eur_litre: Some(2.0),
                log_level: Some("trace".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load with overrides");

        assert_eq!(config.pricing.oil_eur_litre, 2.0);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn rejects_non_positive_prices() {
        let _guard = env_lock().lock().expect("env lock");
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                oil_eur_litre: Some(0.0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let _guard = env_lock().lock().expect("env lock");
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does/not/exist.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn invalid_env_override_reports_key_and_value() {
        let _guard = env_lock().lock().expect("env lock");
        std::env::set_var("LAMPO_PRICING_GAS_EUR_MWH", "paljon");
        let result = AppConfig::load(LoadOptions::default());
        std::env::remove_var("LAMPO_PRICING_GAS_EUR_MWH");

        assert!(matches!(result, Err(ConfigError::InvalidEnvOverride { .. })));
    }
}
