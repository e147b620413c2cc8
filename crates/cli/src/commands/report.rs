use std::path::{Path, PathBuf};

use serde_json::json;

use lampo_core::{AppConfig, InMemoryAuditSink, LoadOptions};
use lampo_report::{build_report, ReportRequest, ReportTables};

use super::calculate::{read_json, render};
use super::CommandResult;

pub fn run(input: &Path, tables_path: Option<&Path>, pretty: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("report", "config_validation", error.to_string(), 2)
        }
    };

    let raw = match read_json(input) {
        Ok(raw) => raw,
        Err(error) => return CommandResult::failure("report", "input", format!("{error:#}"), 1),
    };

    let lookups = config.lookup_context();
    let tables =
        match load_tables("report", tables_path, config.report.tables_path.as_deref(), &config) {
            Ok(tables) => tables,
            Err(result) => return *result,
        };

    let sink = InMemoryAuditSink::default();
    let report = build_report(&ReportRequest::new(&raw, &lookups, &tables), &sink);

    let payload = json!({
        "report": report,
        "audit_events": sink.events().len(),
    });

    CommandResult::payload(render(&payload, pretty))
}

pub(crate) fn load_tables(
    command: &str,
    explicit: Option<&Path>,
    configured: Option<&Path>,
    config: &AppConfig,
) -> Result<ReportTables, Box<CommandResult>> {
    let path: Option<PathBuf> =
        explicit.map(Path::to_path_buf).or_else(|| configured.map(Path::to_path_buf));

    match path {
        Some(path) => {
            let raw = read_json(&path).map_err(|error| {
                Box::new(CommandResult::failure(command, "tables", format!("{error:#}"), 1))
            })?;
            serde_json::from_value(raw).map_err(|error| {
                Box::new(CommandResult::failure(
                    command,
                    "tables",
                    format!("`{}` is not a valid tables document: {error}", path.display()),
                    1,
                ))
            })
        }
        None => Ok(ReportTables::builtin(&config.lookup_context())),
    }
}
