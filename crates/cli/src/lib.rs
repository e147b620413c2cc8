pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lampo_core::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "lampo",
    about = "Lampo heating-cost calculation CLI",
    long_about = "Normalize raw lead submissions, compute heat-pump savings metrics, and resolve report templates.",
    after_help = "Examples:\n  lampo calculate --input lead.json --pretty\n  lampo report --input lead.json\n  lampo doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Normalize a raw lead and compute savings metrics")]
    Calculate {
        #[arg(long, help = "Raw lead submission as a JSON file")]
        input: PathBuf,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
        #[arg(long, help = "Override the configured oil price (€/L)")]
        oil_price: Option<f64>,
    },
    #[command(about = "Resolve one shortcode template against a lead")]
    Resolve {
        #[arg(long, help = "Template file with shortcode tokens")]
        template: PathBuf,
        #[arg(long, help = "Raw lead submission as a JSON file")]
        input: PathBuf,
        #[arg(long, help = "Formula/lookup tables JSON file")]
        tables: Option<PathBuf>,
    },
    #[command(about = "Run the full report pipeline: normalize, metrics, fields, templates")]
    Report {
        #[arg(long, help = "Raw lead submission as a JSON file")]
        input: PathBuf,
        #[arg(long, help = "Formula/lookup tables JSON file")]
        tables: Option<PathBuf>,
        #[arg(long, help = "Pretty-print the JSON output")]
        pretty: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, formula tables, and normalization readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Install the tracing subscriber per the `[logging]` config. Falls back
/// to defaults when configuration does not load; the command itself will
/// report the error.
pub fn init_tracing() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    // A second init in the same process is fine; keep the first subscriber.
    let _ = result;
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Calculate { input, pretty, oil_price } => {
            commands::calculate::run(&input, pretty, oil_price)
        }
        Command::Resolve { template, input, tables } => {
            commands::resolve::run(&template, &input, tables.as_deref())
        }
        Command::Report { input, tables, pretty } => {
            commands::report::run(&input, tables.as_deref(), pretty)
        }
        Command::Config => commands::CommandResult::payload(commands::config::run()),
        Command::Doctor { json } => {
            commands::CommandResult::payload(commands::doctor::run(json))
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
