pub mod commands;

use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use shopkit_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

use commands::price::PriceArgs;
use commands::revenue::RevenueArgs;

#[derive(Debug, Parser)]
#[command(
    name = "shopkit",
    about = "Shopkit subscription pricing and attribution CLI",
    long_about = "Price subscription schedules, report attributed campaign revenue, and inspect configuration.",
    after_help = "Examples:\n  shopkit price --schedule-id 6-month --variant-price 5000 --catalog schedules.toml\n  shopkit revenue --orders orders.json --model first_touch\n  shopkit doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute checkout and recurring amounts for a subscription schedule")]
    Price(PriceArgs),
    #[command(about = "Aggregate attributed revenue per campaign over 7/30/365 day windows")]
    Revenue(RevenueArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, schedule catalog and attribution model readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Installs the global subscriber. Logs go to stderr; stdout carries command output.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report config failures themselves; logging falls back to defaults.
    let logging_config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    if let Err(error) = init_logging(&logging_config) {
        eprintln!("{error:#}");
    }

    let result = match cli.command {
        Command::Price(args) => commands::price::run(args),
        Command::Revenue(args) => commands::revenue::run(args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
