//! Tickbus CLI - host process for the tickbus event bus.
//!
//! Loads configuration, installs logging, builds one bus and hands it to a
//! subcommand: `demo` walks through every bus operation once, `run` drives
//! the bus from a fixed-rate tick loop.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tickbus_config::Config;
use tickbus_events::EventBus;

mod commands;
mod config_bridge;
mod theme;

use commands::OutputFormat;
use commands::run::RunSettings;

/// Tickbus - typed event bus with a time-budgeted tick drain
#[derive(Parser)]
#[command(name = "tickbus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty (default) or json
    #[arg(long, global = true, default_value = "pretty")]
    format: String,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "TICKBUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through every bus operation once and print the transcript
    Demo,

    /// Drive the bus from a fixed-rate tick loop
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value_t = 60)]
        frames: u64,

        /// Frames per second
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=10_000))]
        rate: u32,

        /// Deferred broadcasts queued per frame
        #[arg(short, long, default_value_t = 8)]
        burst: u32,

        /// Listeners registered for the frame event
        #[arg(short, long, default_value_t = 4)]
        listeners: u32,
    },
}

/// Load config from `path`, or from defaults and the environment when none is given.
///
/// An explicit path that fails to load is an error; otherwise the built-in
/// defaults are used.
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match (Config::load(path), path) {
        (Ok(config), _) => Ok(config),
        (Err(e), Some(path)) => {
            Err(e).with_context(|| format!("failed to load config from {}", path.display()))
        },
        (Err(e), None) => {
            eprintln!("Warning: ignoring invalid environment config: {e}");
            Ok(Config::default())
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Set up logging from config, with --verbose override.
    let log_config = config_bridge::to_log_config(&config, cli.verbose);
    if let Err(e) = tickbus_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    // Parse output format.
    let output_format = match cli.format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Pretty,
    };

    let bus = EventBus::with_options(config_bridge::to_bus_options(&config));
    tracing::debug!(
        drain_budget = ?bus.options().drain_budget,
        "Event bus ready"
    );

    match cli.command {
        Commands::Demo => commands::demo::run_demo(&bus, output_format)?,
        Commands::Run {
            frames,
            rate,
            burst,
            listeners,
        } => {
            let settings = RunSettings {
                frames,
                rate_hz: rate,
                burst,
                listeners,
            };
            commands::run::run_ticks(&bus, settings, output_format).await?;
        },
    }

    bus.destroy();
    Ok(())
}
