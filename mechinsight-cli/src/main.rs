// MechInsight CLI - Command-line generator and trainer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # MechInsight CLI
//!
//! Generates synthetic CNC telemetry and trains the predictive-maintenance
//! models on it.
//!
//! ## Usage
//!
//! ```bash
//! # 90 days, seed 42, 15% anomalies
//! mechinsight-cli generate
//!
//! # Train on an existing dataset
//! mechinsight-cli train --input cnc_machine_data_improved.csv --output-dir models
//!
//! # Both in one go, quick settings
//! mechinsight-cli run --days 30 --fast
//! ```

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::{GenerateArgs, RunArgs, TrainArgs};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// MechInsight telemetry generator and trainer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset CSV and its manifest
    Generate(GenerateArgs),
    /// Train models on a dataset CSV
    Train(TrainArgs),
    /// Generate a dataset, then train on it
    Run(RunArgs),
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("MechInsight v{}", env!("CARGO_PKG_VERSION"));

    let result = match &args.command {
        Command::Generate(generate) => commands::generate(generate).map(|_| ()),
        Command::Train(train) => commands::train(train).map(|report| {
            info!(selected = %report.maintenance.selected, "Models saved");
        }),
        Command::Run(run) => commands::run(run).map(|report| {
            info!(selected = %report.maintenance.selected, "Models saved");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
        assert_eq!(env!("CARGO_BIN_NAME"), "mechinsight-cli");
    }

    #[test]
    fn test_generate_defaults() {
        let args = Args::try_parse_from(["mechinsight-cli", "generate"]).unwrap();
        match args.command {
            Command::Generate(g) => {
                assert_eq!(g.output.to_str(), Some(commands::DEFAULT_DATASET));
                assert_eq!(g.manifest.to_str(), Some(commands::DEFAULT_MANIFEST));
                assert!(g.seed.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_run_flags() {
        let args = Args::try_parse_from([
            "mechinsight-cli",
            "run",
            "--days",
            "30",
            "--anomaly-percentage",
            "0.1",
            "--fast",
            "--window",
            "24",
            "--log-level",
            "debug",
        ])
        .unwrap();
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.generate.days, Some(30));
                assert_eq!(run.generate.anomaly_percentage, Some(0.1));
                assert!(run.output.fast);
                assert_eq!(run.output.window, Some(24));
                assert_eq!(run.output.predictions.to_str(), Some(commands::DEFAULT_PREDICTIONS));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.log_level, "debug");
    }
}
