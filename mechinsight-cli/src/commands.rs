// MechInsight CLI - Command-line generator and trainer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Subcommand implementations.

use crate::error::Result;
use clap::Args;
use mechinsight::{generate_dataset, Dataset, DatasetManifest, GeneratorConfig};
use mechinsight_trainer::{Trainer, TrainerConfig, TrainingReport};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_DATASET: &str = "cnc_machine_data_improved.csv";
pub const DEFAULT_MANIFEST: &str = "cnc_machine_data_improved.manifest.json";
pub const DEFAULT_PREDICTIONS: &str = "cnc_machine_predictions.csv";
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Options for `generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Dataset CSV to write
    #[arg(short, long, default_value = DEFAULT_DATASET)]
    pub output: PathBuf,

    /// Manifest JSON to write
    #[arg(short, long, default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Generator config JSON (flags below override its fields)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Simulated days (24 hourly samples each)
    #[arg(short, long)]
    pub days: Option<usize>,

    /// Fraction of anomalous samples (0-1)
    #[arg(short, long)]
    pub anomaly_percentage: Option<f64>,
}

impl GenerateArgs {
    /// Resolve the generator configuration from file and flags.
    pub fn generator_config(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(days) = self.days {
            config = config.with_num_days(days);
        }
        if let Some(fraction) = self.anomaly_percentage {
            config = config.with_anomaly_percentage(fraction);
        }
        Ok(config)
    }
}

/// Options for `train`.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Dataset CSV to train on
    #[arg(short, long, default_value = DEFAULT_DATASET)]
    pub input: PathBuf,

    /// Trainer config JSON (flags below override its fields)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: TrainOutputArgs,
}

/// Trainer overrides and output locations shared by `train` and `run`.
#[derive(Args, Debug, Clone)]
pub struct TrainOutputArgs {
    /// Directory for model artifacts
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    pub output_dir: PathBuf,

    /// Predictions CSV to write
    #[arg(short, long, default_value = DEFAULT_PREDICTIONS)]
    pub predictions: PathBuf,

    /// Trainer random seed
    #[arg(long)]
    pub train_seed: Option<u64>,

    /// Samples per maintenance sequence window
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Fewer, shallower trees for quick runs (applied on top of any config file)
    #[arg(short, long)]
    pub fast: bool,
}

impl TrainOutputArgs {
    /// Apply flag overrides on top of `base`, or the defaults.
    pub fn trainer_config(&self, base: Option<TrainerConfig>) -> TrainerConfig {
        let mut config = base.unwrap_or_default();
        if self.fast {
            config = config.with_fast_forests();
        }
        if let Some(seed) = self.train_seed {
            config = config.with_seed(seed);
        }
        if let Some(window) = self.window {
            config = config.with_window(window);
        }
        config
    }
}

/// Options for `run`: generate then train.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Trainer config JSON
    #[arg(long)]
    pub trainer_config: Option<PathBuf>,

    #[command(flatten)]
    pub output: TrainOutputArgs,
}

fn manifest_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cnc_machine_data".to_string())
}

/// Generate the dataset and write the CSV plus manifest.
pub fn generate(args: &GenerateArgs) -> Result<Dataset> {
    let config = args.generator_config()?;
    let generated = generate_dataset(&config)?;

    generated.dataset.to_csv(&args.output)?;
    let manifest = DatasetManifest::from_generated(&manifest_name(&args.output), &generated);
    manifest.to_json_file(&args.manifest)?;

    if let Some(summary) = &manifest.summary {
        info!(
            samples = manifest.sample_count,
            anomalies = summary.anomaly_samples,
            anomaly_percentage = summary.anomaly_percentage,
            correlation = ?summary.health_maintenance_correlation,
            "Dataset ready"
        );
    }
    info!("Manifest written to {}", args.manifest.display());

    Ok(generated.dataset)
}

fn train_dataset(
    dataset: &Dataset,
    base: Option<TrainerConfig>,
    output: &TrainOutputArgs,
) -> Result<TrainingReport> {
    let trainer = Trainer::new(output.trainer_config(base))?;
    let outcome = trainer.train(dataset)?;
    outcome.save(&output.output_dir)?;
    outcome.write_predictions(dataset, &output.predictions)?;
    Ok(outcome.report)
}

fn load_trainer_config(path: Option<&PathBuf>) -> Result<Option<TrainerConfig>> {
    Ok(match path {
        Some(path) => Some(TrainerConfig::from_json_file(path)?),
        None => None,
    })
}

/// Train on an existing dataset CSV.
pub fn train(args: &TrainArgs) -> Result<TrainingReport> {
    let dataset = Dataset::from_csv(&args.input)?;
    info!("Loaded {} samples from {}", dataset.len(), args.input.display());
    let base = load_trainer_config(args.config.as_ref())?;
    train_dataset(&dataset, base, &args.output)
}

/// Generate, then train on the fresh dataset.
pub fn run(args: &RunArgs) -> Result<TrainingReport> {
    let dataset = generate(&args.generate)?;
    let base = load_trainer_config(args.trainer_config.as_ref())?;
    train_dataset(&dataset, base, &args.output)
}
