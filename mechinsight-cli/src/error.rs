// MechInsight CLI - Command-line generator and trainer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use thiserror::Error;

/// Errors surfaced by a CLI command.
#[derive(Error, Debug)]
pub enum CliError {
    /// Dataset generation or I/O failed
    #[error(transparent)]
    Generator(#[from] mechinsight::GeneratorError),

    /// Model training or artifact I/O failed
    #[error(transparent)]
    Trainer(#[from] mechinsight_trainer::TrainerError),
}

pub type Result<T> = std::result::Result<T, CliError>;
