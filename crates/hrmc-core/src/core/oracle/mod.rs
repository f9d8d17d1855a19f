//! Energy oracles: black-box evaluators mapping a configuration to a potential
//! energy in kcal/mol.
//!
//! An oracle is deterministic for a given geometry and is shared by all batch
//! workers, so every implementation is `Send + Sync`. Which oracle a run uses is
//! chosen by the `kind` key of its TOML file (see [`OracleConfig`]).

pub mod command;
pub mod pair;
pub mod potentials;

use crate::core::io::poscar::PoscarError;
use crate::core::models::configuration::Configuration;
use command::{CommandOracle, CommandOracleConfig};
use pair::{PairPotentialConfig, PairPotentialOracle};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnergyEvaluationError {
    #[error("I/O error while evaluating energy: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write candidate structure: {0}")]
    StructureWrite(#[from] PoscarError),
    #[error("Energy command '{program}' failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Could not parse an energy from evaluator output: '{output}'")]
    UnparsableOutput { output: String },
    #[error("Evaluator returned a non-finite energy ({0})")]
    NonFinite(f64),
}

#[derive(Debug, Error)]
pub enum OracleLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse oracle file '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid oracle definition: {0}")]
    Invalid(String),
}

pub trait EnergyOracle: Send + Sync {
    fn evaluate(&self, configuration: &Configuration) -> Result<f64, EnergyEvaluationError>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OracleConfig {
    PairPotential(PairPotentialConfig),
    Command(CommandOracleConfig),
}

impl OracleConfig {
    pub fn load(path: &Path) -> Result<Self, OracleLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| OracleLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| OracleLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn build(self) -> Result<Box<dyn EnergyOracle>, OracleLoadError> {
        Ok(match self {
            OracleConfig::PairPotential(config) => Box::new(PairPotentialOracle::new(config)?),
            OracleConfig::Command(config) => Box::new(CommandOracle::new(config)?),
        })
    }
}

/// Loads and constructs the oracle described by a TOML file.
pub fn load_oracle(path: &Path) -> Result<Box<dyn EnergyOracle>, OracleLoadError> {
    OracleConfig::load(path)?.build()
}
