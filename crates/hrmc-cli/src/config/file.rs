use crate::error::{CliError, Result};
use hrmc::core::neighbors::NeighborStrategy;
use hrmc::core::policies::PolicySpec;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnnealingConfig {
    pub initial_temperature: Option<f64>,
    pub final_temperature: Option<f64>,
    pub temperature_decay: Option<f64>,
    pub initial_error_tolerance: Option<f64>,
    pub error_tolerance_decay: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileBatchConfig {
    pub width: Option<usize>,
    pub workers: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileNeighborConfig {
    pub cutoff: Option<f64>,
    pub strategy: Option<NeighborStrategy>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePdfConfig {
    pub bin_size: Option<f64>,
    pub weights: Option<HashMap<String, f64>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub directory: Option<PathBuf>,
    pub snapshot_interval: Option<usize>,
}

/// A `[[moves]]` or `[[validators]]` entry: a registry name plus its own keys.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FilePolicy {
    pub name: String,
    #[serde(flatten)]
    pub params: toml::Table,
}

impl From<FilePolicy> for PolicySpec {
    fn from(p: FilePolicy) -> Self {
        PolicySpec::new(&p.name, p.params)
    }
}

/// The run file as written by the user; every field may be omitted.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub structure: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub oracle: Option<PathBuf>,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    pub oxidation_states: Option<HashMap<String, f64>>,
    pub annealing: Option<FileAnnealingConfig>,
    pub batch: Option<FileBatchConfig>,
    pub neighbors: Option<FileNeighborConfig>,
    pub pdf: Option<FilePdfConfig>,
    pub output: Option<FileOutputConfig>,
    #[serde(default)]
    pub moves: Vec<FilePolicy>,
    #[serde(default)]
    pub validators: Vec<FilePolicy>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
