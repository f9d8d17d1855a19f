use crate::core::neighbors::NeighborStrategy;
use crate::core::policies::PolicySpec;
use crate::core::scoring::pdf::PdfParams;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub structure_path: PathBuf,
    pub reference_path: PathBuf,
    pub oracle_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// Ordered move generators; each attempt picks one uniformly.
    pub move_generators: Vec<PolicySpec>,
    pub validators: Vec<PolicySpec>,
}

/// Quenching schedule for temperature and error tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    /// Temperature stops decaying once it is at or below this floor.
    pub final_temperature: f64,
    pub temperature_decay: f64,
    pub initial_error_tolerance: f64,
    pub error_tolerance_decay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Candidate attempts per iteration. Zero makes every batch empty.
    pub batch_width: usize,
    /// Worker threads; `None` uses one per available core.
    pub num_workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborConfig {
    pub cutoff: f64,
    pub strategy: NeighborStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// PDF snapshots are written every this many steps.
    pub snapshot_interval: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementConfig {
    pub inputs: InputConfig,
    pub policies: PolicyConfig,
    pub annealing: AnnealingConfig,
    pub batch: BatchConfig,
    pub neighbors: NeighborConfig,
    pub pdf: PdfParams,
    pub output: OutputConfig,
    pub max_steps: usize,
    pub seed: Option<u64>,
    pub oxidation_states: HashMap<String, f64>,
}

#[derive(Default)]
pub struct RefinementConfigBuilder {
    structure_path: Option<PathBuf>,
    reference_path: Option<PathBuf>,
    oracle_path: Option<PathBuf>,
    move_generators: Vec<PolicySpec>,
    validators: Vec<PolicySpec>,
    initial_temperature: Option<f64>,
    final_temperature: Option<f64>,
    temperature_decay: Option<f64>,
    initial_error_tolerance: Option<f64>,
    error_tolerance_decay: Option<f64>,
    batch_width: Option<usize>,
    num_workers: Option<usize>,
    neighbor_cutoff: Option<f64>,
    neighbor_strategy: Option<NeighborStrategy>,
    pdf_bin_size: Option<f64>,
    scattering_weights: HashMap<String, f64>,
    output_directory: Option<PathBuf>,
    snapshot_interval: Option<usize>,
    max_steps: Option<usize>,
    seed: Option<u64>,
    oxidation_states: HashMap<String, f64>,
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn decay_factor(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must lie in (0, 1], got {}", value),
        })
    }
}

impl RefinementConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure_path(mut self, path: PathBuf) -> Self {
        self.structure_path = Some(path);
        self
    }
    pub fn reference_path(mut self, path: PathBuf) -> Self {
        self.reference_path = Some(path);
        self
    }
    pub fn oracle_path(mut self, path: PathBuf) -> Self {
        self.oracle_path = Some(path);
        self
    }
    pub fn move_generator(mut self, spec: PolicySpec) -> Self {
        self.move_generators.push(spec);
        self
    }
    pub fn validator(mut self, spec: PolicySpec) -> Self {
        self.validators.push(spec);
        self
    }
    pub fn initial_temperature(mut self, kelvin: f64) -> Self {
        self.initial_temperature = Some(kelvin);
        self
    }
    pub fn final_temperature(mut self, kelvin: f64) -> Self {
        self.final_temperature = Some(kelvin);
        self
    }
    pub fn temperature_decay(mut self, q: f64) -> Self {
        self.temperature_decay = Some(q);
        self
    }
    pub fn initial_error_tolerance(mut self, sigma: f64) -> Self {
        self.initial_error_tolerance = Some(sigma);
        self
    }
    pub fn error_tolerance_decay(mut self, q: f64) -> Self {
        self.error_tolerance_decay = Some(q);
        self
    }
    pub fn batch_width(mut self, width: usize) -> Self {
        self.batch_width = Some(width);
        self
    }
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(workers);
        self
    }
    pub fn neighbor_cutoff(mut self, cutoff: f64) -> Self {
        self.neighbor_cutoff = Some(cutoff);
        self
    }
    pub fn neighbor_strategy(mut self, strategy: NeighborStrategy) -> Self {
        self.neighbor_strategy = Some(strategy);
        self
    }
    pub fn pdf_bin_size(mut self, bin_size: f64) -> Self {
        self.pdf_bin_size = Some(bin_size);
        self
    }
    pub fn scattering_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.scattering_weights = weights;
        self
    }
    pub fn output_directory(mut self, path: PathBuf) -> Self {
        self.output_directory = Some(path);
        self
    }
    pub fn snapshot_interval(mut self, steps: usize) -> Self {
        self.snapshot_interval = Some(steps);
        self
    }
    pub fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn oxidation_states(mut self, states: HashMap<String, f64>) -> Self {
        self.oxidation_states = states;
        self
    }

    pub fn build(self) -> Result<RefinementConfig, ConfigError> {
        let inputs = InputConfig {
            structure_path: self
                .structure_path
                .ok_or(ConfigError::MissingParameter("structure_path"))?,
            reference_path: self
                .reference_path
                .ok_or(ConfigError::MissingParameter("reference_path"))?,
            oracle_path: self
                .oracle_path
                .ok_or(ConfigError::MissingParameter("oracle_path"))?,
        };

        if self.move_generators.is_empty() {
            return Err(ConfigError::MissingParameter("move_generators"));
        }
        let policies = PolicyConfig {
            move_generators: self.move_generators,
            validators: self.validators,
        };

        let annealing = AnnealingConfig {
            initial_temperature: positive(
                "initial_temperature",
                self.initial_temperature
                    .ok_or(ConfigError::MissingParameter("initial_temperature"))?,
            )?,
            final_temperature: positive(
                "final_temperature",
                self.final_temperature
                    .ok_or(ConfigError::MissingParameter("final_temperature"))?,
            )?,
            temperature_decay: decay_factor(
                "temperature_decay",
                self.temperature_decay
                    .ok_or(ConfigError::MissingParameter("temperature_decay"))?,
            )?,
            initial_error_tolerance: positive(
                "initial_error_tolerance",
                self.initial_error_tolerance
                    .ok_or(ConfigError::MissingParameter("initial_error_tolerance"))?,
            )?,
            error_tolerance_decay: decay_factor(
                "error_tolerance_decay",
                self.error_tolerance_decay
                    .ok_or(ConfigError::MissingParameter("error_tolerance_decay"))?,
            )?,
        };

        if self.num_workers == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "num_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        let batch = BatchConfig {
            batch_width: self
                .batch_width
                .ok_or(ConfigError::MissingParameter("batch_width"))?,
            num_workers: self.num_workers,
        };

        let neighbors = NeighborConfig {
            cutoff: positive(
                "neighbor_cutoff",
                self.neighbor_cutoff
                    .ok_or(ConfigError::MissingParameter("neighbor_cutoff"))?,
            )?,
            strategy: self.neighbor_strategy.unwrap_or_default(),
        };

        let bin_size = positive(
            "pdf_bin_size",
            self.pdf_bin_size
                .ok_or(ConfigError::MissingParameter("pdf_bin_size"))?,
        )?;
        if bin_size >= neighbors.cutoff {
            return Err(ConfigError::InvalidParameter {
                name: "pdf_bin_size",
                reason: format!(
                    "bin size {} must be smaller than the neighbor cutoff {}",
                    bin_size, neighbors.cutoff
                ),
            });
        }
        let pdf = PdfParams {
            bin_size,
            weights: self.scattering_weights,
        };

        let snapshot_interval = self
            .snapshot_interval
            .ok_or(ConfigError::MissingParameter("snapshot_interval"))?;
        if snapshot_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "snapshot_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        let output = OutputConfig {
            directory: self
                .output_directory
                .ok_or(ConfigError::MissingParameter("output_directory"))?,
            snapshot_interval,
        };

        Ok(RefinementConfig {
            inputs,
            policies,
            annealing,
            batch,
            neighbors,
            pdf,
            output,
            max_steps: self
                .max_steps
                .ok_or(ConfigError::MissingParameter("max_steps"))?,
            seed: self.seed,
            oxidation_states: self.oxidation_states,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RefinementConfigBuilder {
        RefinementConfigBuilder::new()
            .structure_path(PathBuf::from("initial.vasp"))
            .reference_path(PathBuf::from("gr.txt"))
            .oracle_path(PathBuf::from("oracle.toml"))
            .move_generator(PolicySpec::new("atom-hop", toml::Table::new()))
            .initial_temperature(1000.0)
            .final_temperature(300.0)
            .temperature_decay(0.99)
            .initial_error_tolerance(0.002)
            .error_tolerance_decay(0.999)
            .batch_width(8)
            .neighbor_cutoff(10.0)
            .pdf_bin_size(0.04)
            .output_directory(PathBuf::from("out"))
            .snapshot_interval(5000)
            .max_steps(100)
    }

    #[test]
    fn complete_builder_produces_config() {
        let config = complete().seed(42).build().unwrap();
        assert_eq!(config.batch.batch_width, 8);
        assert_eq!(config.batch.num_workers, None);
        assert_eq!(config.neighbors.strategy, NeighborStrategy::FullRebuild);
        assert_eq!(config.annealing.final_temperature, 300.0);
        assert_eq!(config.pdf.bin_size, 0.04);
        assert_eq!(config.seed, Some(42));
        assert!(config.policies.validators.is_empty());
    }

    #[test]
    fn missing_parameters_are_reported_by_name() {
        let result = RefinementConfigBuilder::new().build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingParameter("structure_path")
        );

        let no_moves = RefinementConfigBuilder::new()
            .structure_path(PathBuf::from("a"))
            .reference_path(PathBuf::from("b"))
            .oracle_path(PathBuf::from("c"))
            .build();
        assert_eq!(
            no_moves.unwrap_err(),
            ConfigError::MissingParameter("move_generators")
        );
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        assert!(matches!(
            complete().temperature_decay(1.5).build(),
            Err(ConfigError::InvalidParameter {
                name: "temperature_decay",
                ..
            })
        ));
        assert!(matches!(
            complete().initial_error_tolerance(0.0).build(),
            Err(ConfigError::InvalidParameter {
                name: "initial_error_tolerance",
                ..
            })
        ));
        assert!(matches!(
            complete().pdf_bin_size(20.0).build(),
            Err(ConfigError::InvalidParameter {
                name: "pdf_bin_size",
                ..
            })
        ));
        assert!(matches!(
            complete().num_workers(0).build(),
            Err(ConfigError::InvalidParameter {
                name: "num_workers",
                ..
            })
        ));
    }

    #[test]
    fn zero_batch_width_and_unit_decay_are_allowed() {
        let config = complete()
            .batch_width(0)
            .temperature_decay(1.0)
            .error_tolerance_decay(1.0)
            .build()
            .unwrap();
        assert_eq!(config.batch.batch_width, 0);
    }
}
