use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FilePolicy};
use crate::cli::{RefineArgs, StrategyArg};
use crate::error::{CliError, Result};
use hrmc::core::neighbors::NeighborStrategy;
use hrmc::core::policies::PolicySpec;
use hrmc::engine::config::{RefinementConfig, RefinementConfigBuilder};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

impl From<StrategyArg> for NeighborStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FullRebuild => NeighborStrategy::FullRebuild,
            StrategyArg::Patch => NeighborStrategy::Patch,
        }
    }
}

/// Merges, in increasing priority, built-in defaults, the run file, `-S`
/// assignments and dedicated CLI flags into a validated core configuration.
pub fn build_config(args: &RefineArgs, threads: Option<usize>) -> Result<RefinementConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let annealing = file_config.annealing.take().unwrap_or_default();
    let batch = file_config.batch.take().unwrap_or_default();
    let neighbors = file_config.neighbors.take().unwrap_or_default();
    let pdf = file_config.pdf.take().unwrap_or_default();
    let output = file_config.output.take().unwrap_or_default();

    let mut builder = RefinementConfigBuilder::new()
        .initial_temperature(
            annealing
                .initial_temperature
                .unwrap_or(defaults.initial_temperature),
        )
        .final_temperature(
            annealing
                .final_temperature
                .unwrap_or(defaults.final_temperature),
        )
        .temperature_decay(
            annealing
                .temperature_decay
                .unwrap_or(defaults.temperature_decay),
        )
        .initial_error_tolerance(
            annealing
                .initial_error_tolerance
                .unwrap_or(defaults.initial_error_tolerance),
        )
        .error_tolerance_decay(
            annealing
                .error_tolerance_decay
                .unwrap_or(defaults.error_tolerance_decay),
        )
        .batch_width(
            args.batch_width
                .or(batch.width)
                .unwrap_or(defaults.batch_width),
        )
        .neighbor_cutoff(neighbors.cutoff.unwrap_or(defaults.neighbor_cutoff))
        .neighbor_strategy(
            args.neighbor_strategy
                .map(Into::into)
                .or(neighbors.strategy)
                .unwrap_or(defaults.neighbor_strategy),
        )
        .pdf_bin_size(pdf.bin_size.unwrap_or(defaults.pdf_bin_size))
        .scattering_weights(pdf.weights.unwrap_or_default())
        .output_directory(
            args.output
                .clone()
                .or(output.directory)
                .unwrap_or_else(|| defaults.output_directory.clone()),
        )
        .snapshot_interval(
            output
                .snapshot_interval
                .unwrap_or(defaults.snapshot_interval),
        )
        .max_steps(
            args.max_steps
                .or(file_config.max_steps)
                .unwrap_or(defaults.max_steps),
        )
        .oxidation_states(file_config.oxidation_states.take().unwrap_or_default());

    if let Some(path) = required_path(&args.structure, &file_config.structure) {
        builder = builder.structure_path(path);
    }
    if let Some(path) = required_path(&args.reference, &file_config.reference) {
        builder = builder.reference_path(path);
    }
    if let Some(path) = required_path(&args.oracle, &file_config.oracle) {
        builder = builder.oracle_path(path);
    }
    if let Some(workers) = threads.or(batch.workers) {
        builder = builder.num_workers(workers);
    }
    if let Some(seed) = args.seed.or(file_config.seed) {
        builder = builder.seed(seed);
    }

    let moves = if file_config.moves.is_empty() {
        debug!(
            "No move generators configured; using '{}'.",
            defaults.move_generator
        );
        vec![default_move(&defaults)]
    } else {
        file_config.moves.into_iter().map(PolicySpec::from).collect()
    };
    for spec in moves {
        builder = builder.move_generator(spec);
    }
    for spec in file_config.validators.into_iter().map(FilePolicy::into) {
        builder = builder.validator(spec);
    }

    builder.build().map_err(|e| {
        CliError::Config(format!(
            "{}.\nHint: input paths can be given in the run file or with -i/-r/-e.",
            e
        ))
    })
}

fn required_path(cli: &Option<PathBuf>, file: &Option<PathBuf>) -> Option<PathBuf> {
    cli.clone().or_else(|| file.clone())
}

fn default_move(defaults: &DefaultsConfig) -> PolicySpec {
    let mut params = toml::Table::new();
    params.insert("max-step".to_string(), toml::Value::Float(defaults.max_step));
    PolicySpec::new(defaults.move_generator, params)
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "structure" => config.structure = Some(PathBuf::from(value)),
            "reference" => config.reference = Some(PathBuf::from(value)),
            "oracle" => config.oracle = Some(PathBuf::from(value)),
            "max-steps" => config.max_steps = Some(parse_value(key, value, "integer")?),
            "seed" => config.seed = Some(parse_value(key, value, "integer")?),
            "annealing.initial-temperature" => {
                config
                    .annealing
                    .get_or_insert_with(Default::default)
                    .initial_temperature = Some(parse_value(key, value, "float")?);
            }
            "annealing.final-temperature" => {
                config
                    .annealing
                    .get_or_insert_with(Default::default)
                    .final_temperature = Some(parse_value(key, value, "float")?);
            }
            "annealing.temperature-decay" => {
                config
                    .annealing
                    .get_or_insert_with(Default::default)
                    .temperature_decay = Some(parse_value(key, value, "float")?);
            }
            "annealing.initial-error-tolerance" => {
                config
                    .annealing
                    .get_or_insert_with(Default::default)
                    .initial_error_tolerance = Some(parse_value(key, value, "float")?);
            }
            "annealing.error-tolerance-decay" => {
                config
                    .annealing
                    .get_or_insert_with(Default::default)
                    .error_tolerance_decay = Some(parse_value(key, value, "float")?);
            }
            "batch.width" => {
                config.batch.get_or_insert_with(Default::default).width =
                    Some(parse_value(key, value, "integer")?);
            }
            "batch.workers" => {
                config.batch.get_or_insert_with(Default::default).workers =
                    Some(parse_value(key, value, "integer")?);
            }
            "neighbors.cutoff" => {
                config.neighbors.get_or_insert_with(Default::default).cutoff =
                    Some(parse_value(key, value, "float")?);
            }
            "neighbors.strategy" => {
                let strategy = match value {
                    "full-rebuild" => NeighborStrategy::FullRebuild,
                    "patch" => NeighborStrategy::Patch,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid strategy for {}: {} (expected 'full-rebuild' or 'patch')",
                            key, value
                        )));
                    }
                };
                config.neighbors.get_or_insert_with(Default::default).strategy = Some(strategy);
            }
            "pdf.bin-size" => {
                config.pdf.get_or_insert_with(Default::default).bin_size =
                    Some(parse_value(key, value, "float")?);
            }
            "output.directory" => {
                config.output.get_or_insert_with(Default::default).directory =
                    Some(PathBuf::from(value));
            }
            "output.snapshot-interval" => {
                config
                    .output
                    .get_or_insert_with(Default::default)
                    .snapshot_interval = Some(parse_value(key, value, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
