use crate::cli::RefineArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use hrmc::{
    core::policies::registry::PolicyRegistry,
    engine::{progress::ProgressReporter, runlog::STRUCTURE_FILE},
    workflows::{self, refine::RefinementResult},
};
use tracing::info;

pub fn run(args: RefineArgs, threads: Option<usize>, quiet: bool) -> Result<RefinementResult> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args, threads)?;
    info!(
        structure = %config.inputs.structure_path.display(),
        reference = %config.inputs.reference_path.display(),
        oracle = %config.inputs.oracle_path.display(),
        max_steps = config.max_steps,
        batch_width = config.batch.batch_width,
        "Configuration resolved."
    );

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let registry = PolicyRegistry::with_builtins();

    if !quiet {
        println!("Starting HRMC refinement...");
    }
    let result = workflows::refine::run_from_config(&config, &registry, &reporter)?;

    let output_path = config.output.directory.join(STRUCTURE_FILE);
    info!(
        "Refinement finished after {} steps; best structure at {:?}",
        result.counters.steps, &output_path
    );
    if !quiet {
        println!(
            "✓ Error {:.6} -> {:.6}, energy {:.4} -> {:.4} kcal/mol",
            result.initial_error, result.state.error, result.initial_energy, result.state.energy
        );
        println!(
            "  Accepted {}/{} steps, {}/{} moves",
            result.counters.accepted_steps,
            result.counters.steps,
            result.counters.moves,
            result.counters.moves_attempted
        );
        println!("  Refined structure written to: {}", output_path.display());
    }
    Ok(result)
}
