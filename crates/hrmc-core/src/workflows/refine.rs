use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::configuration::Configuration;
use crate::core::neighbors::periodic::PeriodicIndex;
use crate::core::neighbors::{NeighborList, SpatialIndex, refresh};
use crate::core::oracle::{EnergyOracle, load_oracle};
use crate::core::policies::registry::PolicyRegistry;
use crate::core::policies::validators::MinDistanceTable;
use crate::core::policies::{MoveGenerator, Validator};
use crate::core::scoring::StructureScorer;
use crate::core::scoring::pdf::PdfScorer;
use crate::engine::acceptance::{DecisionScope, decide};
use crate::engine::batch::{BatchCandidateProducer, BatchContext};
use crate::engine::config::{ConfigError, RefinementConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runlog::RunLog;
use crate::engine::state::{AcceptanceState, AcceptedStep, RunCounters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// The collaborators of one run, resolved and loaded.
pub struct RefinementSetup {
    pub initial: Configuration,
    pub scorer: Box<dyn StructureScorer>,
    pub oracle: Box<dyn EnergyOracle>,
    pub moves: Vec<Box<dyn MoveGenerator>>,
    pub validators: Vec<Box<dyn Validator>>,
}

fn load_error(what: &'static str, path: &Path, reason: impl ToString) -> EngineError {
    EngineError::ConfigLoad {
        what,
        path: path.to_string_lossy().to_string(),
        reason: reason.to_string(),
    }
}

impl RefinementSetup {
    /// Loads the initial structure, experimental reference and energy oracle, and
    /// builds the configured policies from `registry`.
    #[instrument(skip_all, name = "load_setup")]
    pub fn load(config: &RefinementConfig, registry: &PolicyRegistry) -> Result<Self, EngineError> {
        let inputs = &config.inputs;

        let mut initial = PoscarFile::read_from_path(&inputs.structure_path)
            .map_err(|e| load_error("initial structure", &inputs.structure_path, e))?;
        initial.assign_oxidation_states(&config.oxidation_states);
        info!(
            sites = initial.len(),
            path = %inputs.structure_path.display(),
            "Loaded initial structure."
        );

        let scorer = PdfScorer::load_reference(&inputs.reference_path, config.pdf.clone())
            .map_err(|e| load_error("experimental reference", &inputs.reference_path, e))?;
        info!(
            points = scorer.reference().len(),
            "Loaded experimental reference."
        );

        let oracle = load_oracle(&inputs.oracle_path)
            .map_err(|e| load_error("energy oracle", &inputs.oracle_path, e))?;

        let moves = registry.build_moves(&config.policies.move_generators)?;
        let validators = registry.build_validators(&config.policies.validators)?;
        debug!(
            moves = ?moves.iter().map(|m| m.name()).collect::<Vec<_>>(),
            validators = ?validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            "Built policies."
        );

        Ok(Self {
            initial,
            scorer: Box::new(scorer),
            oracle,
            moves,
            validators,
        })
    }

    /// The first minimum-distance table exposed by a validator, if any.
    pub fn min_distance_table(&self) -> Option<&MinDistanceTable> {
        self.validators.iter().find_map(|v| v.min_distance_table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Initializing,
    Iterating,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No candidate survived; nothing was scored.
    EmptyBatch,
    Accepted { moved: usize },
    Rejected,
}

#[derive(Debug, Clone)]
pub struct RefinementResult {
    pub configuration: Configuration,
    pub initial_error: f64,
    pub initial_energy: f64,
    pub state: AcceptanceState,
    pub counters: RunCounters,
    pub history: Vec<AcceptedStep>,
}

/// Drives one run: batch production, merging, batch-level acceptance, logging
/// and quenching, one iteration per [`RefinementLoop::step`].
pub struct RefinementLoop<'a> {
    setup: &'a RefinementSetup,
    config: &'a RefinementConfig,
    phase: LoopPhase,
    index: PeriodicIndex,
    producer: BatchCandidateProducer,
    rng: StdRng,
    log: RunLog,
    current: Configuration,
    neighbors: NeighborList,
    initial_error: f64,
    initial_energy: f64,
    state: AcceptanceState,
    counters: RunCounters,
    history: Vec<AcceptedStep>,
}

impl<'a> RefinementLoop<'a> {
    /// Resets the run log, builds the neighbor list and evaluates the baseline.
    ///
    /// # Errors
    ///
    /// Any failure of the scorer or oracle on the initial configuration is fatal.
    #[instrument(skip_all, name = "initialize_refinement")]
    pub fn initialize(
        setup: &'a RefinementSetup,
        config: &'a RefinementConfig,
    ) -> Result<Self, EngineError> {
        if setup.moves.is_empty() {
            return Err(ConfigError::MissingParameter("move_generators").into());
        }
        let log = RunLog::create(&config.output.directory)?;
        let index = PeriodicIndex::new();
        let current = setup.initial.clone();
        let neighbors = index.rebuild_all(&current, config.neighbors.cutoff);

        let score = setup
            .scorer
            .score(&current, &neighbors)
            .map_err(|e| EngineError::BaselineEvaluation {
                stage: "structure",
                reason: e.to_string(),
            })?;
        let energy = setup
            .oracle
            .evaluate(&current)
            .map_err(|e| EngineError::BaselineEvaluation {
                stage: "energy",
                reason: e.to_string(),
            })?;
        let state = AcceptanceState::new(score.error, energy, &config.annealing);

        let producer = BatchCandidateProducer::new(&config.batch)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            error = score.error,
            energy,
            workers = producer.num_workers(),
            "Step 0. Baseline evaluated."
        );

        Ok(Self {
            setup,
            config,
            phase: LoopPhase::Iterating,
            index,
            producer,
            rng,
            log,
            current,
            neighbors,
            initial_error: score.error,
            initial_energy: energy,
            state,
            counters: RunCounters::default(),
            history: Vec::new(),
        })
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn state(&self) -> &AcceptanceState {
        &self.state
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    pub fn is_finished(&self) -> bool {
        self.counters.steps >= self.config.max_steps
    }

    fn write_snapshot(&self) {
        match self.setup.scorer.profile(&self.current, &self.neighbors) {
            Ok(Some(profile)) => {
                if let Err(e) = self.log.write_profile(&profile) {
                    warn!(error = %e, "Failed to write PDF snapshot.");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not compute PDF snapshot."),
        }
    }

    /// Runs one iteration and applies the quenching schedule.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        if self.phase != LoopPhase::Iterating {
            return Err(EngineError::Internal(format!(
                "step called in phase {:?}",
                self.phase
            )));
        }
        self.counters.steps += 1;
        let step = self.counters.steps;

        if step % self.config.output.snapshot_interval == 0 {
            self.write_snapshot();
        }

        let ctx = BatchContext {
            configuration: &self.current,
            neighbors: &self.neighbors,
            state: self.state,
            scorer: self.setup.scorer.as_ref(),
            oracle: self.setup.oracle.as_ref(),
            moves: &self.setup.moves,
            validators: &self.setup.validators,
            index: &self.index,
            strategy: self.config.neighbors.strategy,
        };
        let batch = self
            .producer
            .produce(&ctx, &mut self.rng, self.setup.min_distance_table());
        self.counters.moves_attempted += batch.attempted;
        self.log.record_decisions(&batch.decisions)?;

        let outcome = if batch.is_empty() {
            StepOutcome::EmptyBatch
        } else {
            let merged = self
                .current
                .apply_moves(&batch.records)
                .map_err(|e| EngineError::Internal(e.to_string()))?;
            let moved: Vec<usize> = batch.records.iter().map(|r| r.site_index).collect();
            let merged_neighbors = refresh(
                &self.index,
                self.config.neighbors.strategy,
                &merged,
                &self.neighbors,
                &moved,
            );
            self.judge_merged(step, merged, merged_neighbors, moved.len())?
        };

        self.state.quench(step, &self.config.annealing);
        info!(
            step,
            error = self.state.error,
            energy = self.state.energy,
            outcome = ?outcome,
            "Iteration complete."
        );
        if self.is_finished() {
            self.phase = LoopPhase::Terminated;
        }
        Ok(outcome)
    }

    fn judge_merged(
        &mut self,
        step: usize,
        merged: Configuration,
        merged_neighbors: NeighborList,
        moved: usize,
    ) -> Result<StepOutcome, EngineError> {
        let score = match self.setup.scorer.score(&merged, &merged_neighbors) {
            Ok(score) => score,
            Err(e) => {
                warn!(step, error = %e, "Scoring the merged batch failed; rejecting it.");
                return Ok(StepOutcome::Rejected);
            }
        };
        let energy = match self.setup.oracle.evaluate(&merged) {
            Ok(energy) => energy,
            Err(e) => {
                warn!(step, error = %e, "Energy of the merged batch failed; rejecting it.");
                return Ok(StepOutcome::Rejected);
            }
        };

        let decision = decide(
            &self.state,
            score.error,
            energy,
            self.rng.r#gen::<f64>(),
            DecisionScope::Batch,
        );
        self.log.record_decisions(&[decision])?;
        if !decision.accepted {
            return Ok(StepOutcome::Rejected);
        }

        self.current = merged;
        self.neighbors = merged_neighbors;
        self.state.promote(score.error, energy);
        self.counters.accepted_steps += 1;
        self.counters.moves += moved;
        let accepted = AcceptedStep {
            step,
            error: score.error,
            energy,
            moved,
        };
        self.history.push(accepted);

        self.log.write_structure(&self.current)?;
        self.log
            .record_accepted(&accepted, &self.counters, self.state.error_tolerance)?;
        self.log.append_frame(&self.current, self.history.len())?;
        info!(
            step,
            error = score.error,
            energy,
            moved,
            "Accepted batch."
        );
        Ok(StepOutcome::Accepted { moved })
    }

    /// Writes the final structure and hands back the run's results.
    pub fn finish(mut self) -> Result<RefinementResult, EngineError> {
        self.phase = LoopPhase::Terminated;
        self.log.write_structure(&self.current)?;
        Ok(RefinementResult {
            configuration: self.current,
            initial_error: self.initial_error,
            initial_energy: self.initial_energy,
            state: self.state,
            counters: self.counters,
            history: self.history,
        })
    }
}

/// Runs a complete refinement with already-loaded collaborators.
#[instrument(skip_all, name = "refinement_workflow")]
pub fn run(
    setup: &RefinementSetup,
    config: &RefinementConfig,
    reporter: &ProgressReporter,
) -> Result<RefinementResult, EngineError> {
    // === Phase 1: Baseline ===
    reporter.report(Progress::PhaseStart {
        name: "Evaluating Baseline",
    });
    let mut refinement = RefinementLoop::initialize(setup, config)?;
    reporter.report(Progress::Message(format!(
        "Baseline error = {}, energy = {}",
        refinement.state().error,
        refinement.state().energy
    )));
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: HRMC iterations ===
    reporter.report(Progress::PhaseStart { name: "Refining" });
    reporter.report(Progress::TaskStart {
        total_steps: config.max_steps as u64,
    });
    while !refinement.is_finished() {
        refinement.step()?;
        let state = refinement.state();
        reporter.report(Progress::StatusUpdate {
            text: format!(
                "step {}, error {:.6}, energy {:.5}",
                refinement.counters().steps,
                state.error,
                state.energy
            ),
        });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Output ===
    let result = refinement.finish()?;
    info!(
        accepted_steps = result.counters.accepted_steps,
        moves = result.counters.moves,
        moves_attempted = result.counters.moves_attempted,
        "Refinement complete."
    );
    reporter.report(Progress::Message(format!(
        "Accepted {} of {} steps ({} of {} moves)",
        result.counters.accepted_steps,
        result.counters.steps,
        result.counters.moves,
        result.counters.moves_attempted
    )));
    Ok(result)
}

/// Loads every collaborator named by `config` and runs the refinement.
pub fn run_from_config(
    config: &RefinementConfig,
    registry: &PolicyRegistry,
    reporter: &ProgressReporter,
) -> Result<RefinementResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Inputs",
    });
    let setup = RefinementSetup::load(config, registry)?;
    reporter.report(Progress::PhaseFinish);
    run(&setup, config, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::neighbors::NeighborStrategy;
    use crate::core::policies::{PolicyError, PolicySpec};
    use crate::core::scoring::{PdfProfile, Score, ScoringError};
    use crate::engine::config::RefinementConfigBuilder;
    use crate::engine::runlog::{
        ACCEPTANCE_LOG_FILE, ERROR_LOG_FILE, ERROR_PLOT_FILE, PDF_SNAPSHOT_FILE, STRUCTURE_FILE,
        TRAJECTORY_FILE,
    };
    use crate::engine::testing::{
        ConstantOracle, ConstantScorer, FailingOracle, RejectAll, hop_moves,
        two_atom_configuration,
    };
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn builder(output: &Path) -> RefinementConfigBuilder {
        RefinementConfigBuilder::new()
            .structure_path(PathBuf::from("initial.vasp"))
            .reference_path(PathBuf::from("gr.txt"))
            .oracle_path(PathBuf::from("oracle.toml"))
            .move_generator(PolicySpec::new(
                "atom-hop",
                toml::from_str("max-step = 0.1").unwrap(),
            ))
            .initial_temperature(300.0)
            .final_temperature(100.0)
            .temperature_decay(1.0)
            .initial_error_tolerance(1.0)
            .error_tolerance_decay(1.0)
            .batch_width(2)
            .num_workers(2)
            .neighbor_cutoff(3.0)
            .pdf_bin_size(0.1)
            .output_directory(output.to_path_buf())
            .snapshot_interval(5000)
            .max_steps(1)
            .seed(17)
    }

    fn fixture(
        scorer: Box<dyn StructureScorer>,
        oracle: Box<dyn EnergyOracle>,
        validators: Vec<Box<dyn Validator>>,
    ) -> RefinementSetup {
        RefinementSetup {
            initial: two_atom_configuration(),
            scorer,
            oracle,
            moves: hop_moves(),
            validators,
        }
    }

    /// Every call returns a strictly smaller error, so every decision is a strict improvement.
    struct DecreasingScorer(AtomicU64);

    impl StructureScorer for DecreasingScorer {
        fn score(&self, _: &Configuration, _: &NeighborList) -> Result<Score, ScoringError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Score {
                error: 1.0 / (n as f64 + 1.0),
                calibration_slope: 1.0,
            })
        }

        fn profile(
            &self,
            _: &Configuration,
            _: &NeighborList,
        ) -> Result<Option<PdfProfile>, ScoringError> {
            Ok(Some(PdfProfile {
                r: vec![1.0],
                calculated: vec![0.0],
                experimental: vec![0.0],
                calibration_slope: 1.0,
            }))
        }
    }

    #[test]
    fn constant_scorer_run_accepts_tied_batch_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(ConstantOracle(0.0)),
            Vec::new(),
        );

        let result = run(&setup, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.counters.steps, 1);
        // Equal error and energy give p = exp(0) = 1, so the batch is taken.
        assert_eq!(result.counters.accepted_steps, 1);
        assert_eq!((result.state.error, result.state.energy), (1.0, 0.0));
        assert_eq!(result.state.temperature, 300.0);
        assert_eq!(result.state.error_tolerance, 1.0);
        assert_eq!(result.configuration.len(), 2);
        assert_ne!(result.configuration, setup.initial);

        let acceptance = fs::read_to_string(dir.path().join(ACCEPTANCE_LOG_FILE)).unwrap();
        assert!(acceptance.lines().any(|l| l == "batch: true, 1, 1, 0"));
    }

    #[test]
    fn zero_width_batches_run_to_max_steps_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).batch_width(0).max_steps(5).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(ConstantOracle(0.0)),
            Vec::new(),
        );

        let result = run(&setup, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.counters.steps, 5);
        assert_eq!(result.counters.accepted_steps, 0);
        assert_eq!(result.counters.moves_attempted, 0);
        assert_eq!(result.configuration, setup.initial);
        assert!(result.history.is_empty());
        assert!(!dir.path().join(ERROR_LOG_FILE).exists());
        assert!(dir.path().join(STRUCTURE_FILE).exists());
    }

    #[test]
    fn rejecting_validator_leaves_configuration_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).max_steps(3).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(ConstantOracle(0.0)),
            vec![Box::new(RejectAll)],
        );

        let result = run(&setup, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.configuration, setup.initial);
        assert_eq!(result.counters.moves_attempted, 6);
        assert!(!dir.path().join(ACCEPTANCE_LOG_FILE).exists());
    }

    #[test]
    fn baseline_oracle_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(FailingOracle { baseline: None }),
            Vec::new(),
        );
        let err = run(&setup, &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::BaselineEvaluation {
                stage: "energy",
                ..
            }
        ));
    }

    #[test]
    fn candidate_oracle_failures_do_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).max_steps(3).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(FailingOracle {
                baseline: Some(two_atom_configuration()),
            }),
            Vec::new(),
        );
        let result = run(&setup, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.counters.steps, 3);
        assert_eq!(result.counters.accepted_steps, 0);
        assert_eq!(result.configuration, setup.initial);
    }

    #[test]
    fn improving_run_accepts_every_step_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path())
            .max_steps(4)
            .snapshot_interval(2)
            .neighbor_strategy(NeighborStrategy::Patch)
            .build()
            .unwrap();
        let setup = fixture(
            Box::new(DecreasingScorer(AtomicU64::new(0))),
            Box::new(ConstantOracle(0.0)),
            Vec::new(),
        );

        let result = run(&setup, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.counters.accepted_steps, 4);
        assert_eq!(result.history.len(), 4);
        assert!(result.history.windows(2).all(|w| w[1].error < w[0].error));
        assert!(result.state.error < result.initial_error);
        assert_ne!(result.configuration, setup.initial);

        let errors = fs::read_to_string(dir.path().join(ERROR_LOG_FILE)).unwrap();
        assert_eq!(errors.lines().count(), 4);
        let plotting = fs::read_to_string(dir.path().join(ERROR_PLOT_FILE)).unwrap();
        assert!(plotting.starts_with("1 "));
        let trajectory = fs::read_to_string(dir.path().join(TRAJECTORY_FILE)).unwrap();
        assert_eq!(trajectory.matches("Direct configuration=").count(), 4);
        let decisions = fs::read_to_string(dir.path().join(ACCEPTANCE_LOG_FILE)).unwrap();
        assert_eq!(decisions.matches("batch: true, n/a").count(), 4);
        assert!(dir.path().join(PDF_SNAPSHOT_FILE).exists());

        let restored = PoscarFile::read_from_path(dir.path().join(STRUCTURE_FILE)).unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();
        let mut results = Vec::new();
        for dir in [&first_dir, &second_dir] {
            let config = builder(dir.path()).max_steps(3).build().unwrap();
            let setup = fixture(
                Box::new(ConstantScorer(1.0)),
                Box::new(ConstantOracle(0.0)),
                Vec::new(),
            );
            results.push(run(&setup, &config, &ProgressReporter::new()).unwrap());
        }
        assert_eq!(results[0].configuration, results[1].configuration);
        assert_eq!(results[0].counters, results[1].counters);
    }

    #[test]
    fn stepping_after_termination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).batch_width(0).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(ConstantOracle(0.0)),
            Vec::new(),
        );
        let mut refinement = RefinementLoop::initialize(&setup, &config).unwrap();
        assert_eq!(refinement.phase(), LoopPhase::Iterating);
        assert_eq!(refinement.step().unwrap(), StepOutcome::EmptyBatch);
        assert_eq!(refinement.phase(), LoopPhase::Terminated);
        assert!(matches!(refinement.step(), Err(EngineError::Internal(_))));
    }

    #[test]
    fn progress_reports_every_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path()).batch_width(0).max_steps(3).build().unwrap();
        let setup = fixture(
            Box::new(ConstantScorer(1.0)),
            Box::new(ConstantOracle(0.0)),
            Vec::new(),
        );
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
                events.lock().unwrap().push(event);
            }));
            run(&setup, &config, &reporter).unwrap();
        }
        let events = events.into_inner().unwrap();
        let increments = events
            .iter()
            .filter(|e| matches!(e, Progress::TaskIncrement))
            .count();
        let statuses = events
            .iter()
            .filter(|e| matches!(e, Progress::StatusUpdate { .. }))
            .count();
        assert_eq!((increments, statuses), (3, 3));
        assert!(events.contains(&Progress::TaskStart { total_steps: 3 }));
    }

    const SIMPLE_CUBIC: &str = "\
argon
1.0
  4.0 0.0 0.0
  0.0 4.0 0.0
  0.0 0.0 4.0
Ar
8
Direct
  0.0 0.0 0.0
  0.5 0.0 0.0
  0.0 0.5 0.0
  0.0 0.0 0.5
  0.5 0.5 0.0
  0.5 0.0 0.5
  0.0 0.5 0.5
  0.5 0.5 0.5
";

    fn write_inputs(dir: &Path) -> RefinementConfigBuilder {
        let structure = dir.join("initial.vasp");
        let reference = dir.join("gr.txt");
        let oracle = dir.join("oracle.toml");
        fs::write(&structure, SIMPLE_CUBIC).unwrap();
        let curve: String = (0..90)
            .map(|k| {
                let r = 0.5 + 0.04 * k as f64;
                format!("{} {}\n", r, (2.0 * r).sin())
            })
            .collect();
        fs::write(&reference, format!("# r G(r)\n{}", curve)).unwrap();
        fs::write(
            &oracle,
            "kind = \"pair-potential\"\ncutoff = 4.0\n\n[[pairs]]\nspecies = [\"Ar\", \"Ar\"]\nform = \"lennard-jones\"\nepsilon = 0.238\nsigma = 3.4\n",
        )
        .unwrap();

        builder(&dir.join("out"))
            .structure_path(structure)
            .reference_path(reference)
            .oracle_path(oracle)
            .neighbor_cutoff(4.5)
            .pdf_bin_size(0.04)
            .batch_width(4)
            .max_steps(2)
    }

    #[test]
    fn full_run_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_inputs(dir.path())
            .validator(PolicySpec::new(
                "min-distance",
                toml::from_str("distances = { \"Ar-Ar\" = 1.5 }").unwrap(),
            ))
            .build()
            .unwrap();

        let registry = PolicyRegistry::with_builtins();
        let result = run_from_config(&config, &registry, &ProgressReporter::new()).unwrap();

        assert_eq!(result.counters.steps, 2);
        assert_eq!(result.counters.moves_attempted, 8);
        assert_eq!(result.configuration.len(), 8);
        assert!(result.initial_error.is_finite());
        assert!(dir.path().join("out").join(STRUCTURE_FILE).exists());
    }

    #[test]
    fn unknown_policy_fails_before_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_inputs(dir.path()).build().unwrap();
        config.policies.move_generators = vec![PolicySpec::new("swap", toml::Table::new())];
        let registry = PolicyRegistry::with_builtins();
        let err = RefinementSetup::load(&config, &registry).err().unwrap();
        assert!(matches!(
            err,
            EngineError::Policy(PolicyError::UnknownPolicy { .. })
        ));
    }

    #[test]
    fn missing_structure_is_a_config_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = builder(dir.path())
            .structure_path(dir.path().join("missing.vasp"))
            .build()
            .unwrap();
        let registry = PolicyRegistry::with_builtins();
        let err = RefinementSetup::load(&config, &registry).err().unwrap();
        assert!(matches!(
            err,
            EngineError::ConfigLoad {
                what: "initial structure",
                ..
            }
        ));
    }
}
