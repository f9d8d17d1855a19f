use super::acceptance::{Decision, DecisionScope, decide};
use super::config::BatchConfig;
use super::error::EngineError;
use super::state::AcceptanceState;
use crate::core::models::configuration::{Configuration, MoveRecord};
use crate::core::neighbors::{NeighborList, NeighborStrategy, SpatialIndex, refresh};
use crate::core::oracle::EnergyOracle;
use crate::core::policies::validators::MinDistanceTable;
use crate::core::policies::{Candidate, MoveGenerator, Validator, all_valid};
use crate::core::scoring::StructureScorer;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Everything a batch attempt reads. Shared read-only by all workers.
pub struct BatchContext<'a> {
    /// Snapshot of the current configuration at batch start.
    pub configuration: &'a Configuration,
    /// Neighbor list of `configuration`.
    pub neighbors: &'a NeighborList,
    pub state: AcceptanceState,
    pub scorer: &'a dyn StructureScorer,
    pub oracle: &'a dyn EnergyOracle,
    pub moves: &'a [Box<dyn MoveGenerator>],
    pub validators: &'a [Box<dyn Validator>],
    pub index: &'a dyn SpatialIndex,
    pub strategy: NeighborStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The chosen generator could not propose a move.
    NoMove,
    /// A validator rejected the candidate.
    Invalid,
    /// Scoring or energy evaluation failed; the attempt is discarded.
    Failed(String),
    Rejected(Decision),
    Accepted { record: MoveRecord, decision: Decision },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Surviving moves after conflict resolution, ordered by site index.
    pub records: Vec<MoveRecord>,
    pub attempted: usize,
    /// Single-candidate decisions in attempt order.
    pub decisions: Vec<Decision>,
    pub invalid: usize,
    pub failures: usize,
    /// Accepted candidates removed by conflict resolution.
    pub pruned: usize,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn attempt(ctx: &BatchContext<'_>, seed: u64) -> AttemptOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    if ctx.moves.is_empty() {
        return AttemptOutcome::NoMove;
    }
    let generator = &ctx.moves[rng.gen_range(0..ctx.moves.len())];
    let Some(record) = generator.propose(ctx.configuration, &mut rng) else {
        return AttemptOutcome::NoMove;
    };

    let candidate = match ctx.configuration.apply_moves(std::slice::from_ref(&record)) {
        Ok(candidate) => candidate,
        Err(e) => return AttemptOutcome::Failed(e.to_string()),
    };
    let view = Candidate {
        configuration: &candidate,
        moved: record.site_index,
        index: ctx.index,
    };
    if !all_valid(ctx.validators, &view) {
        return AttemptOutcome::Invalid;
    }

    let neighbors = refresh(
        ctx.index,
        ctx.strategy,
        &candidate,
        ctx.neighbors,
        &[record.site_index],
    );
    let score = match ctx.scorer.score(&candidate, &neighbors) {
        Ok(score) => score,
        Err(e) => return AttemptOutcome::Failed(e.to_string()),
    };
    let energy = match ctx.oracle.evaluate(&candidate) {
        Ok(energy) => energy,
        Err(e) => return AttemptOutcome::Failed(e.to_string()),
    };

    let decision = decide(
        &ctx.state,
        score.error,
        energy,
        rng.r#gen::<f64>(),
        DecisionScope::Single,
    );
    if decision.accepted {
        AttemptOutcome::Accepted { record, decision }
    } else {
        AttemptOutcome::Rejected(decision)
    }
}

/// Drops conflicting moves from a batch.
///
/// Records are ordered by site index, and only the last record in attempt
/// order survives for a site moved more than once. Then, for every pair `i < j` of surviving
/// records whose species pair has an entry in `table`, the earlier record `i`
/// is dropped if the two moved sites are closer than the minimum distance.
/// Dropped records take no part in later comparisons. Without a table only
/// duplicate sites are removed.
///
/// Returns the survivors and the number of records dropped.
pub fn resolve_conflicts(
    mut records: Vec<MoveRecord>,
    table: Option<&MinDistanceTable>,
) -> (Vec<MoveRecord>, usize) {
    let total = records.len();
    records.reverse();
    records.sort_by_key(|r| r.site_index);
    records.dedup_by_key(|r| r.site_index);

    if let Some(table) = table {
        let mut alive = vec![true; records.len()];
        for (i, j) in (0..records.len()).tuple_combinations() {
            if !alive[i] || !alive[j] {
                continue;
            }
            let (a, b) = (&records[i].site, &records[j].site);
            if let Some(min) = table.get(&a.species, &b.species) {
                if a.distance_to(b) < min {
                    alive[i] = false;
                }
            }
        }
        let mut flags = alive.into_iter();
        records.retain(|_| flags.next().unwrap_or(false));
    }

    let pruned = total - records.len();
    (records, pruned)
}

/// Runs batches of independent candidate attempts on a bounded worker pool.
pub struct BatchCandidateProducer {
    pool: rayon::ThreadPool,
    width: usize,
}

impl BatchCandidateProducer {
    pub fn new(config: &BatchConfig) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_workers.unwrap_or(0))
            .thread_name(|i| format!("hrmc-worker-{}", i))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
        Ok(Self {
            pool,
            width: config.batch_width,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Dispatches one batch and waits for every attempt to finish.
    ///
    /// Each attempt gets its own seed drawn from `rng`, so results do not depend
    /// on how attempts are scheduled across workers.
    #[instrument(skip_all, name = "batch_candidates", fields(width = self.width))]
    pub fn produce(
        &self,
        ctx: &BatchContext<'_>,
        rng: &mut StdRng,
        min_distances: Option<&MinDistanceTable>,
    ) -> BatchOutcome {
        let seeds: Vec<u64> = (0..self.width).map(|_| rng.r#gen::<u64>()).collect();
        let outcomes: Vec<AttemptOutcome> = self
            .pool
            .install(|| seeds.into_par_iter().map(|seed| attempt(ctx, seed)).collect());

        let mut batch = BatchOutcome {
            attempted: self.width,
            ..BatchOutcome::default()
        };
        let mut accepted = Vec::new();
        for outcome in outcomes {
            match outcome {
                AttemptOutcome::NoMove => {}
                AttemptOutcome::Invalid => batch.invalid += 1,
                AttemptOutcome::Failed(reason) => {
                    debug!(reason = %reason, "Candidate evaluation failed; discarding attempt.");
                    batch.failures += 1;
                }
                AttemptOutcome::Rejected(decision) => batch.decisions.push(decision),
                AttemptOutcome::Accepted { record, decision } => {
                    batch.decisions.push(decision);
                    accepted.push(record);
                }
            }
        }

        let (records, pruned) = resolve_conflicts(accepted, min_distances);
        batch.records = records;
        batch.pruned = pruned;
        debug!(
            survivors = batch.records.len(),
            invalid = batch.invalid,
            failures = batch.failures,
            pruned = batch.pruned,
            "Batch complete."
        );
        batch
    }
}
