use super::config::AnnealingConfig;

/// The refinement loop's best-known view of the run.
///
/// Error and energy change only when a batch is accepted; temperature and error
/// tolerance change only through [`AcceptanceState::quench`]. Batch workers read
/// a copy taken at batch start and never write to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceState {
    pub error: f64,
    pub energy: f64,
    pub temperature: f64,
    pub error_tolerance: f64,
}

impl AcceptanceState {
    pub fn new(error: f64, energy: f64, annealing: &AnnealingConfig) -> Self {
        Self {
            error,
            energy,
            temperature: annealing.initial_temperature,
            error_tolerance: annealing.initial_error_tolerance,
        }
    }

    pub(crate) fn promote(&mut self, error: f64, energy: f64) {
        self.error = error;
        self.energy = energy;
    }

    /// Applies the quenching schedule after iteration `step` (1-based).
    ///
    /// Temperature is multiplied by `q_T^step` while it is above the floor;
    /// error tolerance is multiplied by `q_σ^(step/2)` unconditionally.
    pub fn quench(&mut self, step: usize, annealing: &AnnealingConfig) {
        if self.temperature > annealing.final_temperature {
            self.temperature *= annealing.temperature_decay.powf(step as f64);
        }
        self.error_tolerance *= annealing.error_tolerance_decay.powf(step as f64 / 2.0);
    }
}

/// Move bookkeeping across the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub steps: usize,
    pub accepted_steps: usize,
    /// Sites moved by accepted batches.
    pub moves: usize,
    /// Candidate attempts dispatched, accepted or not.
    pub moves_attempted: usize,
}

/// One accepted step, in acceptance order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedStep {
    pub step: usize,
    pub error: f64,
    pub energy: f64,
    pub moved: usize,
}
