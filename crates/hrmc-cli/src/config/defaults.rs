use hrmc::core::neighbors::NeighborStrategy;
use hrmc::core::policies::moves::AtomHop;
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub max_steps: usize,
    pub initial_temperature: f64,
    pub final_temperature: f64,
    pub temperature_decay: f64,
    pub initial_error_tolerance: f64,
    pub error_tolerance_decay: f64,
    pub batch_width: usize,
    pub neighbor_cutoff: f64,
    pub neighbor_strategy: NeighborStrategy,
    pub pdf_bin_size: f64,
    pub snapshot_interval: usize,
    pub output_directory: PathBuf,
    /// Move generator used when the run file lists none.
    pub move_generator: &'static str,
    pub max_step: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            initial_temperature: 1000.0,
            final_temperature: 300.0,
            temperature_decay: 0.99,
            initial_error_tolerance: 0.002,
            error_tolerance_decay: 0.999,
            batch_width: 8,
            neighbor_cutoff: 10.0,
            neighbor_strategy: NeighborStrategy::FullRebuild,
            pdf_bin_size: 0.04,
            snapshot_interval: 5000,
            output_directory: PathBuf::from("."),
            move_generator: AtomHop::NAME,
            max_step: 0.4,
        }
    }
}
