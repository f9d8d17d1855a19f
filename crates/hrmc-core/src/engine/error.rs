use thiserror::Error;

use super::config::ConfigError;
use super::runlog::RunLogError;
use crate::core::policies::PolicyError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load {what} from '{path}': {reason}")]
    ConfigLoad {
        what: &'static str,
        path: String,
        reason: String,
    },

    #[error("Baseline {stage} evaluation failed: {reason}")]
    BaselineEvaluation { stage: &'static str, reason: String },

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Run log error: {0}")]
    RunLog(#[from] RunLogError),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
