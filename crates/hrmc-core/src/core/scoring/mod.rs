//! Structural scoring against an experimental reference.
//!
//! A [`StructureScorer`] turns a configuration and its current neighbor list into
//! a non-negative mismatch error (lower is better) and a calibration slope. Only
//! the error takes part in acceptance decisions; the slope and the optional
//! [`PdfProfile`] exist for diagnostics.

pub mod pdf;

use crate::core::models::configuration::Configuration;
use crate::core::neighbors::NeighborList;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Neighbor list (revision {list}) is stale for configuration revision {configuration}")]
    StaleNeighborList { list: u64, configuration: u64 },
    #[error("Cannot score an empty configuration")]
    EmptyConfiguration,
    #[error("Calculated and experimental curves do not overlap (neighbor cutoff {cutoff} Å)")]
    NoOverlap { cutoff: f64 },
    #[error("Scorer produced a non-finite error")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub error: f64,
    pub calibration_slope: f64,
}

/// Calculated and experimental curves on the experimental r grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfProfile {
    pub r: Vec<f64>,
    /// Calculated G(r), already multiplied by the calibration slope.
    pub calculated: Vec<f64>,
    pub experimental: Vec<f64>,
    pub calibration_slope: f64,
}

pub trait StructureScorer: Send + Sync {
    fn score(
        &self,
        configuration: &Configuration,
        neighbors: &NeighborList,
    ) -> Result<Score, ScoringError>;

    /// Curves for diagnostic snapshots. Scorers without a curve view return `None`.
    fn profile(
        &self,
        configuration: &Configuration,
        neighbors: &NeighborList,
    ) -> Result<Option<PdfProfile>, ScoringError> {
        let _ = (configuration, neighbors);
        Ok(None)
    }
}

pub(crate) fn ensure_current(
    configuration: &Configuration,
    neighbors: &NeighborList,
) -> Result<(), ScoringError> {
    if neighbors.is_current_for(configuration) {
        Ok(())
    } else {
        Err(ScoringError::StaleNeighborList {
            list: neighbors.revision(),
            configuration: configuration.revision(),
        })
    }
}
