use crate::core::models::configuration::Configuration;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::Site;
use crate::core::neighbors::NeighborList;
use crate::core::oracle::{EnergyEvaluationError, EnergyOracle};
use crate::core::policies::moves::AtomHop;
use crate::core::policies::{Candidate, MoveGenerator, Validator};
use crate::core::scoring::{Score, ScoringError, StructureScorer};
use nalgebra::Vector3;

pub struct ConstantScorer(pub f64);

impl StructureScorer for ConstantScorer {
    fn score(&self, _: &Configuration, _: &NeighborList) -> Result<Score, ScoringError> {
        Ok(Score {
            error: self.0,
            calibration_slope: 1.0,
        })
    }
}

pub struct ConstantOracle(pub f64);

impl EnergyOracle for ConstantOracle {
    fn evaluate(&self, _: &Configuration) -> Result<f64, EnergyEvaluationError> {
        Ok(self.0)
    }
}

/// Fails for every configuration except ones equal to `baseline`.
pub struct FailingOracle {
    pub baseline: Option<Configuration>,
}

impl EnergyOracle for FailingOracle {
    fn evaluate(&self, configuration: &Configuration) -> Result<f64, EnergyEvaluationError> {
        match &self.baseline {
            Some(baseline) if baseline == configuration => Ok(0.0),
            _ => Err(EnergyEvaluationError::UnparsableOutput {
                output: "no energy".to_string(),
            }),
        }
    }
}

pub struct RejectAll;

impl Validator for RejectAll {
    fn name(&self) -> &str {
        "reject-all"
    }

    fn check(&self, _: &Candidate<'_>) -> bool {
        false
    }
}

pub fn two_atom_configuration() -> Configuration {
    let lattice = Lattice::cubic(6.0).unwrap();
    let sites = vec![
        Site::new("Al", Vector3::new(0.25, 0.5, 0.5), &lattice),
        Site::new("O", Vector3::new(0.75, 0.5, 0.5), &lattice),
    ];
    Configuration::new(lattice, sites)
}

pub fn hop_moves() -> Vec<Box<dyn MoveGenerator>> {
    vec![Box::new(AtomHop::new(0.1).unwrap())]
}
