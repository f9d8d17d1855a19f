use super::{MoveGenerator, PolicyError, parse_params};
use crate::core::models::configuration::{Configuration, MoveRecord};
use nalgebra::Vector3;
use rand::{Rng, RngCore};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomHopParams {
    /// Maximum displacement in Angstroms.
    pub max_step: f64,
}

/// Displaces one randomly chosen site by a vector drawn uniformly from a ball
/// of radius `max_step`. The moved site is wrapped back into the cell.
#[derive(Debug, Clone)]
pub struct AtomHop {
    max_step: f64,
}

impl AtomHop {
    pub const NAME: &'static str = "atom-hop";

    pub fn new(max_step: f64) -> Result<Self, PolicyError> {
        if !(max_step.is_finite() && max_step > 0.0) {
            return Err(PolicyError::Invalid {
                name: Self::NAME.to_string(),
                reason: format!("max-step must be positive, got {}", max_step),
            });
        }
        Ok(Self { max_step })
    }

    pub fn from_params(params: &toml::Table) -> Result<Self, PolicyError> {
        let parsed: AtomHopParams = parse_params(Self::NAME, params)?;
        Self::new(parsed.max_step)
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }
}

fn unit_ball_sample(rng: &mut dyn RngCore) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.norm_squared() <= 1.0 {
            return v;
        }
    }
}

impl MoveGenerator for AtomHop {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn propose(&self, configuration: &Configuration, rng: &mut dyn RngCore) -> Option<MoveRecord> {
        if configuration.is_empty() {
            return None;
        }
        let site_index = rng.gen_range(0..configuration.len());
        let site = configuration.site(site_index)?;
        let target = *site.coords() + unit_ball_sample(rng) * self.max_step;
        let lattice = configuration.lattice();
        Some(MoveRecord {
            site_index,
            site: site.with_fractional(lattice.to_fractional(&target), lattice),
        })
    }
}
