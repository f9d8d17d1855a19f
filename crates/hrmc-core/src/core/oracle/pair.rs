use super::potentials::{buckingham, coulomb, lennard_jones_12_6};
use super::{EnergyEvaluationError, EnergyOracle, OracleLoadError};
use crate::core::models::configuration::Configuration;
use crate::core::models::site::Site;
use crate::core::neighbors::SpatialIndex;
use crate::core::neighbors::periodic::PeriodicIndex;
use serde::Deserialize;
use std::collections::HashMap;

fn default_dielectric() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum PairTerm {
    /// `a·exp(-r/rho) - c/r⁶`
    Buckingham { a: f64, rho: f64, c: f64 },
    /// `4ε[(σ/r)¹² - (σ/r)⁶]`
    LennardJones { epsilon: f64, sigma: f64 },
}

impl PairTerm {
    #[inline]
    fn energy(&self, dist: f64) -> f64 {
        match *self {
            PairTerm::Buckingham { a, rho, c } => buckingham(dist, a, rho, c),
            PairTerm::LennardJones { epsilon, sigma } => lennard_jones_12_6(dist, epsilon, sigma),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairEntry {
    pub species: [String; 2],
    #[serde(flatten)]
    pub term: PairTerm,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PairPotentialConfig {
    /// Interaction cutoff in Angstroms.
    pub cutoff: f64,
    #[serde(default = "default_dielectric")]
    pub dielectric: f64,
    /// Point charges by species. Species not listed fall back to their
    /// oxidation state, then to zero.
    #[serde(default)]
    pub charges: HashMap<String, f64>,
    #[serde(default)]
    pub pairs: Vec<PairEntry>,
}

/// In-process pair-potential energy: short-range pair terms plus truncated
/// Coulomb, summed over every periodic image within the cutoff.
#[derive(Debug, Clone)]
pub struct PairPotentialOracle {
    cutoff: f64,
    dielectric: f64,
    charges: HashMap<String, f64>,
    terms: HashMap<(String, String), PairTerm>,
    index: PeriodicIndex,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PairPotentialOracle {
    pub fn new(config: PairPotentialConfig) -> Result<Self, OracleLoadError> {
        if !(config.cutoff.is_finite() && config.cutoff > 0.0) {
            return Err(OracleLoadError::Invalid(format!(
                "cutoff must be positive, got {}",
                config.cutoff
            )));
        }
        if !(config.dielectric.is_finite() && config.dielectric > 0.0) {
            return Err(OracleLoadError::Invalid(format!(
                "dielectric must be positive, got {}",
                config.dielectric
            )));
        }
        let mut terms = HashMap::new();
        for entry in config.pairs {
            let key = pair_key(&entry.species[0], &entry.species[1]);
            if terms.insert(key.clone(), entry.term).is_some() {
                return Err(OracleLoadError::Invalid(format!(
                    "duplicate pair term for {}-{}",
                    key.0, key.1
                )));
            }
        }
        Ok(Self {
            cutoff: config.cutoff,
            dielectric: config.dielectric,
            charges: config.charges,
            terms,
            index: PeriodicIndex::new(),
        })
    }

    fn charge(&self, site: &Site) -> f64 {
        self.charges
            .get(&site.species)
            .copied()
            .or(site.oxidation_state)
            .unwrap_or(0.0)
    }
}

impl EnergyOracle for PairPotentialOracle {
    fn evaluate(&self, configuration: &Configuration) -> Result<f64, EnergyEvaluationError> {
        let neighbors = self.index.rebuild_all(configuration, self.cutoff);
        let sites = configuration.sites();
        let mut total = 0.0;
        for (i, site_neighbors) in neighbors.iter() {
            let a = &sites[i];
            let qa = self.charge(a);
            for neighbor in site_neighbors {
                let b = &sites[neighbor.index];
                let mut e = coulomb(neighbor.distance, qa, self.charge(b), self.dielectric);
                if let Some(term) = self.terms.get(&pair_key(&a.species, &b.species)) {
                    e += term.energy(neighbor.distance);
                }
                total += e;
            }
        }
        // Every pair was visited from both ends.
        let energy = 0.5 * total;
        if energy.is_finite() {
            Ok(energy)
        } else {
            Err(EnergyEvaluationError::NonFinite(energy))
        }
    }
}
