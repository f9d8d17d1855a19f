use super::{Candidate, PolicyError, Validator, parse_params};
use crate::core::neighbors::NeighborQuery;
use serde::Deserialize;
use std::collections::HashMap;

/// Symmetric species-pair minimum distances in Angstroms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinDistanceTable {
    distances: HashMap<(String, String), f64>,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl MinDistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: &str, b: &str, distance: f64) {
        self.distances.insert(pair_key(a, b), distance);
    }

    /// The minimum distance for a species pair, in either order.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.distances.get(&pair_key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// The largest configured distance, used as the search radius.
    pub fn max_distance(&self) -> f64 {
        self.distances.values().copied().fold(0.0, f64::max)
    }

    /// Parses `"A-B" = distance` entries.
    fn from_keyed(name: &str, keyed: &HashMap<String, f64>) -> Result<Self, PolicyError> {
        let mut table = Self::new();
        for (key, &distance) in keyed {
            let (a, b) = key
                .split_once('-')
                .filter(|(a, b)| !a.is_empty() && !b.is_empty())
                .ok_or_else(|| PolicyError::Invalid {
                    name: name.to_string(),
                    reason: format!("pair key '{}' is not of the form 'A-B'", key),
                })?;
            if !(distance.is_finite() && distance >= 0.0) {
                return Err(PolicyError::Invalid {
                    name: name.to_string(),
                    reason: format!("distance for '{}' must be non-negative", key),
                });
            }
            table.insert(a.trim(), b.trim(), distance);
        }
        Ok(table)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct MinDistanceParams {
    distances: HashMap<String, f64>,
}

/// Rejects a candidate whose moved site sits closer than the configured minimum
/// to any neighbor, periodic images included. Pairs without an entry are
/// unconstrained.
#[derive(Debug, Clone)]
pub struct MinDistance {
    table: MinDistanceTable,
}

impl MinDistance {
    pub const NAME: &'static str = "min-distance";

    pub fn new(table: MinDistanceTable) -> Self {
        Self { table }
    }

    pub fn from_params(params: &toml::Table) -> Result<Self, PolicyError> {
        let parsed: MinDistanceParams = parse_params(Self::NAME, params)?;
        Ok(Self::new(MinDistanceTable::from_keyed(
            Self::NAME,
            &parsed.distances,
        )?))
    }
}

impl Validator for MinDistance {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, candidate: &Candidate<'_>) -> bool {
        let radius = self.table.max_distance();
        if radius <= 0.0 {
            return true;
        }
        let Some(moved) = candidate.configuration.site(candidate.moved) else {
            return false;
        };
        let sites = candidate.configuration.sites();
        candidate
            .index
            .neighbors_within(
                candidate.configuration,
                NeighborQuery::Site(candidate.moved),
                radius,
            )
            .iter()
            .all(|n| match self.table.get(&moved.species, &sites[n.index].species) {
                Some(min) => n.distance >= min,
                None => true,
            })
    }

    fn min_distance_table(&self) -> Option<&MinDistanceTable> {
        Some(&self.table)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct MaxCoordinationParams {
    cutoff: f64,
    limits: HashMap<String, usize>,
}

/// Caps the number of neighbors within `cutoff` per species.
///
/// The moved site and every site around it are checked, since the move changes
/// their coordination too. Species without a limit are unconstrained.
#[derive(Debug, Clone)]
pub struct MaxCoordination {
    cutoff: f64,
    limits: HashMap<String, usize>,
}

impl MaxCoordination {
    pub const NAME: &'static str = "max-coordination";

    pub fn new(cutoff: f64, limits: HashMap<String, usize>) -> Result<Self, PolicyError> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(PolicyError::Invalid {
                name: Self::NAME.to_string(),
                reason: format!("cutoff must be positive, got {}", cutoff),
            });
        }
        Ok(Self { cutoff, limits })
    }

    pub fn from_params(params: &toml::Table) -> Result<Self, PolicyError> {
        let parsed: MaxCoordinationParams = parse_params(Self::NAME, params)?;
        Self::new(parsed.cutoff, parsed.limits)
    }

    fn within_limit(&self, candidate: &Candidate<'_>, site_index: usize) -> bool {
        let Some(site) = candidate.configuration.site(site_index) else {
            return false;
        };
        let Some(&limit) = self.limits.get(&site.species) else {
            return true;
        };
        let count = candidate
            .index
            .neighbors_within(
                candidate.configuration,
                NeighborQuery::Site(site_index),
                self.cutoff,
            )
            .len();
        count <= limit
    }
}

impl Validator for MaxCoordination {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, candidate: &Candidate<'_>) -> bool {
        if !self.within_limit(candidate, candidate.moved) {
            return false;
        }
        candidate
            .index
            .neighbors_within(
                candidate.configuration,
                NeighborQuery::Site(candidate.moved),
                self.cutoff,
            )
            .iter()
            .all(|n| self.within_limit(candidate, n.index))
    }
}
