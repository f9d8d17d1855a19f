use super::lattice::Lattice;
use super::site::Site;
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Site index {index} is out of range for a configuration of {len} sites")]
    SiteOutOfRange { index: usize, len: usize },
    #[error("Move replaces a '{expected}' site with a '{found}' site at index {index}")]
    SpeciesMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Identifies one moved site and the state it was moved to.
///
/// Candidates travel between the batch workers and the refinement loop as
/// records rather than whole configurations; they are merged into a base
/// configuration with [`Configuration::apply_moves`].
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub site_index: usize,
    pub site: Site,
}

/// An ordered collection of sites inside a periodic lattice.
///
/// Every coordinate mutation stamps the configuration with a fresh, process-wide
/// unique revision. Derived data (neighbor lists) records the revision it was
/// built from, which lets consumers detect stale derived data. Clones share the
/// revision of their source because their geometry is identical.
#[derive(Debug, Clone)]
pub struct Configuration {
    lattice: Lattice,
    sites: Vec<Site>,
    revision: u64,
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.lattice == other.lattice && self.sites == other.sites
    }
}

impl Configuration {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self {
            lattice,
            sites,
            revision: next_revision(),
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: usize) -> Option<&Site> {
        self.sites.get(index)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The flat cartesian coordinate table used for distance math.
    pub fn coordinate_table(&self) -> Vec<Point3<f64>> {
        self.sites.iter().map(|s| *s.coords()).collect()
    }

    /// Distinct species in the configuration, sorted alphabetically.
    pub fn species(&self) -> BTreeSet<&str> {
        self.sites.iter().map(|s| s.species.as_str()).collect()
    }

    /// Number density in atoms per cubic Angstrom.
    pub fn number_density(&self) -> f64 {
        self.sites.len() as f64 / self.lattice.volume()
    }

    /// Replaces one site in place.
    ///
    /// # Errors
    ///
    /// Fails if the index is out of range or the replacement changes the species;
    /// refinement moves displace atoms, they never transmute them.
    pub fn replace_site(&mut self, index: usize, site: Site) -> Result<(), ConfigurationError> {
        let len = self.sites.len();
        let slot = self
            .sites
            .get_mut(index)
            .ok_or(ConfigurationError::SiteOutOfRange { index, len })?;
        if slot.species != site.species {
            return Err(ConfigurationError::SpeciesMismatch {
                index,
                expected: slot.species.clone(),
                found: site.species,
            });
        }
        *slot = site;
        self.revision = next_revision();
        Ok(())
    }

    /// Returns a fresh copy with every record merged in order.
    ///
    /// Merging an empty slice yields a configuration equal to `self`.
    pub fn apply_moves(&self, records: &[MoveRecord]) -> Result<Self, ConfigurationError> {
        let mut merged = self.clone();
        for record in records {
            merged.replace_site(record.site_index, record.site.clone())?;
        }
        Ok(merged)
    }

    /// Assigns oxidation states by species; species absent from the map are left untouched.
    pub fn assign_oxidation_states(&mut self, states: &HashMap<String, f64>) {
        for site in &mut self.sites {
            if let Some(&state) = states.get(&site.species) {
                site.oxidation_state = Some(state);
            }
        }
    }
}
