//! Neighbor lists over periodic configurations.
//!
//! A [`NeighborList`] maps every site index to the sites (including periodic
//! images) within a fixed cutoff radius, excluding the site itself. It is derived
//! data: it records the configuration revision it was built from, and scoring
//! refuses a list whose revision no longer matches.
//!
//! Two maintenance strategies share the [`SpatialIndex`] contract. A full rebuild
//! is always correct and is the default; a patch recomputes only the entries of
//! sites whose neighborhood can have changed after a set of moves. Both produce
//! identical lists.

pub mod periodic;

use crate::core::models::configuration::Configuration;
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the neighboring site.
    pub index: usize,
    /// Distance to the (possibly translated) neighbor in Angstroms.
    pub distance: f64,
    /// Lattice translation applied to the neighbor.
    pub image: [i32; 3],
}

/// What a range query is centered on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborQuery {
    /// An existing site; that site never appears in its own result.
    Site(usize),
    /// An arbitrary cartesian point.
    Point(Point3<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList {
    entries: Vec<Vec<Neighbor>>,
    radius: f64,
    revision: u64,
}

impl NeighborList {
    pub(crate) fn new(entries: Vec<Vec<Neighbor>>, radius: f64, revision: u64) -> Self {
        Self {
            entries,
            radius,
            revision,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Neighbors of one site, or an empty slice for an unknown index.
    pub fn get(&self, site_index: usize) -> &[Neighbor] {
        self.entries
            .get(site_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Neighbor])> {
        self.entries.iter().enumerate().map(|(i, n)| (i, n.as_slice()))
    }

    /// The distinct site indices neighboring `site_index`.
    pub fn indices_of(&self, site_index: usize) -> BTreeSet<usize> {
        self.get(site_index).iter().map(|n| n.index).collect()
    }

    /// Whether this list was built from the current geometry of `configuration`.
    pub fn is_current_for(&self, configuration: &Configuration) -> bool {
        self.revision == configuration.revision() && self.entries.len() == configuration.len()
    }

    pub(crate) fn into_entries(self) -> Vec<Vec<Neighbor>> {
        self.entries
    }
}

/// Range queries over a periodic configuration.
pub trait SpatialIndex: Send + Sync {
    fn neighbors_within(
        &self,
        configuration: &Configuration,
        query: NeighborQuery,
        radius: f64,
    ) -> Vec<Neighbor>;

    fn rebuild_all(&self, configuration: &Configuration, radius: f64) -> NeighborList;

    /// Updates `previous` after the sites in `moved` changed position.
    ///
    /// `previous` must describe `configuration` as it was before those moves.
    /// The default implementation falls back to a full rebuild.
    fn patch(
        &self,
        configuration: &Configuration,
        previous: &NeighborList,
        moved: &[usize],
    ) -> NeighborList {
        let _ = (previous, moved);
        self.rebuild_all(configuration, previous.radius())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborStrategy {
    #[default]
    FullRebuild,
    Patch,
}

/// Brings `previous` up to date with `configuration` using the chosen strategy.
pub fn refresh(
    index: &dyn SpatialIndex,
    strategy: NeighborStrategy,
    configuration: &Configuration,
    previous: &NeighborList,
    moved: &[usize],
) -> NeighborList {
    match strategy {
        NeighborStrategy::FullRebuild => index.rebuild_all(configuration, previous.radius()),
        NeighborStrategy::Patch => index.patch(configuration, previous, moved),
    }
}
