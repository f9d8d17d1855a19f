use super::{Neighbor, NeighborList, NeighborQuery, SpatialIndex};
use crate::core::models::configuration::Configuration;
use crate::core::models::lattice::Lattice;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::trace;

/// Exhaustive periodic-image search.
///
/// Each query visits every site translated by every lattice image that can reach
/// the query sphere. Results are ordered by site index, then by image, so a
/// patched list and a rebuilt list compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicIndex;

impl PeriodicIndex {
    pub fn new() -> Self {
        Self
    }
}

fn image_ranges(lattice: &Lattice, radius: f64) -> [i32; 3] {
    let widths = lattice.perpendicular_widths();
    [0, 1, 2].map(|axis| (radius / widths[axis]).ceil().max(0.0) as i32)
}

fn collect_neighbors(
    configuration: &Configuration,
    center: &Point3<f64>,
    exclude: Option<usize>,
    radius: f64,
    shifts: &[([i32; 3], Vector3<f64>)],
) -> Vec<Neighbor> {
    let mut found = Vec::new();
    for (index, site) in configuration.sites().iter().enumerate() {
        if exclude == Some(index) {
            continue;
        }
        for (image, shift) in shifts {
            let distance = (site.coords() + shift - center).norm();
            if distance <= radius {
                found.push(Neighbor {
                    index,
                    distance,
                    image: *image,
                });
            }
        }
    }
    found
}

fn lattice_shifts(lattice: &Lattice, radius: f64) -> Vec<([i32; 3], Vector3<f64>)> {
    let [na, nb, nc] = image_ranges(lattice, radius);
    let mut shifts = Vec::with_capacity(((2 * na + 1) * (2 * nb + 1) * (2 * nc + 1)) as usize);
    for i in -na..=na {
        for j in -nb..=nb {
            for k in -nc..=nc {
                let image = [i, j, k];
                shifts.push((image, lattice.image_shift(image)));
            }
        }
    }
    shifts
}

impl SpatialIndex for PeriodicIndex {
    fn neighbors_within(
        &self,
        configuration: &Configuration,
        query: NeighborQuery,
        radius: f64,
    ) -> Vec<Neighbor> {
        let shifts = lattice_shifts(configuration.lattice(), radius);
        match query {
            NeighborQuery::Site(index) => match configuration.site(index) {
                Some(site) => {
                    collect_neighbors(configuration, site.coords(), Some(index), radius, &shifts)
                }
                None => Vec::new(),
            },
            NeighborQuery::Point(point) => {
                collect_neighbors(configuration, &point, None, radius, &shifts)
            }
        }
    }

    fn rebuild_all(&self, configuration: &Configuration, radius: f64) -> NeighborList {
        let shifts = lattice_shifts(configuration.lattice(), radius);
        let entries: Vec<Vec<Neighbor>> = configuration
            .sites()
            .par_iter()
            .enumerate()
            .map(|(index, site)| {
                collect_neighbors(configuration, site.coords(), Some(index), radius, &shifts)
            })
            .collect();
        NeighborList::new(entries, radius, configuration.revision())
    }

    fn patch(
        &self,
        configuration: &Configuration,
        previous: &NeighborList,
        moved: &[usize],
    ) -> NeighborList {
        let radius = previous.radius();
        if previous.len() != configuration.len() {
            return self.rebuild_all(configuration, radius);
        }

        let shifts = lattice_shifts(configuration.lattice(), radius);
        let mut affected: BTreeSet<usize> = BTreeSet::new();
        for &index in moved {
            let Some(site) = configuration.site(index) else {
                continue;
            };
            affected.insert(index);
            affected.extend(previous.get(index).iter().map(|n| n.index));
            affected.extend(
                collect_neighbors(configuration, site.coords(), Some(index), radius, &shifts)
                    .into_iter()
                    .map(|n| n.index),
            );
        }
        trace!(
            moved = moved.len(),
            affected = affected.len(),
            "Patching neighbor list."
        );

        let updates: Vec<(usize, Vec<Neighbor>)> = affected
            .into_par_iter()
            .map(|index| {
                let center = configuration.sites()[index].coords();
                (
                    index,
                    collect_neighbors(configuration, center, Some(index), radius, &shifts),
                )
            })
            .collect();

        let mut entries = previous.clone().into_entries();
        for (index, neighbors) in updates {
            entries[index] = neighbors;
        }
        NeighborList::new(entries, radius, configuration.revision())
    }
}
