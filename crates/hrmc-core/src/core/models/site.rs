use super::lattice::{Lattice, wrap_fractional};
use nalgebra::{Point3, Vector3};

/// A single atomic site of a periodic configuration.
///
/// Fractional and cartesian coordinates are kept side by side; they are only
/// ever written together through [`Site::new`] or [`Site::with_fractional`], so
/// the two views cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// The element symbol (e.g., "Al", "O").
    pub species: String,
    frac_coords: Vector3<f64>,
    coords: Point3<f64>,
    /// The formal oxidation state, if one has been assigned.
    pub oxidation_state: Option<f64>,
}

impl Site {
    /// Creates a site from fractional coordinates, wrapping them into the cell.
    pub fn new(species: &str, frac_coords: Vector3<f64>, lattice: &Lattice) -> Self {
        let frac_coords = wrap_fractional(&frac_coords);
        Self {
            species: species.to_string(),
            coords: lattice.to_cartesian(&frac_coords),
            frac_coords,
            oxidation_state: None,
        }
    }

    pub fn from_cartesian(species: &str, coords: Point3<f64>, lattice: &Lattice) -> Self {
        Self::new(species, lattice.to_fractional(&coords), lattice)
    }

    /// Returns a copy of this site moved to new fractional coordinates.
    pub fn with_fractional(&self, frac_coords: Vector3<f64>, lattice: &Lattice) -> Self {
        let mut moved = Self::new(&self.species, frac_coords, lattice);
        moved.oxidation_state = self.oxidation_state;
        moved
    }

    pub fn frac_coords(&self) -> &Vector3<f64> {
        &self.frac_coords
    }

    pub fn coords(&self) -> &Point3<f64> {
        &self.coords
    }

    /// Plain cartesian distance, without periodic images.
    pub fn distance_to(&self, other: &Site) -> f64 {
        (self.coords - other.coords).norm()
    }
}
