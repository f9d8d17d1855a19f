use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

const SINGULAR_VOLUME_EPSILON: f64 = 1e-8;

#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("Lattice vectors are linearly dependent (volume = {volume:.3e})")]
    Singular { volume: f64 },
}

/// A periodic simulation cell.
///
/// The three lattice vectors are stored as the rows of `matrix`, so a fractional
/// coordinate row vector `f` maps to cartesian space as `f * matrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from its three vectors (as rows).
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::Singular`] if the vectors do not span a volume.
    pub fn new(matrix: Matrix3<f64>) -> Result<Self, LatticeError> {
        let volume = matrix.determinant().abs();
        if volume < SINGULAR_VOLUME_EPSILON {
            return Err(LatticeError::Singular { volume });
        }
        let inverse = matrix
            .try_inverse()
            .ok_or(LatticeError::Singular { volume })?;
        Ok(Self { matrix, inverse })
    }

    /// Creates an orthorhombic cell with edges `a`, `b`, `c` along x, y, z.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, LatticeError> {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, b, c)))
    }

    pub fn cubic(a: f64) -> Result<Self, LatticeError> {
        Self::orthorhombic(a, a, a)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * frac)
    }

    pub fn to_fractional(&self, cart: &Point3<f64>) -> Vector3<f64> {
        self.inverse.transpose() * cart.coords
    }

    /// Cartesian displacement of a whole-cell image offset.
    pub fn image_shift(&self, image: [i32; 3]) -> Vector3<f64> {
        let offset = Vector3::new(image[0] as f64, image[1] as f64, image[2] as f64);
        self.matrix.transpose() * offset
    }

    /// Distances between opposite faces of the cell.
    ///
    /// A sphere of radius `r` fits inside `ceil(r / width)` cells along each axis,
    /// which bounds the periodic images a neighbor search has to visit.
    pub fn perpendicular_widths(&self) -> Vector3<f64> {
        let a = self.vector(0);
        let b = self.vector(1);
        let c = self.vector(2);
        let volume = self.volume();
        Vector3::new(
            volume / b.cross(&c).norm(),
            volume / c.cross(&a).norm(),
            volume / a.cross(&b).norm(),
        )
    }
}

/// Wraps every fractional component into `[0, 1)`.
pub fn wrap_fractional(frac: &Vector3<f64>) -> Vector3<f64> {
    frac.map(|x| {
        let wrapped = x - x.floor();
        // `x - floor(x)` can round up to exactly 1.0 for tiny negative inputs.
        if wrapped >= 1.0 { 0.0 } else { wrapped }
    })
}
