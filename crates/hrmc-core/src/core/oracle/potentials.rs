const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

#[inline]
pub fn buckingham(dist: f64, a: f64, rho: f64, c: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    a * (-dist / rho).exp() - c / dist.powi(6)
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, epsilon: f64, sigma: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let s6 = (sigma / dist).powi(6);
    4.0 * epsilon * (s6 * s6 - s6)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return q1.signum() * q2.signum() * 1e10;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}
