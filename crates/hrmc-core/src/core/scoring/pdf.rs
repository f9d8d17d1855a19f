use super::{PdfProfile, Score, ScoringError, StructureScorer, ensure_current};
use crate::core::io::reference::{ExperimentalReference, ReferenceLoadError};
use crate::core::models::configuration::Configuration;
use crate::core::neighbors::NeighborList;
use serde::Deserialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PdfParams {
    /// Histogram bin width in Angstroms.
    pub bin_size: f64,
    /// Per-species scattering weights; species not listed weigh 1.0.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

impl Default for PdfParams {
    fn default() -> Self {
        Self {
            bin_size: 0.04,
            weights: HashMap::new(),
        }
    }
}

/// Scores a configuration by the least-squares mismatch between its reduced
/// pair-distribution function and an experimental G(r).
///
/// The calculated curve is histogrammed from the neighbor list, so it only
/// extends to the neighbor cutoff; experimental points beyond it are ignored.
#[derive(Debug, Clone)]
pub struct PdfScorer {
    reference: ExperimentalReference,
    params: PdfParams,
}

struct CalculatedCurve {
    centers: Vec<f64>,
    g: Vec<f64>,
}

impl PdfScorer {
    pub fn new(reference: ExperimentalReference, params: PdfParams) -> Self {
        Self { reference, params }
    }

    pub fn load_reference(path: &Path, params: PdfParams) -> Result<Self, ReferenceLoadError> {
        Ok(Self::new(ExperimentalReference::load(path)?, params))
    }

    pub fn reference(&self) -> &ExperimentalReference {
        &self.reference
    }

    fn weight(&self, species: &str) -> f64 {
        self.params.weights.get(species).copied().unwrap_or(1.0)
    }

    fn calculate(
        &self,
        configuration: &Configuration,
        neighbors: &NeighborList,
    ) -> Result<CalculatedCurve, ScoringError> {
        ensure_current(configuration, neighbors)?;
        if configuration.is_empty() {
            return Err(ScoringError::EmptyConfiguration);
        }

        let bin = self.params.bin_size;
        let num_bins = (neighbors.radius() / bin).floor() as usize;
        let weights: Vec<f64> = configuration
            .sites()
            .iter()
            .map(|s| self.weight(&s.species))
            .collect();
        let n = configuration.len() as f64;
        let mean_weight = weights.iter().sum::<f64>() / n;
        let rho0 = configuration.number_density();

        let mut histogram = vec![0.0; num_bins];
        for (i, site_neighbors) in neighbors.iter() {
            for neighbor in site_neighbors {
                let k = (neighbor.distance / bin) as usize;
                if k < num_bins {
                    histogram[k] += weights[i] * weights[neighbor.index];
                }
            }
        }

        let norm = n * mean_weight * mean_weight * rho0;
        let (centers, g) = histogram
            .iter()
            .enumerate()
            .map(|(k, &count)| {
                let lo = k as f64 * bin;
                let hi = lo + bin;
                let center = lo + 0.5 * bin;
                let shell = 4.0 / 3.0 * PI * (hi.powi(3) - lo.powi(3));
                let rdf = if norm > 0.0 { count / (norm * shell) } else { 0.0 };
                (center, 4.0 * PI * center * rho0 * (rdf - 1.0))
            })
            .unzip();
        Ok(CalculatedCurve { centers, g })
    }

    /// Experimental points inside the calculated range, paired with the
    /// linearly interpolated calculated value.
    fn overlap(&self, curve: &CalculatedCurve) -> Vec<(f64, f64, f64)> {
        let (Some(&first), Some(&last)) = (curve.centers.first(), curve.centers.last()) else {
            return Vec::new();
        };
        self.reference
            .r()
            .iter()
            .zip(self.reference.g())
            .filter(|&(&r, _)| r >= first && r <= last)
            .map(|(&r, &g_exp)| (r, interpolate(&curve.centers, &curve.g, r), g_exp))
            .collect()
    }

    fn fit(points: &[(f64, f64, f64)]) -> (f64, f64) {
        let cross: f64 = points.iter().map(|&(_, c, e)| c * e).sum();
        let calc_sq: f64 = points.iter().map(|&(_, c, _)| c * c).sum();
        let slope = if calc_sq > 0.0 { cross / calc_sq } else { 0.0 };
        let error = points
            .iter()
            .map(|&(_, c, e)| (e - slope * c).powi(2))
            .sum();
        (slope, error)
    }
}

fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let upper = xs.partition_point(|&v| v < x);
    if upper == 0 {
        return ys[0];
    }
    if upper >= xs.len() {
        return ys[xs.len() - 1];
    }
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let t = (x - x0) / (x1 - x0);
    ys[upper - 1] + t * (ys[upper] - ys[upper - 1])
}

impl StructureScorer for PdfScorer {
    fn score(
        &self,
        configuration: &Configuration,
        neighbors: &NeighborList,
    ) -> Result<Score, ScoringError> {
        let curve = self.calculate(configuration, neighbors)?;
        let points = self.overlap(&curve);
        if points.is_empty() {
            return Err(ScoringError::NoOverlap {
                cutoff: neighbors.radius(),
            });
        }
        let (slope, error) = Self::fit(&points);
        if !error.is_finite() {
            return Err(ScoringError::NonFinite);
        }
        Ok(Score {
            error,
            calibration_slope: slope,
        })
    }

    fn profile(
        &self,
        configuration: &Configuration,
        neighbors: &NeighborList,
    ) -> Result<Option<PdfProfile>, ScoringError> {
        let curve = self.calculate(configuration, neighbors)?;
        let points = self.overlap(&curve);
        let (slope, _) = Self::fit(&points);
        Ok(Some(PdfProfile {
            r: points.iter().map(|p| p.0).collect(),
            calculated: points.iter().map(|p| slope * p.1).collect(),
            experimental: points.iter().map(|p| p.2).collect(),
            calibration_slope: slope,
        }))
    }
}
