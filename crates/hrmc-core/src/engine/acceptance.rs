//! The dual-criterion acceptance rule.
//!
//! A candidate with error `E_new` and energy `U_new` is compared with the
//! current state `(E_old, U_old, σ, T)`:
//!
//! - if `E_new < E_old` and `U_new <= U_old` it is accepted unconditionally;
//! - otherwise it is accepted iff a uniform draw from `[0, 1)` is below
//!   `p = exp(-|E_new - E_old| / σ + (U_old - U_new) / (k_B·T))`.
//!
//! `p` is not clamped; values above one always accept. The same rule decides
//! both single candidates inside a batch and the merged batch.

use super::state::AcceptanceState;
use std::fmt;
use tracing::warn;

/// Boltzmann constant in kcal/(mol·K).
pub const BOLTZMANN_KCAL: f64 = 1.987204259e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionScope {
    Single,
    Batch,
}

impl DecisionScope {
    pub fn tag(&self) -> &'static str {
        match self {
            DecisionScope::Single => "single",
            DecisionScope::Batch => "batch",
        }
    }
}

impl fmt::Display for DecisionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub scope: DecisionScope,
    pub accepted: bool,
    /// `None` for the unconditional strict-improvement branch.
    pub probability: Option<f64>,
    pub error: f64,
    pub energy: f64,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.probability {
            Some(p) => write!(
                f,
                "{}: {}, {}, {}, {}",
                self.scope, self.accepted, p, self.error, self.energy
            ),
            None => write!(
                f,
                "{}: {}, n/a, {}, {}",
                self.scope, self.accepted, self.error, self.energy
            ),
        }
    }
}

pub fn is_strict_improvement(state: &AcceptanceState, error: f64, energy: f64) -> bool {
    error < state.error && energy <= state.energy
}

pub fn probability(state: &AcceptanceState, error: f64, energy: f64) -> f64 {
    let error_term = -(error - state.error).abs() / state.error_tolerance;
    let energy_term = (state.energy - energy) / (BOLTZMANN_KCAL * state.temperature);
    (error_term + energy_term).exp()
}

/// Decides one candidate against `state` using the supplied uniform `draw`.
pub fn decide(
    state: &AcceptanceState,
    error: f64,
    energy: f64,
    draw: f64,
    scope: DecisionScope,
) -> Decision {
    if is_strict_improvement(state, error, energy) {
        return Decision {
            scope,
            accepted: true,
            probability: None,
            error,
            energy,
        };
    }
    let p = probability(state, error, energy);
    if !p.is_finite() {
        warn!(
            scope = scope.tag(),
            probability = p,
            error_tolerance = state.error_tolerance,
            temperature = state.temperature,
            "Non-finite acceptance probability."
        );
    }
    Decision {
        scope,
        accepted: draw < p,
        probability: Some(p),
        error,
        energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(error: f64, energy: f64, sigma: f64, temperature: f64) -> AcceptanceState {
        AcceptanceState {
            error,
            energy,
            temperature,
            error_tolerance: sigma,
        }
    }

    #[test]
    fn strict_improvement_is_accepted_for_any_draw() {
        let s = state(1.0, 0.0, 1e-12, 1e-12);
        for draw in [0.0, 0.5, 0.999_999] {
            let d = decide(&s, 0.5, 0.0, draw, DecisionScope::Single);
            assert!(d.accepted);
            assert_eq!(d.probability, None);
        }
        assert!(decide(&s, 0.9, -5.0, 0.99, DecisionScope::Batch).accepted);
    }

    #[test]
    fn equal_error_is_not_a_strict_improvement() {
        let s = state(1.0, 0.0, 1.0, 300.0);
        let d = decide(&s, 1.0, 0.0, 0.5, DecisionScope::Batch);
        assert_eq!(d.probability, Some(1.0));
        assert!(d.accepted);
    }

    #[test]
    fn probability_matches_formula_and_is_not_clamped() {
        let s = state(2.0, -10.0, 0.5, 300.0);
        let (e, u) = (2.3, -12.0);
        let expected =
            (-(0.3f64) / 0.5 + (-10.0 - -12.0) / (BOLTZMANN_KCAL * 300.0)).exp();
        let p = probability(&s, e, u);
        assert!((p - expected).abs() / expected < 1e-12);
        assert!(p > 1.0);
    }

    #[test]
    fn decision_is_draw_below_probability() {
        let s = state(1.0, 0.0, 0.1, 300.0);
        let p = probability(&s, 1.1, 0.0);
        assert!((p - (-1.0f64).exp()).abs() < 1e-12);
        assert!(decide(&s, 1.1, 0.0, p - 1e-9, DecisionScope::Single).accepted);
        assert!(!decide(&s, 1.1, 0.0, p, DecisionScope::Single).accepted);
    }

    #[test]
    fn error_regression_is_penalized_symmetrically() {
        let s = state(1.0, 0.0, 0.1, 300.0);
        // Equal energies: only |ΔE| enters, so ±0.1 give the same probability.
        let better_error = probability(&s, 0.9, 0.0);
        let worse_error = probability(&s, 1.1, 0.0);
        assert!((better_error - worse_error).abs() < 1e-12);
    }

    #[test]
    fn nan_probability_rejects() {
        let s = state(1.0, 0.0, 0.0, 300.0);
        let d = decide(&s, 1.0, 0.0, 0.0, DecisionScope::Batch);
        assert!(d.probability.is_some_and(f64::is_nan));
        assert!(!d.accepted);
    }

    #[test]
    fn decisions_render_as_log_lines() {
        let s = state(1.0, 0.0, 1.0, 300.0);
        let unconditional = decide(&s, 0.5, -1.0, 0.3, DecisionScope::Single);
        assert_eq!(unconditional.to_string(), "single: true, n/a, 0.5, -1");
        let probabilistic = decide(&s, 1.0, 0.0, 0.3, DecisionScope::Batch);
        assert_eq!(probabilistic.to_string(), "batch: true, 1, 1, 0");
    }
}
