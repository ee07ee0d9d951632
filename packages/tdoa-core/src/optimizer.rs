//! optimizer.rs — gradient-descent least-squares solver
//!
//! Minimizes the sum of squared TDOA residuals with plain gradient descent
//! and a forward finite-difference gradient. Chosen over Gauss-Newton for
//! behavioral compatibility with the deployed estimator: bounded
//! iterations, tolerance-based early stop, and a result returned in both
//! termination cases.
//!
//! Each call is self-contained; no solver state survives between cycles.

use serde::Serialize;
use thiserror::Error;

/// Fixed perturbation step for the forward finite-difference gradient.
pub const DELTA: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum SolveError {
    /// Loss or gradient left the finite range. The cycle that produced this
    /// must be discarded without publishing.
    #[error("loss or gradient became non-finite at iteration {iteration}")]
    NonFinite { iteration: u32 },
}

/// Tuning knobs for one solve. Defaults match the deployed estimator.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    pub learning_rate: f64,
    pub max_iterations: u32,
    /// Minimum loss change between iterations below which the solver stops.
    pub tolerance: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self { learning_rate: 0.01, max_iterations: 10_000, tolerance: 1e-12 }
    }
}

/// A candidate position plus solve provenance.
///
/// `converged` distinguishes a tolerance stop from iteration exhaustion —
/// the estimate is returned either way and callers needing a hard
/// guarantee must check the flag. `iterations` counts gradient updates
/// actually applied; `loss` is the objective at the returned position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionEstimate {
    pub x: f64,
    pub y: f64,
    pub iterations: u32,
    pub converged: bool,
    pub loss: f64,
}

/// Gradient descent over the sum of squared residuals.
///
/// Every evaluation calls `residual_fn` afresh, so the closure must be pure
/// in the candidate position. Aborts with [`SolveError::NonFinite`] the
/// moment the loss or either gradient component stops being finite.
pub fn solve<F>(
    residual_fn: F,
    initial: [f64; 2],
    config: &SolveConfig,
) -> Result<PositionEstimate, SolveError>
where
    F: Fn([f64; 2]) -> Vec<f64>,
{
    let loss_at = |p: [f64; 2]| -> f64 { residual_fn(p).iter().map(|r| r * r).sum() };

    let [mut x, mut y] = initial;
    let mut prev_loss = f64::INFINITY;
    let mut curr_loss = loss_at([x, y]);
    let mut iterations = 0u32;
    let mut converged = false;

    for iter in 0..config.max_iterations {
        if !curr_loss.is_finite() {
            return Err(SolveError::NonFinite { iteration: iter });
        }
        if (prev_loss - curr_loss).abs() < config.tolerance {
            converged = true;
            break;
        }
        prev_loss = curr_loss;

        // Forward differences; a loss of exactly 0 still perturbs cleanly.
        let grad_x = (loss_at([x + DELTA, y]) - curr_loss) / DELTA;
        let grad_y = (loss_at([x, y + DELTA]) - curr_loss) / DELTA;
        if !grad_x.is_finite() || !grad_y.is_finite() {
            return Err(SolveError::NonFinite { iteration: iter });
        }

        x -= config.learning_rate * grad_x;
        y -= config.learning_rate * grad_y;
        iterations = iter + 1;
        curr_loss = loss_at([x, y]);
    }

    if !curr_loss.is_finite() {
        return Err(SolveError::NonFinite { iteration: iterations });
    }

    Ok(PositionEstimate { x, y, iterations, converged, loss: curr_loss })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residual::residuals;
    use crate::stations::{Station, StationSet};

    fn grid() -> StationSet {
        StationSet::with_default_speed(vec![
            Station::new("source1", 0.0, 0.0),
            Station::new("source2", 100_000.0, 0.0),
            Station::new("source3", 0.0, 100_000.0),
        ])
        .unwrap()
    }

    fn exact_deltas(stations: &StationSet, x: f64, y: f64) -> Vec<f64> {
        let d_ref = stations.reference().distance_to(x, y);
        stations
            .non_reference()
            .iter()
            .map(|s| (d_ref - s.distance_to(x, y)) / stations.speed())
            .collect()
    }

    #[test]
    fn converges_on_ground_truth() {
        let stations = grid();
        let truth = [50_000.0, 50_000.0];
        let deltas = exact_deltas(&stations, truth[0], truth[1]);

        let est = solve(
            |p| residuals(p, &stations, &deltas),
            [50_000.0, 50_000.0],
            &SolveConfig::default(),
        )
        .unwrap();

        let err = ((est.x - truth[0]).powi(2) + (est.y - truth[1]).powi(2)).sqrt();
        assert!(err < 1e-3, "position error {err} exceeds 1e-3");
        assert!(est.converged);
    }

    #[test]
    fn recovers_truth_from_offset_guess() {
        let stations = grid();
        let truth = [50_000.0, 50_000.0];
        let deltas = exact_deltas(&stations, truth[0], truth[1]);

        let est = solve(
            |p| residuals(p, &stations, &deltas),
            [50_005.0, 49_995.0],
            &SolveConfig::default(),
        )
        .unwrap();

        let err = ((est.x - truth[0]).powi(2) + (est.y - truth[1]).powi(2)).sqrt();
        assert!(err < 1e-3, "position error {err} exceeds 1e-3");
        assert!(est.converged);
        assert!(est.iterations > 0);
    }

    #[test]
    fn deterministic_across_invocations() {
        let stations = grid();
        let deltas = exact_deltas(&stations, 42_000.0, 61_000.0);
        let run = || {
            solve(
                |p| residuals(p, &stations, &deltas),
                [50_000.0, 50_000.0],
                &SolveConfig::default(),
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a, b);
    }

    #[test]
    fn reports_exhaustion_without_convergence() {
        // A residual the descent cannot flatten within 3 iterations.
        let cfg = SolveConfig { max_iterations: 3, ..Default::default() };
        let est = solve(|p| vec![p[0] - 1_000.0], [0.0, 0.0], &cfg).unwrap();
        assert!(!est.converged);
        assert_eq!(est.iterations, 3);
        assert!(est.loss.is_finite());
    }

    #[test]
    fn zero_loss_yields_no_nan_gradient() {
        // Identically-zero residuals: converges immediately, everything finite.
        let est = solve(|_| vec![0.0, 0.0], [1.0, 2.0], &SolveConfig::default()).unwrap();
        assert!(est.converged);
        assert_eq!(est.loss, 0.0);
        assert!(est.x.is_finite() && est.y.is_finite());
    }

    #[test]
    fn non_finite_loss_aborts() {
        let err = solve(|_| vec![f64::NAN], [0.0, 0.0], &SolveConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::NonFinite { iteration: 0 }));
    }

    #[test]
    fn divergent_residual_aborts_instead_of_publishing_garbage() {
        // Overflowing residual drives the loss to infinity within a few steps.
        let result = solve(
            |p| vec![(p[0].abs() + 1.0).powi(3) * 1e150],
            [10.0, 0.0],
            &SolveConfig::default(),
        );
        assert!(result.is_err());
    }
}
