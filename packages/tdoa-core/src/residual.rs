//! residual.rs — TDOA residual model
//!
//! Pure function mapping a candidate position and one cycle's observed time
//! differences to the residual vector the optimizer minimizes. No state, no
//! allocation beyond the output vector, safe to evaluate as often as the
//! finite-difference gradient needs.

use crate::stations::StationSet;

/// Predicted-minus-observed time difference per non-reference station.
///
/// For station i: `(dist(p, reference) - dist(p, station_i)) / speed - observed_delta_i`.
/// `observed_deltas` must be in set order, one entry per non-reference
/// station, in solver time units.
///
/// A candidate coinciding with a station yields a zero distance, which is
/// fine: the only division is by the propagation speed.
pub fn residuals(position: [f64; 2], stations: &StationSet, observed_deltas: &[f64]) -> Vec<f64> {
    let [x, y] = position;
    let d_ref = stations.reference().distance_to(x, y);
    let speed = stations.speed();

    stations
        .non_reference()
        .iter()
        .zip(observed_deltas)
        .map(|(station, observed)| (d_ref - station.distance_to(x, y)) / speed - observed)
        .collect()
}
