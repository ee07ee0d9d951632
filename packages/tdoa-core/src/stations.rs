//! stations.rs — fixed receiver geometry
//!
//! A `StationSet` is the read-only registry of reference stations the whole
//! pipeline shares: ordered coordinates, a designated reference station
//! (always the first), and the signal propagation speed used to convert
//! time differences into distance differences. Immutable after
//! construction, so it can be handed around in an `Arc` with no locking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signal propagation speed in grid units per solver time unit.
///
/// Speed of light (3e8 m/s) expressed on the nanosecond-scale time base the
/// solver works in, giving residuals a magnitude the fixed-step
/// finite-difference gradient handles well.
pub const PROPAGATION_SPEED: f64 = 3.0e8 / 1.0e9;

/// Scale factor from millisecond arrival stamps to solver time units.
pub const MS_TO_TIME_UNITS: f64 = 1.0e6;

/// Minimum number of stations a set must hold to make 2D TDOA solvable.
pub const MIN_STATIONS: usize = 3;

#[derive(Debug, Error)]
pub enum StationSetError {
    #[error("need at least {MIN_STATIONS} stations, got {0}")]
    TooFewStations(usize),
    #[error("duplicate station id: {0}")]
    DuplicateId(String),
    #[error("propagation speed must be positive, got {0}")]
    InvalidSpeed(f64),
}

/// One fixed receiving station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Station {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }

    /// Euclidean distance from this station to a candidate point.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((x - self.x).powi(2) + (y - self.y).powi(2)).sqrt()
    }
}

/// Ordered, immutable set of N≥3 stations plus the propagation speed.
///
/// The first station is the reference: every time difference the pipeline
/// handles is measured against its arrival timestamp.
#[derive(Debug, Clone)]
pub struct StationSet {
    stations: Vec<Station>,
    speed: f64,
}

impl StationSet {
    pub fn new(stations: Vec<Station>, speed: f64) -> Result<Self, StationSetError> {
        if stations.len() < MIN_STATIONS {
            return Err(StationSetError::TooFewStations(stations.len()));
        }
        if !(speed > 0.0) || !speed.is_finite() {
            return Err(StationSetError::InvalidSpeed(speed));
        }
        for (i, s) in stations.iter().enumerate() {
            if stations[..i].iter().any(|other| other.id == s.id) {
                return Err(StationSetError::DuplicateId(s.id.clone()));
            }
        }
        Ok(Self { stations, speed })
    }

    /// Build with the default speed-of-light constant.
    pub fn with_default_speed(stations: Vec<Station>) -> Result<Self, StationSetError> {
        Self::new(stations, PROPAGATION_SPEED)
    }

    /// The reference station all time differences are measured against.
    pub fn reference(&self) -> &Station {
        &self.stations[0]
    }

    /// All stations except the reference, in set order.
    pub fn non_reference(&self) -> &[Station] {
        &self.stations[1..]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stations.iter().any(|s| s.id == id)
    }
}
