//! # tdoa-core
//!
//! Time-Difference-of-Arrival multilateration engine.
//!
//! The pipeline, leaf to root:
//!   1. [`stations::StationSet`] — fixed receiver geometry + propagation speed
//!   2. [`residual::residuals`] — candidate position → predicted-minus-observed
//!      TDOA residual vector
//!   3. [`optimizer::solve`] — finite-difference gradient descent over the
//!      sum of squared residuals
//!   4. [`aggregator::MeasurementAggregator`] — collects one arrival per
//!      station and fires the solve the moment a cycle completes
//!   5. [`sink::PositionSink`] — output boundary the resolved estimate is
//!      handed to
//!
//! The crate is pure computation plus `tracing`; wiring it to an event
//! transport and a broadcast surface is `backend-rust`'s job.

pub mod aggregator;
pub mod optimizer;
pub mod residual;
pub mod sink;
pub mod stations;

pub use aggregator::{MeasurementAggregator, SubmitOutcome};
pub use optimizer::{solve, PositionEstimate, SolveConfig, SolveError, DELTA};
pub use residual::residuals;
pub use sink::{NullSink, PositionSink, SinkError};
pub use stations::{
    Station, StationSet, StationSetError, MIN_STATIONS, MS_TO_TIME_UNITS, PROPAGATION_SPEED,
};
