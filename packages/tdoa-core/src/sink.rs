//! sink.rs — position output boundary
//!
//! The engine never owns presentation state. Every resolved cycle is handed
//! to a `PositionSink` exactly once; what happens after that (broadcast,
//! channel fan-out, plotting) is the consumer's business. A sink that
//! cannot accept a result reports it, and the aggregator carries on with
//! the next cycle.

use thiserror::Error;

use crate::optimizer::PositionEstimate;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The consumer behind the sink is gone.
    #[error("position consumer unavailable: {0}")]
    Unavailable(String),
    /// The consumer is alive but its buffer is full; the estimate is dropped
    /// rather than stalling the solve path.
    #[error("position buffer full, estimate dropped")]
    Full,
}

/// Output boundary invoked once per completed measurement cycle that
/// reaches a solve. Implementations must not block the caller: buffer or
/// drop, never stall.
pub trait PositionSink: Send {
    fn publish(&mut self, estimate: &PositionEstimate) -> Result<(), SinkError>;
}

/// Discards every estimate. Useful for benchmarks and solver-only setups.
#[derive(Debug, Default)]
pub struct NullSink;

impl PositionSink for NullSink {
    fn publish(&mut self, _estimate: &PositionEstimate) -> Result<(), SinkError> {
        Ok(())
    }
}
