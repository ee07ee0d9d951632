//! sinks.rs — backend implementations of the engine's position output boundary
//!
//! The solve path must never wait on a consumer, so the hub publishes into a
//! bounded channel with `try_send`: a slow broadcast task costs dropped
//! estimates, not a stalled aggregator.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use tdoa_core::{PositionEstimate, PositionSink, SinkError};
use tdoa_types::PositionRecord;

/// Bounded-channel sink between the event hub and the Socket.IO broadcast
/// task. Estimates are converted to wire records at the boundary.
pub struct ChannelSink {
    tx: mpsc::Sender<PositionRecord>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PositionRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl PositionSink for ChannelSink {
    fn publish(&mut self, estimate: &PositionEstimate) -> Result<(), SinkError> {
        let record = PositionRecord {
            x: estimate.x,
            y: estimate.y,
            iterations: estimate.iterations,
            converged: estimate.converged,
            loss: estimate.loss,
        };
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Unavailable("broadcast task gone".into()),
        })
    }
}
