//! # event_hub
//!
//! Arrival-event channel consumer — receives per-station timestamp events
//! from the push transport as UDP JSON datagrams, feeds them to the
//! `MeasurementAggregator`, and lets each resolved cycle flow out through
//! the channel sink.
//!
//! ## Architecture
//! Runs as one Tokio task (tokio::spawn) with an explicit stop signal:
//!   1. Binds UDP on `TDOA_EVENT_PORT` (default 4002)
//!   2. Parses `{ sourceId, receivedAt }` envelopes; malformed ones are
//!      dropped at debug level without touching the cycle
//!   3. Owns the aggregator outright — the single-writer model, no locking
//!   4. Arms an idle deadline whenever a cycle is in progress and resets
//!      the cycle if it never completes
//!
//! Transport errors are logged and never terminate the loop; the only ways
//! out are the shutdown signal and a failed bind at startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tdoa_core::{MeasurementAggregator, SolveConfig, StationSet, SubmitOutcome};
use tdoa_types::ArrivalEvent;

use crate::sinks::ChannelSink;

// ── Configuration ─────────────────────────────────────────────────────────────

pub struct EventHubConfig {
    /// UDP port the event channel pushes to (default 4002)
    pub udp_port: u16,
    /// Idle time after which an incomplete cycle is discarded
    pub cycle_timeout: Duration,
    /// Optimizer starting guess for every cycle
    pub initial_position: [f64; 2],
    pub solve: SolveConfig,
}

impl Default for EventHubConfig {
    fn default() -> Self {
        Self {
            udp_port: std::env::var("TDOA_EVENT_PORT")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(4002),
            cycle_timeout: Duration::from_millis(
                std::env::var("TDOA_CYCLE_TIMEOUT_MS")
                    .ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
            ),
            initial_position: [
                std::env::var("TDOA_INITIAL_X")
                    .ok().and_then(|v| v.parse().ok()).unwrap_or(50_000.0),
                std::env::var("TDOA_INITIAL_Y")
                    .ok().and_then(|v| v.parse().ok()).unwrap_or(50_000.0),
            ],
            solve: SolveConfig::default(),
        }
    }
}

// ── Main listener task ────────────────────────────────────────────────────────

/// Run the event hub until the shutdown signal flips.
pub async fn run(
    config: EventHubConfig,
    stations: Arc<StationSet>,
    sink: ChannelSink,
    mut shutdown: watch::Receiver<bool>,
) {
    let addr = format!("0.0.0.0:{}", config.udp_port);
    let socket = match UdpSocket::bind(&addr).await {
        Ok(s) => {
            info!("📡 event hub listening on UDP {addr}");
            s
        }
        Err(e) => {
            warn!("event hub: could not bind UDP {addr}: {e} (no event source — idle)");
            return;
        }
    };

    let mut aggregator = MeasurementAggregator::new(
        stations,
        config.solve.clone(),
        config.initial_position,
        sink,
    );
    let mut buf = vec![0u8; 2048];
    let mut cycle_deadline: Option<Instant> = None;

    loop {
        // `cycle_deadline` is Copy; capture it by value so the arm bodies
        // below can rearm it.
        let idle = async move {
            match cycle_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = shutdown.changed() => {
                info!("event hub stopping");
                break;
            }
            _ = idle => {
                warn!("cycle timed out after {:?} without completing", config.cycle_timeout);
                aggregator.reset();
                cycle_deadline = None;
            }
            recv = socket.recv_from(&mut buf) => match recv {
                Ok((len, src)) => {
                    process_event(&buf[..len], src, &mut aggregator);
                    cycle_deadline = aggregator
                        .has_pending()
                        .then(|| Instant::now() + config.cycle_timeout);
                }
                Err(e) => {
                    // Never crash — log and keep listening
                    warn!("event hub: UDP recv error: {e}");
                }
            }
        }
    }
}

fn process_event(
    data: &[u8],
    src: SocketAddr,
    aggregator: &mut MeasurementAggregator<ChannelSink>,
) {
    let event: ArrivalEvent = match serde_json::from_slice(data) {
        Ok(ev) => ev,
        Err(e) => {
            debug!("malformed arrival event from {src}: {e}");
            return;
        }
    };

    match aggregator.submit(&event.source_id, event.received_at) {
        SubmitOutcome::Pending => {
            debug!("arrival from '{}' at {:.3}ms recorded", event.source_id, event.received_at);
        }
        // The aggregator already logged the solve, the drop, or the abort.
        SubmitOutcome::Solved(_) | SubmitOutcome::Aborted | SubmitOutcome::Rejected => {}
    }
}
