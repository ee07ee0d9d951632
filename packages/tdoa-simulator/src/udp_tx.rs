//! udp_tx.rs — UDP transmitter for arrival events
//!
//! Pushes each cycle's events to the engine's event hub as one JSON
//! datagram per station, mirroring how the real transport delivers them.
//! Send errors are logged but never crash the simulator.

use std::net::UdpSocket;

use tracing::{debug, warn};

use tdoa_types::ArrivalEvent;

pub struct EventTransmitter {
    socket: UdpSocket,
    engine_addr: String,
}

impl EventTransmitter {
    pub fn new(engine_addr: &str) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self { socket, engine_addr: engine_addr.to_string() })
    }

    /// Send all of one cycle's arrival events to the engine.
    pub fn send_cycle(&self, events: &[ArrivalEvent]) {
        for event in events {
            self.send_event(event);
        }
    }

    fn send_event(&self, event: &ArrivalEvent) {
        let bytes = match serde_json::to_vec(event) {
            Ok(b) => b,
            Err(e) => {
                warn!("UDP: serialize failed: {e}");
                return;
            }
        };

        if let Err(e) = self.socket.send_to(&bytes, &self.engine_addr) {
            warn!("UDP: send failed: {e}");
        } else {
            debug!("UDP → {} {} @ {:.3}ms", self.engine_addr, event.source_id, event.received_at);
        }
    }
}
