//! # tdoa-types
//!
//! Shared wire structures for the TDOA positioning suite.
//!
//! These types are used by:
//! - `backend-rust`: receiving and parsing arrival events from the station
//!   event channel, broadcasting resolved positions to clients
//! - `tdoa-simulator`: producing arrival events against a synthetic emitter
//!
//! ## Wire Conventions
//!
//! All records are JSON with camelCase field names. Timestamps are
//! milliseconds on a time base shared by every station in one deployment
//! (what matters to the solver is differences, not the epoch).

use serde::{Deserialize, Serialize};

// ── Arrival Event ─────────────────────────────────────────────────────────────

/// One arrival-timestamp report from a single receiving station.
///
/// Pushed by the external event channel every time a station detects the
/// emitter's signal. `source_id` must match a configured station identifier;
/// events with unknown ids are dropped by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalEvent {
    /// Station identifier, e.g. "source1"
    pub source_id: String,
    /// Arrival timestamp in milliseconds (shared monotonic base, fractional ok)
    pub received_at: f64,
}

// ── Resolved Position ─────────────────────────────────────────────────────────

/// Position estimate published for each completed measurement cycle.
///
/// Broadcast as the Socket.IO `position-update` event. `converged` is false
/// when the optimizer ran out of iterations; consumers needing a hard
/// reliability guarantee must check it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f64,
    pub y: f64,
    pub iterations: u32,
    pub converged: bool,
    pub loss: f64,
}

// ── External Configuration Service ────────────────────────────────────────────

/// Record served by the external configuration service (`GET /config`,
/// echoed by `POST /config`). Carries at least `objectSpeed`; any further
/// fields the service grows are preserved untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub object_speed: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrival_event_parses_wire_form() {
        let ev: ArrivalEvent =
            serde_json::from_str(r#"{"sourceId":"source2","receivedAt":1723.5}"#).unwrap();
        assert_eq!(ev.source_id, "source2");
        assert_eq!(ev.received_at, 1723.5);
    }

    #[test]
    fn arrival_event_missing_field_is_rejected() {
        assert!(serde_json::from_str::<ArrivalEvent>(r#"{"sourceId":"source1"}"#).is_err());
    }

    #[test]
    fn config_record_keeps_unknown_fields() {
        let cfg: ConfigRecord =
            serde_json::from_str(r#"{"objectSpeed":42.0,"region":"north"}"#).unwrap();
        assert_eq!(cfg.object_speed, 42.0);
        assert_eq!(cfg.extra["region"], "north");
    }

    #[test]
    fn position_record_round_trips() {
        let rec = PositionRecord { x: 1.0, y: -2.5, iterations: 12, converged: true, loss: 0.0 };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"converged\":true"));
        let back: PositionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
