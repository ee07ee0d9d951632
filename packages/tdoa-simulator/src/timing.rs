//! timing.rs — arrival-time generation
//!
//! Converts an emitter position into the per-station arrival stamps real
//! receivers would report: a shared emission instant plus each station's
//! true propagation delay, with optional Gaussian timing jitter on top.
//! Stamps use milliseconds since simulator start — the engine only ever
//! looks at differences, so the epoch is irrelevant and the small
//! magnitudes keep sub-microsecond flight-time structure representable.

use rand_distr::{Distribution, Normal};

use tdoa_core::{StationSet, MS_TO_TIME_UNITS};
use tdoa_types::ArrivalEvent;

pub struct TimingModel {
    jitter: Option<Normal<f64>>,
}

impl TimingModel {
    pub fn new(jitter_ms: f64) -> Self {
        let jitter =
            (jitter_ms > 0.0).then(|| Normal::new(0.0, jitter_ms).expect("invalid jitter sigma"));
        Self { jitter }
    }

    /// One arrival event per station for a signal emitted at `emit_ms`.
    pub fn arrival_events(
        &self,
        emitter: [f64; 2],
        stations: &StationSet,
        emit_ms: f64,
    ) -> Vec<ArrivalEvent> {
        let mut rng = rand::thread_rng();
        // Grid units covered per millisecond of flight time.
        let units_per_ms = stations.speed() * MS_TO_TIME_UNITS;

        stations
            .stations()
            .iter()
            .map(|station| {
                let flight_ms = station.distance_to(emitter[0], emitter[1]) / units_per_ms;
                let noise = self.jitter.as_ref().map(|j| j.sample(&mut rng)).unwrap_or(0.0);
                ArrivalEvent {
                    source_id: station.id.clone(),
                    received_at: emit_ms + flight_ms + noise,
                }
            })
            .collect()
    }
}
