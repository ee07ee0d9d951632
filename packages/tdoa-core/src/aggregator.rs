//! aggregator.rs — per-cycle arrival collection and solve dispatch
//!
//! Collects one arrival timestamp per station, and the instant the cycle
//! completes runs the whole solve pipeline synchronously: deltas against
//! the reference station, residual model, optimizer, sink. The cycle is
//! consumed atomically whatever the outcome, so a solve is attempted if and
//! only if every station reported.
//!
//! Single-writer model: one task owns the aggregator and calls `submit`
//! serially. Sharing it across producers requires an external mutex or an
//! actor wrapper; nothing in here locks.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::optimizer::{solve, PositionEstimate, SolveConfig};
use crate::residual::residuals;
use crate::sink::PositionSink;
use crate::stations::{StationSet, MS_TO_TIME_UNITS};

/// What a single `submit` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// Event dropped without touching the cycle (unknown station or
    /// non-finite timestamp).
    Rejected,
    /// Timestamp recorded; cycle still awaiting more stations.
    Pending,
    /// Cycle completed and solved; the estimate went to the sink.
    Solved(PositionEstimate),
    /// Cycle completed but the solve diverged; nothing was published.
    Aborted,
}

pub struct MeasurementAggregator<S: PositionSink> {
    stations: Arc<StationSet>,
    solve_config: SolveConfig,
    initial_position: [f64; 2],
    /// station id → arrival timestamp (ms) for the in-progress cycle
    pending: HashMap<String, f64>,
    sink: S,
}

impl<S: PositionSink> MeasurementAggregator<S> {
    pub fn new(
        stations: Arc<StationSet>,
        solve_config: SolveConfig,
        initial_position: [f64; 2],
        sink: S,
    ) -> Self {
        Self { stations, solve_config, initial_position, pending: HashMap::new(), sink }
    }

    /// Record one arrival. A repeated station id overwrites the earlier
    /// timestamp — the newest report wins until the cycle closes. When the
    /// last station reports, the solve runs synchronously and the cycle is
    /// cleared regardless of how it went.
    pub fn submit(&mut self, station_id: &str, received_at_ms: f64) -> SubmitOutcome {
        if !self.stations.contains(station_id) {
            warn!("dropping arrival event from unknown station '{station_id}'");
            return SubmitOutcome::Rejected;
        }
        if !received_at_ms.is_finite() {
            warn!("dropping arrival event from '{station_id}' with non-finite timestamp");
            return SubmitOutcome::Rejected;
        }

        if let Some(old) = self.pending.insert(station_id.to_string(), received_at_ms) {
            debug!("station '{station_id}' re-reported within cycle ({old} -> {received_at_ms})");
        }

        if self.pending.len() < self.stations.len() {
            return SubmitOutcome::Pending;
        }

        // Cycle complete: consume it atomically, then solve from the values
        // present at this moment.
        let cycle = std::mem::take(&mut self.pending);
        self.solve_cycle(&cycle)
    }

    /// Discard the in-progress cycle without solving (timeout or explicit
    /// cancellation).
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            debug!("discarding incomplete cycle ({} of {} arrivals)", self.pending.len(), self.stations.len());
        }
        self.pending.clear();
    }

    /// True while a cycle has at least one arrival recorded.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn stations(&self) -> &StationSet {
        &self.stations
    }

    fn solve_cycle(&mut self, cycle: &HashMap<String, f64>) -> SubmitOutcome {
        let t_ref = cycle[&self.stations.reference().id];
        let observed_deltas: Vec<f64> = self
            .stations
            .non_reference()
            .iter()
            .map(|s| (t_ref - cycle[&s.id]) * MS_TO_TIME_UNITS)
            .collect();

        let stations = &self.stations;
        let result = solve(
            |p| residuals(p, stations, &observed_deltas),
            self.initial_position,
            &self.solve_config,
        );

        match result {
            Ok(estimate) => {
                info!(
                    "cycle solved: ({:.1}, {:.1}) after {} iterations (converged={}, loss={:.3e})",
                    estimate.x, estimate.y, estimate.iterations, estimate.converged, estimate.loss
                );
                if let Err(e) = self.sink.publish(&estimate) {
                    warn!("position sink rejected estimate: {e}");
                }
                SubmitOutcome::Solved(estimate)
            }
            Err(e) => {
                warn!("solve aborted, cycle discarded: {e}");
                SubmitOutcome::Aborted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NullSink, SinkError};
    use crate::stations::Station;
    use std::sync::Mutex;

    fn grid() -> Arc<StationSet> {
        Arc::new(
            StationSet::with_default_speed(vec![
                Station::new("source1", 0.0, 0.0),
                Station::new("source2", 100_000.0, 0.0),
                Station::new("source3", 0.0, 100_000.0),
            ])
            .unwrap(),
        )
    }

    fn aggregator<S: PositionSink>(sink: S) -> MeasurementAggregator<S> {
        MeasurementAggregator::new(grid(), SolveConfig::default(), [50_000.0, 50_000.0], sink)
    }

    /// Test sink that remembers every published estimate.
    #[derive(Default)]
    struct RecordingSink(Arc<Mutex<Vec<PositionEstimate>>>);

    impl PositionSink for RecordingSink {
        fn publish(&mut self, estimate: &PositionEstimate) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(*estimate);
            Ok(())
        }
    }

    /// Test sink whose consumer is permanently gone.
    struct OfflineSink;

    impl PositionSink for OfflineSink {
        fn publish(&mut self, _estimate: &PositionEstimate) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("consumer offline".into()))
        }
    }

    /// Test sink that must never be reached.
    struct PanicSink;

    impl PositionSink for PanicSink {
        fn publish(&mut self, _estimate: &PositionEstimate) -> Result<(), SinkError> {
            panic!("nothing may be published here");
        }
    }

    /// Arrival stamps (ms) for an emitter equidistant from all three
    /// stations: every station hears it at the same instant.
    const EQUIDISTANT_MS: f64 = 120.0;

    #[test]
    fn incomplete_cycle_never_solves() {
        let mut agg = aggregator(NullSink);
        assert_eq!(agg.submit("source1", EQUIDISTANT_MS), SubmitOutcome::Pending);
        assert_eq!(agg.submit("source2", EQUIDISTANT_MS), SubmitOutcome::Pending);
        assert!(agg.has_pending());
    }

    #[test]
    fn completing_cycle_solves_once_and_clears() {
        let published = Arc::new(Mutex::new(Vec::new()));
        let mut agg = aggregator(RecordingSink(published.clone()));

        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        let est = match agg.submit("source3", EQUIDISTANT_MS) {
            SubmitOutcome::Solved(est) => est,
            other => panic!("expected a solve, got {other:?}"),
        };
        assert!(est.converged);
        assert!((est.x - 50_000.0).abs() < 1e-3);
        assert!((est.y - 50_000.0).abs() < 1e-3);
        assert_eq!(published.lock().unwrap().len(), 1);
        assert!(!agg.has_pending());
    }

    #[test]
    fn duplicate_submission_overwrites() {
        let mut agg = aggregator(NullSink);
        agg.submit("source1", 999.0);
        // Second report for source1 replaces the first before the cycle closes.
        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        let outcome = agg.submit("source3", EQUIDISTANT_MS);

        match outcome {
            SubmitOutcome::Solved(est) => {
                // With the overwritten (equal) stamps the solution is the
                // equidistant point, not whatever 999.0 would have produced.
                assert!((est.x - 50_000.0).abs() < 1e-3);
                assert!((est.y - 50_000.0).abs() < 1e-3);
            }
            other => panic!("expected a solve, got {other:?}"),
        }
    }

    #[test]
    fn unknown_station_leaves_cycle_untouched() {
        let mut agg = aggregator(NullSink);
        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        assert_eq!(agg.submit("source9", EQUIDISTANT_MS), SubmitOutcome::Rejected);
        // Still pending: the malformed event neither completed nor cleared it.
        assert!(agg.has_pending());
        // The genuine third station still closes the cycle normally.
        assert!(matches!(agg.submit("source3", EQUIDISTANT_MS), SubmitOutcome::Solved(_)));
    }

    #[test]
    fn non_finite_timestamp_is_rejected() {
        let mut agg = aggregator(NullSink);
        assert_eq!(agg.submit("source1", f64::NAN), SubmitOutcome::Rejected);
        assert!(!agg.has_pending());
    }

    #[test]
    fn reset_discards_without_solving() {
        let mut agg = aggregator(PanicSink);
        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        agg.reset();
        assert!(!agg.has_pending());
        // The next full cycle solves normally even after the discard.
        let mut agg = aggregator(NullSink);
        agg.submit("source1", EQUIDISTANT_MS);
        agg.reset();
        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        assert!(matches!(agg.submit("source3", EQUIDISTANT_MS), SubmitOutcome::Solved(_)));
    }

    #[test]
    fn sink_failure_does_not_poison_later_cycles() {
        let mut agg = aggregator(OfflineSink);
        // Publish fails but the cycle still counts as solved and clears.
        agg.submit("source1", EQUIDISTANT_MS);
        agg.submit("source2", EQUIDISTANT_MS);
        assert!(matches!(agg.submit("source3", EQUIDISTANT_MS), SubmitOutcome::Solved(_)));
        assert!(!agg.has_pending());

        agg.submit("source1", EQUIDISTANT_MS + 5.0);
        agg.submit("source2", EQUIDISTANT_MS + 5.0);
        assert!(matches!(agg.submit("source3", EQUIDISTANT_MS + 5.0), SubmitOutcome::Solved(_)));
    }
}
