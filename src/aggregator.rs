//! The aggregation cycle: record, evaluate, update the alert.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value;
use thiserror::Error;

use crate::data::{
    evaluate, Alert, History, PatientId, PatientSnapshot, Reading, SnapshotError, Thresholds,
    Vital,
};

/// A raw snapshot from a batch that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("snapshot #{index}: {error}")]
pub struct RejectedSnapshot {
    /// Position of the snapshot within its batch.
    pub index: usize,
    pub error: SnapshotError,
}

/// Outcome of ingesting a raw batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedSnapshot>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Owns the rolling history and the current alert.
///
/// Every processed snapshot replaces the alert: with a fresh one if it
/// has violations, with nothing otherwise. After a batch the alert
/// therefore describes only the last snapshot processed.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    thresholds: Thresholds,
    history: History,
    alert: Option<Alert>,
    cycles: u64,
}

impl Aggregator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            history: History::new(),
            alert: None,
            cycles: 0,
        }
    }

    /// Process a batch of validated snapshots in order.
    pub fn ingest(&mut self, batch: &[PatientSnapshot]) {
        for snapshot in batch {
            self.process(snapshot);
        }
        self.cycles += 1;
    }

    /// Validate and process a batch of raw JSON snapshots.
    ///
    /// Invalid snapshots are skipped without touching history or the
    /// alert; the rest of the batch is still processed.
    pub fn ingest_raw(&mut self, batch: &[Value]) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, value) in batch.iter().enumerate() {
            match PatientSnapshot::from_value(value) {
                Ok(snapshot) => {
                    self.process(&snapshot);
                    report.accepted += 1;
                }
                Err(error) => report.rejected.push(RejectedSnapshot { index, error }),
            }
        }

        self.cycles += 1;
        report
    }

    fn process(&mut self, snapshot: &PatientSnapshot) {
        self.history.record(snapshot);
        let evaluation = evaluate(snapshot, &self.thresholds);
        self.alert = Alert::from_evaluation(&snapshot.id, evaluation);
    }

    /// The current alert, if the last processed snapshot was abnormal.
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn series(&self, patient: &PatientId, vital: Vital) -> Vec<Reading> {
        self.history.series(patient, vital)
    }

    pub fn latest(&self, patient: &PatientId, vital: Vital) -> Option<Reading> {
        self.history.latest(patient, vital)
    }

    /// Known patients in first-seen order.
    pub fn patients(&self) -> &[PatientId] {
        self.history.patients()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Number of completed ingestion passes.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// A cloneable handle to an [`Aggregator`] shared between an ingesting
/// task and readers.
///
/// A whole batch is ingested under one write lock, so readers see the
/// state from before or after a batch, never a partially applied one.
#[derive(Debug, Clone, Default)]
pub struct SharedAggregator {
    inner: Arc<RwLock<Aggregator>>,
}

impl SharedAggregator {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregator)),
        }
    }

    pub fn ingest(&self, batch: &[PatientSnapshot]) {
        self.inner.write().ingest(batch);
    }

    pub fn ingest_raw(&self, batch: &[Value]) -> IngestReport {
        self.inner.write().ingest_raw(batch)
    }

    /// Borrow the aggregator for a consistent multi-query read.
    pub fn read(&self) -> RwLockReadGuard<'_, Aggregator> {
        self.inner.read()
    }

    pub fn alert(&self) -> Option<Alert> {
        self.inner.read().alert().cloned()
    }

    pub fn series(&self, patient: &PatientId, vital: Vital) -> Vec<Reading> {
        self.inner.read().series(patient, vital)
    }

    pub fn latest(&self, patient: &PatientId, vital: Vital) -> Option<Reading> {
        self.inner.read().latest(patient, vital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BloodPressure, HISTORY_CAPACITY};
    use serde_json::json;

    fn normal(id: u64) -> PatientSnapshot {
        PatientSnapshot {
            id: PatientId::from(id),
            temperature: 36.8,
            heart_rate: 72.0,
            blood_pressure: BloodPressure::new(120, 80),
            oxygen: 98.0,
            humidity: 45.0,
        }
    }

    fn feverish(id: u64) -> PatientSnapshot {
        PatientSnapshot {
            temperature: 38.2,
            ..normal(id)
        }
    }

    #[test]
    fn new_aggregator_has_no_alert() {
        let agg = Aggregator::default();
        assert!(agg.alert().is_none());
        assert!(agg.patients().is_empty());
        assert_eq!(agg.cycles(), 0);
    }

    #[test]
    fn later_normal_snapshots_clear_earlier_alert() {
        let mut agg = Aggregator::default();
        agg.ingest(&[feverish(1), normal(2), normal(3)]);
        assert!(agg.alert().is_none());
    }

    #[test]
    fn last_abnormal_snapshot_wins() {
        let mut agg = Aggregator::default();
        agg.ingest(&[feverish(1), normal(2), feverish(3)]);
        let alert = agg.alert().unwrap();
        assert_eq!(alert.patient, PatientId::from(3));
    }

    #[test]
    fn alert_survives_until_next_snapshot() {
        let mut agg = Aggregator::default();
        agg.ingest(&[feverish(1)]);
        assert!(agg.alert().is_some());
        agg.ingest(&[]);
        assert!(agg.alert().is_some());
        agg.ingest(&[normal(1)]);
        assert!(agg.alert().is_none());
    }

    #[test]
    fn single_oxygen_violation() {
        let mut agg = Aggregator::default();
        agg.ingest(&[PatientSnapshot {
            oxygen: 91.0,
            ..normal(7)
        }]);

        let alert = agg.alert().unwrap();
        assert_eq!(alert.violations.len(), 1);
        assert_eq!(alert.violations[0].vital, Vital::Oxygen);
        assert_eq!(alert.message(), "Alert for Patient 7: Oxygen Level 91% is abnormal.");
    }

    #[test]
    fn ingest_records_history_for_every_snapshot() {
        let mut agg = Aggregator::default();
        for _ in 0..12 {
            agg.ingest(&[normal(1), feverish(2)]);
        }
        assert_eq!(agg.patients(), &[PatientId::from(1), PatientId::from(2)]);
        assert_eq!(agg.series(&PatientId::from(2), Vital::Temperature).len(), HISTORY_CAPACITY);
        assert_eq!(
            agg.latest(&PatientId::from(2), Vital::Temperature),
            Some(Reading::Scalar(38.2))
        );
        assert_eq!(agg.cycles(), 12);
    }

    #[test]
    fn queries_are_idempotent() {
        let mut agg = Aggregator::default();
        agg.ingest(&[normal(1), feverish(2)]);

        let id = PatientId::from(2);
        assert_eq!(agg.alert().cloned(), agg.alert().cloned());
        assert_eq!(agg.series(&id, Vital::Temperature), agg.series(&id, Vital::Temperature));
        assert_eq!(agg.latest(&id, Vital::Oxygen), agg.latest(&id, Vital::Oxygen));
    }

    #[test]
    fn custom_thresholds_are_used() {
        let mut thresholds = Thresholds::default();
        thresholds.temperature.max = Some(39.0);
        let mut agg = Aggregator::new(thresholds);
        agg.ingest(&[feverish(1)]);
        assert!(agg.alert().is_none());
    }

    #[test]
    fn ingest_raw_skips_invalid_snapshots() {
        let mut agg = Aggregator::default();
        let batch = vec![
            json!({"id": 1, "temperature": 36.5, "heart_rate": 70, "blood_pressure": "118/76", "oxygen": 97, "humidity": 40}),
            json!({"id": 2, "temperature": 36.5, "heart_rate": 70, "blood_pressure": "11876", "oxygen": 97, "humidity": 40}),
            json!({"id": 3, "temperature": 38.9, "heart_rate": 70, "blood_pressure": "118/76", "oxygen": 97, "humidity": 40}),
        ];

        let report = agg.ingest_raw(&batch);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert!(report.rejected[0].to_string().starts_with("snapshot #1: patient 2"));

        assert!(agg.series(&PatientId::from(2), Vital::Temperature).is_empty());
        assert_eq!(agg.alert().unwrap().patient, PatientId::from(3));
    }

    #[test]
    fn rejected_last_snapshot_leaves_alert_untouched() {
        let mut agg = Aggregator::default();
        let batch = vec![
            json!({"id": 1, "temperature": 39.0, "heart_rate": 70, "blood_pressure": "118/76", "oxygen": 97, "humidity": 40}),
            json!({"id": 2, "temperature": 36.5}),
        ];
        let report = agg.ingest_raw(&batch);
        assert!(!report.is_clean());
        assert_eq!(agg.alert().unwrap().patient, PatientId::from(1));
    }

    #[test]
    fn shared_instances_are_independent() {
        let a = SharedAggregator::default();
        let b = SharedAggregator::default();
        a.ingest(&[feverish(1)]);
        assert!(a.alert().is_some());
        assert!(b.alert().is_none());
        assert!(b.series(&PatientId::from(1), Vital::Temperature).is_empty());
    }

    #[test]
    fn shared_handle_clones_see_the_same_state() {
        let shared = SharedAggregator::new(Aggregator::default());
        let reader = shared.clone();

        let writer = std::thread::spawn(move || {
            for _ in 0..20 {
                shared.ingest(&[normal(1), feverish(2)]);
            }
        });
        writer.join().unwrap();

        let agg = reader.read();
        assert_eq!(agg.cycles(), 20);
        assert_eq!(agg.series(&PatientId::from(1), Vital::HeartRate).len(), HISTORY_CAPACITY);
        assert_eq!(agg.alert().unwrap().patient, PatientId::from(2));
    }

    #[test]
    fn readers_never_observe_a_partially_ingested_batch() {
        let shared = SharedAggregator::default();
        let writer_handle = shared.clone();
        const BATCHES: u64 = 500;

        // Mid-batch, patient 1 would have one more reading than patient 2
        // and the feverish snapshot would still hold the alert.
        let writer = std::thread::spawn(move || {
            for _ in 0..BATCHES {
                writer_handle.ingest(&[feverish(1), normal(2)]);
            }
        });

        let reader = std::thread::spawn(move || loop {
            let agg = shared.read();
            let cycles = agg.cycles();
            let expected = (cycles as usize).min(HISTORY_CAPACITY);
            for vital in Vital::ALL {
                assert_eq!(agg.series(&PatientId::from(1), vital).len(), expected);
                assert_eq!(agg.series(&PatientId::from(2), vital).len(), expected);
            }
            assert!(agg.alert().is_none(), "alert visible after {cycles} cycles");
            if cycles == BATCHES {
                break;
            }
        });

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
