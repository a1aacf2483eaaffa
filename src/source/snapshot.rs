//! Wire format shared by all sources.
//!
//! Producers send JSON objects shaped like
//! `{"id": 1, "temperature": 36.6, "heart_rate": 72, "blood_pressure": "120/80", "oxygen": 98, "humidity": 45.0}`.
//! A batch is a JSON array of such objects. Objects are kept as raw
//! [`Value`]s here and validated per snapshot by the aggregator, so one
//! malformed reading does not discard the rest of its batch.

use serde_json::Value;

use crate::data::{PatientId, PatientSnapshot};

/// One ingestion cycle's worth of raw patient snapshots.
pub type RawBatch = Vec<Value>;

/// Parse a payload holding either a batch (JSON array) or a single snapshot.
pub fn parse_batch(text: &str) -> serde_json::Result<RawBatch> {
    parse_value(serde_json::from_str(text)?)
}

/// Byte-slice variant of [`parse_batch`].
pub fn parse_batch_slice(bytes: &[u8]) -> serde_json::Result<RawBatch> {
    parse_value(serde_json::from_slice(bytes)?)
}

fn parse_value(value: Value) -> serde_json::Result<RawBatch> {
    match value {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Latest snapshot per patient, in first-seen order.
///
/// Streaming producers send one patient at a time; this collapses what has
/// arrived into the batch a poller would see. Entries are keyed by the
/// normalized [`PatientId`], so `1` and `"1"` are one patient.
///
/// Snapshots that fail validation are passed through exactly once so the
/// aggregator can report them, and never become the retained entry. An
/// invalid snapshot also evicts the patient's previous entry, which would
/// otherwise be re-ingested on every poll as if it were current.
#[derive(Debug, Clone, Default)]
pub struct LatestByPatient {
    entries: Vec<(PatientId, Value)>,
    pass_once: Vec<Value>,
}

impl LatestByPatient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch, replacing any earlier snapshot of the same patient.
    pub fn merge(&mut self, batch: RawBatch) {
        for snapshot in batch {
            let Some(id) = snapshot.get("id").and_then(PatientId::from_json) else {
                self.pass_once.push(snapshot);
                continue;
            };

            if PatientSnapshot::from_value(&snapshot).is_err() {
                self.entries.retain(|(key, _)| *key != id);
                self.pass_once.push(snapshot);
                continue;
            }

            match self.entries.iter_mut().find(|(key, _)| *key == id) {
                Some((_, slot)) => *slot = snapshot,
                None => self.entries.push((id, snapshot)),
            }
        }
    }

    /// The current latest-per-patient batch, followed by any snapshots
    /// waiting to be reported once.
    pub fn batch(&mut self) -> RawBatch {
        let mut batch: RawBatch = self.entries.iter().map(|(_, v)| v.clone()).collect();
        batch.append(&mut self.pass_once);
        batch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pass_once.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::data::{Reading, Vital};
    use serde_json::json;

    #[test]
    fn parses_array_and_single_object() {
        let batch = parse_batch(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(batch.len(), 2);

        let batch = parse_batch(r#"{"id": 1, "temperature": 36.6}"#).unwrap();
        assert_eq!(batch, vec![json!({"id": 1, "temperature": 36.6})]);

        assert!(parse_batch("not json").is_err());
    }

    fn vitals(id: Value, temperature: f64) -> Value {
        json!({
            "id": id,
            "temperature": temperature,
            "heart_rate": 72,
            "blood_pressure": "120/80",
            "oxygen": 97,
            "humidity": 45
        })
    }

    #[test]
    fn latest_replaces_same_patient_in_place() {
        let mut latest = LatestByPatient::new();
        latest.merge(vec![vitals(json!(1), 36.5), vitals(json!(2), 36.9)]);
        latest.merge(vec![vitals(json!(1), 37.1)]);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest.batch(), vec![vitals(json!(1), 37.1), vitals(json!(2), 36.9)]);
    }

    #[test]
    fn numeric_and_string_ids_collapse_to_one_patient() {
        let mut latest = LatestByPatient::new();
        latest.merge(vec![vitals(json!(1), 36.5)]);
        latest.merge(vec![vitals(json!("1"), 36.6)]);

        assert_eq!(latest.len(), 1);
        assert_eq!(latest.batch(), vec![vitals(json!("1"), 36.6)]);
    }

    #[test]
    fn collapsed_batch_records_each_patient_once_per_poll() {
        let mut latest = LatestByPatient::new();
        latest.merge(vec![vitals(json!(1), 36.5)]);
        latest.merge(vec![vitals(json!("1"), 36.6)]);

        let mut agg = Aggregator::default();
        agg.ingest_raw(&latest.batch());
        assert_eq!(
            agg.series(&PatientId::from(1), Vital::Temperature),
            vec![Reading::Scalar(36.6)]
        );
    }

    #[test]
    fn unkeyed_snapshots_are_passed_through_once() {
        let mut latest = LatestByPatient::new();
        latest.merge(vec![json!({"temperature": 36.6})]);
        assert_eq!(latest.batch().len(), 1);
        assert!(latest.batch().is_empty());
    }

    #[test]
    fn invalid_snapshot_is_reported_once_and_evicts_stale_entry() {
        let mut latest = LatestByPatient::new();
        latest.merge(vec![vitals(json!(9), 36.5), vitals(json!(2), 36.9)]);
        latest.merge(vec![json!({"id": 9, "temperature": "hot"})]);

        let first = latest.batch();
        assert_eq!(first, vec![vitals(json!(2), 36.9), json!({"id": 9, "temperature": "hot"})]);

        let second = latest.batch();
        assert_eq!(second, vec![vitals(json!(2), 36.9)]);
        assert_eq!(latest.len(), 1);
    }
}
