//! Rolling per-patient, per-vital history for trend charts.

use std::collections::{HashMap, VecDeque};

use super::snapshot::{PatientId, PatientSnapshot};
use super::vital::{Reading, Vital};

/// Number of readings kept per patient per vital.
pub const HISTORY_CAPACITY: usize = 10;

/// The recent readings of one patient, one window per vital.
#[derive(Debug, Clone, Default)]
pub struct PatientHistory {
    series: [VecDeque<Reading>; Vital::COUNT],
}

impl PatientHistory {
    fn push(&mut self, vital: Vital, reading: Reading) {
        let window = &mut self.series[vital.index()];
        window.push_back(reading);
        if window.len() > HISTORY_CAPACITY {
            window.pop_front();
        }
    }

    /// Readings for a vital, oldest first.
    pub fn series(&self, vital: Vital) -> &VecDeque<Reading> {
        &self.series[vital.index()]
    }

    pub fn latest(&self, vital: Vital) -> Option<Reading> {
        self.series(vital).back().copied()
    }
}

/// Tracks the last [`HISTORY_CAPACITY`] readings of every vital for every
/// patient seen so far.
///
/// Patients are created lazily on their first snapshot and are never
/// dropped for the lifetime of the store.
#[derive(Debug, Clone, Default)]
pub struct History {
    patients: HashMap<PatientId, PatientHistory>,
    /// Patient ids in first-seen order.
    order: Vec<PatientId>,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every vital of `snapshot` to its patient's windows.
    ///
    /// Identical consecutive readings are all recorded.
    pub fn record(&mut self, snapshot: &PatientSnapshot) {
        if !self.patients.contains_key(&snapshot.id) {
            self.order.push(snapshot.id.clone());
        }
        let patient = self.patients.entry(snapshot.id.clone()).or_default();
        for vital in Vital::ALL {
            patient.push(vital, snapshot.reading(vital));
        }
    }

    /// Most recent reading of `vital` for `patient`.
    pub fn latest(&self, patient: &PatientId, vital: Vital) -> Option<Reading> {
        self.patients.get(patient)?.latest(vital)
    }

    /// Recorded readings of `vital` for `patient`, oldest first.
    ///
    /// Returns an empty Vec for unknown patients.
    pub fn series(&self, patient: &PatientId, vital: Vital) -> Vec<Reading> {
        self.patients
            .get(patient)
            .map(|p| p.series(vital).iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn patient(&self, patient: &PatientId) -> Option<&PatientHistory> {
        self.patients.get(patient)
    }

    /// Known patient ids in first-seen order.
    pub fn patients(&self) -> &[PatientId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
