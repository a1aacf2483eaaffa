//! Threshold evaluation of a single snapshot.

use serde::Serialize;

use super::snapshot::PatientSnapshot;
use super::thresholds::Thresholds;
use super::vital::{Reading, Vital};

/// One vital outside its normal range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub vital: Vital,
    pub reading: Reading,
}

impl Violation {
    /// Human-readable detail, e.g. `Oxygen Level 91% is abnormal.`
    pub fn detail(&self) -> String {
        format!(
            "{} {} is abnormal.",
            self.vital.label(),
            self.vital.format_reading(&self.reading)
        )
    }
}

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Violations in evaluation order.
    pub violations: Vec<Violation>,
}

impl Evaluation {
    pub fn is_abnormal(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether a given vital was reported.
    pub fn violates(&self, vital: Vital) -> bool {
        self.violations.iter().any(|v| v.vital == vital)
    }
}

/// Evaluate every vital of `snapshot` against `thresholds`.
pub fn evaluate(snapshot: &PatientSnapshot, thresholds: &Thresholds) -> Evaluation {
    let violations = Vital::ALL
        .into_iter()
        .filter(|&vital| !is_normal(snapshot, vital, thresholds))
        .map(|vital| Violation {
            vital,
            reading: snapshot.reading(vital),
        })
        .collect();

    Evaluation { violations }
}

fn is_normal(snapshot: &PatientSnapshot, vital: Vital, thresholds: &Thresholds) -> bool {
    match vital {
        Vital::Temperature => thresholds.temperature.contains(snapshot.temperature),
        Vital::HeartRate => thresholds.heart_rate.contains(snapshot.heart_rate),
        Vital::BloodPressure => {
            let limit = &thresholds.blood_pressure;
            let bp = &snapshot.blood_pressure;
            bp.systolic <= limit.systolic_max && bp.diastolic <= limit.diastolic_max
        }
        Vital::Oxygen => thresholds.oxygen.contains(snapshot.oxygen),
        Vital::Humidity => thresholds.humidity.contains(snapshot.humidity),
    }
}
