//! The single current alert.

use std::fmt;

use serde::{Serialize, Serializer};

use super::evaluator::{Evaluation, Violation};
use super::snapshot::PatientId;

/// Summary of every out-of-range vital for one patient.
///
/// Displays as e.g.
/// `Alert for Patient 7: Temperature 38.2°C is abnormal. Oxygen Level 91% is abnormal.`
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub patient: PatientId,
    pub violations: Vec<Violation>,
}

impl Alert {
    /// Build an alert from an evaluation, or `None` if nothing was abnormal.
    pub fn from_evaluation(patient: &PatientId, evaluation: Evaluation) -> Option<Self> {
        if !evaluation.is_abnormal() {
            return None;
        }
        Some(Self {
            patient: patient.clone(),
            violations: evaluation.violations,
        })
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alert for Patient {}:", self.patient)?;
        for violation in &self.violations {
            write!(f, " {}", violation.detail())?;
        }
        Ok(())
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
