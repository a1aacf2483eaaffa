//! The monitored vitals and the values recorded for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::snapshot::BloodPressure;

/// A monitored physiological or environmental quantity.
///
/// The declaration order is the evaluation order used by the threshold
/// evaluator and the order in which alert details are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    Temperature,
    HeartRate,
    BloodPressure,
    Oxygen,
    Humidity,
}

impl Vital {
    /// Number of monitored vitals.
    pub const COUNT: usize = 5;

    /// All vitals in evaluation order.
    pub const ALL: [Vital; Vital::COUNT] = [
        Vital::Temperature,
        Vital::HeartRate,
        Vital::BloodPressure,
        Vital::Oxygen,
        Vital::Humidity,
    ];

    /// Field name used on the wire and in history queries.
    pub fn key(&self) -> &'static str {
        match self {
            Vital::Temperature => "temperature",
            Vital::HeartRate => "heart_rate",
            Vital::BloodPressure => "blood_pressure",
            Vital::Oxygen => "oxygen",
            Vital::Humidity => "humidity",
        }
    }

    /// Human-readable label used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            Vital::Temperature => "Temperature",
            Vital::HeartRate => "Heart Rate",
            Vital::BloodPressure => "Blood Pressure",
            Vital::Oxygen => "Oxygen Level",
            Vital::Humidity => "Humidity",
        }
    }

    /// Position in [`Vital::ALL`].
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// Format a reading with this vital's unit, e.g. `38.2°C` or `72 bpm`.
    pub fn format_reading(&self, reading: &Reading) -> String {
        match self {
            Vital::Temperature => format!("{}°C", reading),
            Vital::HeartRate => format!("{} bpm", reading),
            Vital::BloodPressure => reading.to_string(),
            Vital::Oxygen | Vital::Humidity => format!("{}%", reading),
        }
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a vital name does not match any known wire key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vital: {0}")]
pub struct UnknownVital(pub String);

impl FromStr for Vital {
    type Err = UnknownVital;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vital::ALL
            .into_iter()
            .find(|v| v.key() == s.trim())
            .ok_or_else(|| UnknownVital(s.to_string()))
    }
}

/// A single recorded value for one vital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Scalar(f64),
    BloodPressure(BloodPressure),
}

impl Reading {
    /// The value to plot for this reading. Blood pressure charts use systolic.
    pub fn primary(&self) -> f64 {
        match self {
            Reading::Scalar(v) => *v,
            Reading::BloodPressure(bp) => f64::from(bp.systolic),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Scalar(v) => write!(f, "{}", v),
            Reading::BloodPressure(bp) => write!(f, "{}", bp),
        }
    }
}
