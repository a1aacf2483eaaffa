//! Typed patient snapshots and the validation that produces them.
//!
//! Producers send loosely-typed JSON objects. Everything past this module
//! works on [`PatientSnapshot`], where every field is present and numeric
//! and blood pressure is already split into its two components.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::vital::{Reading, Vital};

/// Opaque, stable patient identifier.
///
/// Producers may send ids as JSON numbers or strings; both are normalized
/// to their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a JSON id. Numbers and non-blank strings are accepted, so
    /// `1` and `"1"` name the same patient.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for PatientId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Blood pressure as two integer components, written `systolic/diastolic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

impl BloodPressure {
    pub fn new(systolic: u16, diastolic: u16) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

impl Serialize for BloodPressure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a blood pressure string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BloodPressureError {
    #[error("missing '/' separator")]
    MissingSeparator,
    #[error("expected exactly two components, found {0}")]
    WrongComponentCount(usize),
    #[error("component {0:?} is not an integer")]
    NotAnInteger(String),
}

impl FromStr for BloodPressure {
    type Err = BloodPressureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        match parts.as_slice() {
            [_] => Err(BloodPressureError::MissingSeparator),
            [systolic, diastolic] => Ok(Self {
                systolic: parse_component(systolic)?,
                diastolic: parse_component(diastolic)?,
            }),
            _ => Err(BloodPressureError::WrongComponentCount(parts.len())),
        }
    }
}

fn parse_component(part: &str) -> Result<u16, BloodPressureError> {
    part.trim().parse().map_err(|_| BloodPressureError::NotAnInteger(part.to_string()))
}

/// A snapshot that failed validation, with the field at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("snapshot is not a JSON object")]
    NotAnObject,

    #[error("snapshot has no usable `id`")]
    MissingId,

    #[error("patient {patient}: missing field `{field}`")]
    MissingField {
        patient: PatientId,
        field: &'static str,
    },

    #[error("patient {patient}: field `{field}` is not a finite number (got {value})")]
    NotNumeric {
        patient: PatientId,
        field: &'static str,
        value: String,
    },

    #[error("patient {patient}: invalid blood pressure {value:?}: {source}")]
    BloodPressure {
        patient: PatientId,
        value: String,
        source: BloodPressureError,
    },
}

/// One validated reading of every monitored vital for one patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSnapshot {
    pub id: PatientId,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Beats per minute.
    pub heart_rate: f64,
    pub blood_pressure: BloodPressure,
    /// Percent saturation.
    pub oxygen: f64,
    /// Ambient relative humidity, percent.
    pub humidity: f64,
}

impl PatientSnapshot {
    /// Validate a raw JSON object into a typed snapshot.
    ///
    /// The id is checked first so that every later error can name the patient.
    pub fn from_value(value: &Value) -> Result<Self, SnapshotError> {
        let obj = value.as_object().ok_or(SnapshotError::NotAnObject)?;
        let id = obj.get("id").and_then(PatientId::from_json).ok_or(SnapshotError::MissingId)?;

        let temperature = number_field(obj, &id, Vital::Temperature)?;
        let heart_rate = number_field(obj, &id, Vital::HeartRate)?;
        let blood_pressure = blood_pressure_field(obj, &id)?;
        let oxygen = number_field(obj, &id, Vital::Oxygen)?;
        let humidity = number_field(obj, &id, Vital::Humidity)?;

        Ok(Self {
            id,
            temperature,
            heart_rate,
            blood_pressure,
            oxygen,
            humidity,
        })
    }

    /// The recorded value for one vital.
    pub fn reading(&self, vital: Vital) -> Reading {
        match vital {
            Vital::Temperature => Reading::Scalar(self.temperature),
            Vital::HeartRate => Reading::Scalar(self.heart_rate),
            Vital::BloodPressure => Reading::BloodPressure(self.blood_pressure),
            Vital::Oxygen => Reading::Scalar(self.oxygen),
            Vital::Humidity => Reading::Scalar(self.humidity),
        }
    }
}

impl TryFrom<&Value> for PatientSnapshot {
    type Error = SnapshotError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn number_field(
    obj: &Map<String, Value>,
    patient: &PatientId,
    vital: Vital,
) -> Result<f64, SnapshotError> {
    let field = vital.key();
    let value = obj.get(field).ok_or_else(|| SnapshotError::MissingField {
        patient: patient.clone(),
        field,
    })?;

    value.as_f64().filter(|v| v.is_finite()).ok_or_else(|| SnapshotError::NotNumeric {
        patient: patient.clone(),
        field,
        value: value.to_string(),
    })
}

fn blood_pressure_field(
    obj: &Map<String, Value>,
    patient: &PatientId,
) -> Result<BloodPressure, SnapshotError> {
    let field = Vital::BloodPressure.key();
    let value = obj.get(field).ok_or_else(|| SnapshotError::MissingField {
        patient: patient.clone(),
        field,
    })?;

    let text = value.as_str().ok_or_else(|| SnapshotError::BloodPressure {
        patient: patient.clone(),
        value: value.to_string(),
        source: BloodPressureError::MissingSeparator,
    })?;

    text.parse().map_err(|source| SnapshotError::BloodPressure {
        patient: patient.clone(),
        value: text.to_string(),
        source,
    })
}
