//! Clinical threshold rules.

use serde::{Deserialize, Serialize};

/// An inclusive range. A missing side means the vital has no bound there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bound {
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Whether `value` lies within the bound. Boundary values are in range.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Upper limits for blood pressure. There is no lower limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressureLimit {
    pub systolic_max: u16,
    pub diastolic_max: u16,
}

/// Normal range for every monitored vital.
///
/// The default is the clinical table used at the bedside; it can be
/// overridden through configuration but never changes once an aggregator
/// has been built with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Degrees Celsius.
    pub temperature: Bound,
    /// Beats per minute.
    pub heart_rate: Bound,
    pub blood_pressure: BloodPressureLimit,
    /// Percent saturation.
    pub oxygen: Bound,
    /// Percent relative humidity.
    pub humidity: Bound,
}

impl Thresholds {
    pub const CLINICAL: Thresholds = Thresholds {
        temperature: Bound::between(36.0, 37.5),
        heart_rate: Bound::between(60.0, 100.0),
        blood_pressure: BloodPressureLimit {
            systolic_max: 140,
            diastolic_max: 90,
        },
        oxygen: Bound::at_least(95.0),
        humidity: Bound::between(30.0, 70.0),
    };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::CLINICAL
    }
}
