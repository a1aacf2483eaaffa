//! Data models and rule evaluation for patient vital signs.
//!
//! ## Submodules
//!
//! - [`vital`]: The five monitored vitals, their labels and units
//! - [`snapshot`]: Validation of raw producer JSON into [`PatientSnapshot`]
//! - [`thresholds`]: Normal ranges per vital ([`Thresholds`])
//! - [`evaluator`]: Stateless evaluation of one snapshot against the thresholds
//! - [`history`]: Rolling per-patient, per-vital windows ([`History`])
//! - [`alert`]: The single current [`Alert`]
//!
//! ## Data Flow
//!
//! ```text
//! raw JSON object
//!        │
//!        ▼
//! PatientSnapshot::from_value()
//!        │
//!        ├──▶ History::record()
//!        │
//!        └──▶ evaluate() ──▶ Alert::from_evaluation()
//! ```

pub mod alert;
pub mod evaluator;
pub mod history;
pub mod snapshot;
pub mod thresholds;
pub mod vital;

pub use alert::Alert;
pub use evaluator::{evaluate, Evaluation, Violation};
pub use history::{History, PatientHistory, HISTORY_CAPACITY};
pub use snapshot::{BloodPressure, BloodPressureError, PatientId, PatientSnapshot, SnapshotError};
pub use thresholds::{BloodPressureLimit, Bound, Thresholds};
pub use vital::{Reading, UnknownVital, Vital};
