//! # vitalwatch
//!
//! Rolling-window aggregation of patient vital signs with threshold alerts.
//!
//! Batches of patient snapshots arrive periodically from a source. Each
//! snapshot is validated, recorded into a bounded per-patient history, and
//! evaluated against clinical thresholds. The aggregator keeps a single
//! current alert describing the last evaluated snapshot that was out of
//! range.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   RawBatch   ┌───────────────────────────────────────┐
//! │  source  │─────────────▶│              aggregator               │
//! │ File     │              │  validate ─▶ History::record          │
//! │ Stream   │              │           └▶ evaluate ─▶ Alert        │
//! │ Channel  │              └───────────────────┬───────────────────┘
//! └──────────┘                                  │ series() / alert()
//!                                               ▼
//!                                         presentation
//! ```
//!
//! - **[`data`]**: Snapshot validation, thresholds, evaluation, history and alerts
//! - **[`aggregator`]**: The ingestion cycle and its lock-guarded shared handle
//! - **[`source`]**: The [`DataSource`] trait with file, stream and channel inputs
//! - **[`app`]**: Poll-then-ingest driver and state export
//! - **[`config`]**: Layered runtime settings
//!
//! ## Usage
//!
//! ```
//! use vitalwatch::{Aggregator, PatientId, Vital};
//! use serde_json::json;
//!
//! let mut aggregator = Aggregator::default();
//! let report = aggregator.ingest_raw(&[json!({
//!     "id": 7,
//!     "temperature": 38.2,
//!     "heart_rate": 80,
//!     "blood_pressure": "120/80",
//!     "oxygen": 91,
//!     "humidity": 40
//! })]);
//! assert!(report.is_clean());
//!
//! let alert = aggregator.alert().unwrap();
//! assert_eq!(
//!     alert.to_string(),
//!     "Alert for Patient 7: Temperature 38.2°C is abnormal. Oxygen Level 91% is abnormal."
//! );
//! assert_eq!(aggregator.series(&PatientId::from(7), Vital::Oxygen).len(), 1);
//! ```
//!
//! ### Feeding from a channel
//!
//! ```
//! use vitalwatch::{App, ChannelSource, Thresholds};
//!
//! let (tx, source) = ChannelSource::create("ward-3 gateway");
//! let app = App::new(Box::new(source), Thresholds::default());
//! ```

pub mod aggregator;
pub mod app;
pub mod config;
pub mod data;
pub mod source;

pub use aggregator::{Aggregator, IngestReport, RejectedSnapshot, SharedAggregator};
pub use app::App;
pub use config::Settings;
pub use data::{
    evaluate, Alert, BloodPressure, Evaluation, History, PatientId, PatientSnapshot, Reading,
    SnapshotError, Thresholds, Violation, Vital,
};
pub use source::{ChannelSource, DataSource, FileSource, RawBatch, StreamSource};
