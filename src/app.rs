//! Polling driver: pulls batches from a source into the aggregator.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::aggregator::{Aggregator, SharedAggregator};
use crate::data::{Alert, Thresholds, Vital};
use crate::source::DataSource;

/// Main application state.
pub struct App {
    source: Box<dyn DataSource>,
    aggregator: SharedAggregator,
    pub load_error: Option<String>,
}

impl App {
    /// Create a new App with the given data source and thresholds.
    pub fn new(source: Box<dyn DataSource>, thresholds: Thresholds) -> Self {
        Self::with_aggregator(source, SharedAggregator::new(Aggregator::new(thresholds)))
    }

    /// Create an App that feeds an existing shared aggregator.
    pub fn with_aggregator(source: Box<dyn DataSource>, aggregator: SharedAggregator) -> Self {
        Self {
            source,
            aggregator,
            load_error: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Handle for readers of the aggregated state.
    pub fn aggregator(&self) -> &SharedAggregator {
        &self.aggregator
    }

    pub fn alert(&self) -> Option<Alert> {
        self.aggregator.alert()
    }

    /// Poll the data source and ingest any new batch.
    ///
    /// Returns true if a batch was ingested. Source failures are surfaced
    /// through `load_error` rather than returned; a failed read never
    /// reaches the aggregator, which keeps its last-known state.
    pub fn reload_data(&mut self) -> bool {
        let batch = self.source.poll();

        self.load_error = self.source.error();
        if let Some(ref err) = self.load_error {
            tracing::debug!(source = self.source.description(), "Source error: {}", err);
        }

        let Some(batch) = batch else {
            return false;
        };

        let previous = self.aggregator.alert();
        let report = self.aggregator.ingest_raw(&batch);

        for rejected in &report.rejected {
            tracing::warn!("Rejected {}", rejected);
        }
        tracing::debug!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "Ingested batch"
        );

        let current = self.aggregator.alert();
        if current != previous {
            match &current {
                Some(alert) => tracing::warn!(patient = %alert.patient, "{}", alert),
                None => tracing::info!("All monitored patients within range"),
            }
        }

        true
    }

    /// Export the current aggregated state to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_value())?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn export_value(&self) -> Value {
        let agg = self.aggregator.read();

        let patients: Vec<Value> = agg
            .patients()
            .iter()
            .map(|id| {
                let mut series = Map::new();
                for vital in Vital::ALL {
                    series.insert(vital.key().to_string(), json!(agg.series(id, vital)));
                }
                json!({
                    "id": id,
                    "history": Value::Object(series),
                })
            })
            .collect();

        json!({
            "source": self.source.description(),
            "cycles": agg.cycles(),
            "alert": agg.alert(),
            "patients": patients,
        })
    }
}
