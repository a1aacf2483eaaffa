//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then environment variables prefixed with `VITALWATCH` (nested keys use
//! `__`, e.g. `VITALWATCH_THRESHOLDS__OXYGEN__MIN=92`).
//!
//! ```toml
//! refresh_secs = 1
//! log_level = "info"
//!
//! [thresholds.temperature]
//! min = 36.0
//! max = 38.0
//! ```

use std::path::Path;

use anyhow::Result;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::Thresholds;

/// Process-wide settings for the poller and aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between polls of a file source.
    pub refresh_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_secs: 1,
            log_level: "info".to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Settings {
    /// Load settings, reading `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("VITALWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
