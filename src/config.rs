//! System configuration parameters
//!
//! All tunable parameters for the GasWatch system. Provided once at
//! construction and immutable for the lifetime of the monitor. On host
//! builds they can be loaded from a JSON file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Alert thresholds ---
    /// NH3 alert above this concentration (ppm). 8-hour exposure limit.
    pub nh3_alert_ppm: f64,
    /// CO alert above this concentration (ppm).
    pub co_alert_ppm: f64,
    /// O2 alert below this level (% vol).
    pub o2_alert_percent: f64,

    // --- Timing ---
    /// Measurement period (milliseconds)
    pub measurement_interval_ms: u32,
    /// Aggregation window length (seconds)
    pub aggregation_interval_secs: u32,

    // --- Storage ---
    /// JSON-lines file receiving one aggregate record per window.
    /// `None` logs records to the console instead.
    pub record_path: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            nh3_alert_ppm: 50.0,
            co_alert_ppm: 100.0,
            o2_alert_percent: 20.0,

            measurement_interval_ms: 100,  // 10 Hz
            aggregation_interval_secs: 10, // 1 record / 10 s

            record_path: None,
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable alerting or stall the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.nh3_alert_ppm.is_finite() && self.nh3_alert_ppm > 0.0) {
            return Err(ConfigError::Invalid("nh3_alert_ppm must be positive"));
        }
        if !(self.co_alert_ppm.is_finite() && self.co_alert_ppm > 0.0) {
            return Err(ConfigError::Invalid("co_alert_ppm must be positive"));
        }
        if !(self.o2_alert_percent.is_finite()
            && self.o2_alert_percent > 0.0
            && self.o2_alert_percent <= 100.0)
        {
            return Err(ConfigError::Invalid("o2_alert_percent must be in (0, 100]"));
        }
        if self.measurement_interval_ms == 0 {
            return Err(ConfigError::Invalid("measurement_interval_ms must be non-zero"));
        }
        if self.aggregation_interval() < self.measurement_interval() {
            return Err(ConfigError::Invalid(
                "aggregation interval shorter than measurement interval",
            ));
        }
        Ok(())
    }

    pub fn measurement_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.measurement_interval_ms))
    }

    pub fn aggregation_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.aggregation_interval_secs))
    }
}
