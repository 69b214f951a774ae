//! Hazard detection and the alert state machine.
//!
//! ```text
//!  SamplingEngine ──writes──▶ AlertFlags ◀──reads── AlertMachine ──▶ AlertOutputs
//!                  (AlertLevels)
//! ```
//!
//! [`AlertFlags`] is the only state shared between the two tasks. Each
//! flag has exactly one writer (the sampling engine) and one reader (the
//! alert machine); atomics keep that contract sound on any scheduler.

pub mod button;
pub mod machine;

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::MonitorConfig;
use crate::sensors::MonitoredGas;

pub use machine::{AlertMachine, AlertPhase, Blink};

/// Per-gas alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertLevels {
    /// Alert when NH3 rises above (ppm).
    pub nh3_above: f64,
    /// Alert when CO rises above (ppm).
    pub co_above: f64,
    /// Alert when O2 falls below (% vol).
    pub o2_below: f64,
}

impl Default for AlertLevels {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for AlertLevels {
    fn from(c: &MonitorConfig) -> Self {
        Self {
            nh3_above: c.nh3_alert_ppm,
            co_above: c.co_alert_ppm,
            o2_below: c.o2_alert_percent,
        }
    }
}

impl AlertLevels {
    /// Whether `concentration` of `gas` is hazardous.
    pub fn is_hazard(&self, gas: MonitoredGas, concentration: f64) -> bool {
        match gas {
            MonitoredGas::Nh3 => concentration > self.nh3_above,
            MonitoredGas::Co => concentration > self.co_above,
            MonitoredGas::O2 => concentration < self.o2_below,
        }
    }
}

/// Live per-gas alert state.
#[derive(Debug, Default)]
pub struct AlertFlags {
    nh3: AtomicBool,
    co: AtomicBool,
    o2: AtomicBool,
}

impl AlertFlags {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, gas: MonitoredGas) -> &AtomicBool {
        match gas {
            MonitoredGas::Nh3 => &self.nh3,
            MonitoredGas::Co => &self.co,
            MonitoredGas::O2 => &self.o2,
        }
    }

    pub fn set(&self, gas: MonitoredGas, alert: bool) {
        self.slot(gas).store(alert, Ordering::Release);
    }

    pub fn get(&self, gas: MonitoredGas) -> bool {
        self.slot(gas).load(Ordering::Acquire)
    }

    pub fn any(&self) -> bool {
        MonitoredGas::ALL.iter().any(|g| self.get(*g))
    }
}
