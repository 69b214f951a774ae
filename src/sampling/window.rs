//! Per-sensor aggregation windows and the record they roll up into.
//!
//! A window collects every successful reading between two aggregation
//! boundaries. At the boundary it is summarised to min/max/avg and cleared.
//! A window with no samples summarises to [`WindowSummary::NoData`], which
//! serialises as explicit nulls rather than a misleading zero:
//!
//! ```json
//! {"time":"2026-03-01T12:00:10Z",
//!  "NH3":{"min":1.2,"max":1.9,"avg":1.5},
//!  "CO":{"min":null,"max":null,"avg":null},
//!  "O2":{"min":20.8,"max":20.9,"avg":20.85}}
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::sensors::MonitoredGas;

/// Samples of one sensor since the last boundary, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationWindow {
    samples: Vec<(DateTime<Utc>, f64)>,
}

impl AggregationWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: DateTime<Utc>, concentration: f64) {
        self.samples.push((at, concentration));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[(DateTime<Utc>, f64)] {
        &self.samples
    }

    /// Drop all samples, keeping the allocation for the next window.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn summarize(&self) -> WindowSummary {
        let mut values = self.samples.iter().map(|(_, v)| *v);
        let Some(first) = values.next() else {
            return WindowSummary::NoData;
        };

        let (min, max, sum) = values.fold((first, first, first), |(lo, hi, sum), v| {
            (lo.min(v), hi.max(v), sum + v)
        });
        WindowSummary::Stats {
            min,
            max,
            avg: sum / self.samples.len() as f64,
        }
    }
}

/// Statistics of one window, or the marker for an empty one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowSummary {
    Stats { min: f64, max: f64, avg: f64 },
    NoData,
}

impl WindowSummary {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

#[derive(Serialize)]
struct SummaryFields {
    min: Option<f64>,
    max: Option<f64>,
    avg: Option<f64>,
}

impl Serialize for WindowSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = match *self {
            Self::Stats { min, max, avg } => SummaryFields {
                min: Some(min),
                max: Some(max),
                avg: Some(avg),
            },
            Self::NoData => SummaryFields {
                min: None,
                max: None,
                avg: None,
            },
        };
        fields.serialize(serializer)
    }
}

/// One row of the time series: every gas's summary at a window boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    /// UTC time the window closed.
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub gases: BTreeMap<MonitoredGas, WindowSummary>,
}

impl AggregateRecord {
    pub fn summary(&self, gas: MonitoredGas) -> Option<&WindowSummary> {
        self.gases.get(&gas)
    }
}

/// Compact single-line rendering for the console log.
impl core::fmt::Display for AggregateRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.time.format("%Y-%m-%dT%H:%M:%SZ"))?;
        for (gas, summary) in &self.gases {
            match summary {
                WindowSummary::Stats { min, max, avg } => {
                    write!(f, " {gas}[min={min:.2} max={max:.2} avg={avg:.2}]")?
                }
                WindowSummary::NoData => write!(f, " {gas}[no data]")?,
            }
        }
        Ok(())
    }
}
