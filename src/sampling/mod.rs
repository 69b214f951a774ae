//! Sampling and aggregation engine.
//!
//! ```text
//!   ┌─ every measurement period ─────────────────────────────┐
//!   │  pending = all sensors                                 │
//!   │  loop: read_all each pending ─▶ ok: window + flag      │
//!   │                               └▶ err: stays pending    │
//!   │        pending empty? done : sleep 50 ms, retry        │
//!   └────────────────────────────────────────────────────────┘
//!   every aggregation period: summarise windows ─▶ RecordSink
//! ```
//!
//! Both periods run on absolute deadline grids anchored at start-up. A
//! tick that overruns its period does not shift the grid: the engine
//! skips to the next deadline still in the future. A tick that cannot
//! finish before the aggregation deadline is abandoned so that every
//! window still closes on time; sensors that never answered show up as
//! `NoData` in that window's record.

pub mod window;

use core::convert::Infallible;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use embedded_hal::i2c::I2c;
use log::{Level, debug, info, log, warn};

use crate::alert::{AlertFlags, AlertLevels};
use crate::app::ports::{Clock, RecordSink};
use crate::config::MonitorConfig;
use crate::error::{ConfigError, DriverError, Error, SinkError};
use crate::sensors::{MonitoredGas, MultiGasSensor, SensorReading};

pub use window::{AggregateRecord, AggregationWindow, WindowSummary};

/// Pause between retry rounds for sensors that failed within a tick.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// One slot per monitored gas.
pub const MAX_SENSORS: usize = MonitoredGas::ALL.len();

/// Timing and thresholds the engine runs with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    pub measurement_interval: Duration,
    pub aggregation_interval: Duration,
    pub levels: AlertLevels,
}

impl SamplingSettings {
    /// Derive settings from a config, rejecting it if it fails validation.
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            measurement_interval: config.measurement_interval(),
            aggregation_interval: config.aggregation_interval(),
            levels: AlertLevels::from(config),
        })
    }
}

#[derive(Debug)]
struct SensorSlot {
    gas: MonitoredGas,
    driver: MultiGasSensor,
    window: AggregationWindow,
}

/// Owns the sensor table and, for its lifetime, the bus and sink.
pub struct SamplingEngine<'a, B, C, S> {
    bus: &'a mut B,
    clock: &'a C,
    flags: &'a AlertFlags,
    sink: &'a mut S,
    settings: SamplingSettings,
    sensors: heapless::Vec<SensorSlot, MAX_SENSORS>,
}

impl<'a, B, C, S> SamplingEngine<'a, B, C, S>
where
    B: I2c,
    C: Clock,
    S: RecordSink,
{
    pub fn new(
        bus: &'a mut B,
        clock: &'a C,
        flags: &'a AlertFlags,
        sink: &'a mut S,
        settings: SamplingSettings,
    ) -> Self {
        Self {
            bus,
            clock,
            flags,
            sink,
            settings,
            sensors: heapless::Vec::new(),
        }
    }

    /// Register the driver for `gas`. Each gas may appear once.
    pub fn add_sensor(&mut self, gas: MonitoredGas, driver: MultiGasSensor) -> Result<(), ConfigError> {
        if self.sensors.iter().any(|s| s.gas == gas) {
            return Err(ConfigError::SensorTable("gas already has a sensor"));
        }
        self.sensors
            .push(SensorSlot {
                gas,
                driver,
                window: AggregationWindow::new(),
            })
            .map_err(|_| ConfigError::SensorTable("sensor table full"))?;
        info!("SAMPLE | {} sensor at {:#04x}", gas, driver.address());
        Ok(())
    }

    /// Samples collected for `gas` since the last window closed.
    pub fn window(&self, gas: MonitoredGas) -> Option<&AggregationWindow> {
        self.sensors.iter().find(|s| s.gas == gas).map(|s| &s.window)
    }

    /// Measure every sensor once. Sensors that fail are retried every
    /// [`RETRY_BACKOFF`]; sensors that already answered are not re-read.
    ///
    /// Returns `true` when every sensor produced a reading, `false` when
    /// the tick was abandoned at `give_up_at`.
    pub async fn sample_tick(&mut self, give_up_at: Instant) -> bool {
        let mut pending: heapless::Vec<usize, MAX_SENSORS> = (0..self.sensors.len()).collect();
        let mut faults = TickFaults::default();

        loop {
            let mut failed: heapless::Vec<usize, MAX_SENSORS> = heapless::Vec::new();

            for idx in pending {
                let slot = &mut self.sensors[idx];
                match slot.driver.read_all(&mut *self.bus, self.clock).await {
                    Ok(reading) => {
                        let at = self.clock.utc_now();
                        slot.window.push(at, reading.gas_concentration);
                        update_flag(self.flags, &self.settings.levels, slot.gas, &reading);
                    }
                    Err(e) => {
                        log!(
                            faults.level(idx, &e),
                            "SAMPLE | {} at {:#04x} read failed, retrying: {}",
                            slot.gas,
                            slot.driver.address(),
                            e
                        );
                        let _ = failed.push(idx);
                    }
                }
            }

            if failed.is_empty() {
                return true;
            }
            if self.clock.now() + RETRY_BACKOFF >= give_up_at {
                warn!(
                    "SAMPLE | tick abandoned at window boundary, {} sensor(s) unread",
                    failed.len()
                );
                return false;
            }
            self.clock.sleep(RETRY_BACKOFF).await;
            pending = failed;
        }
    }

    /// Summarise and clear every window, then hand the record to the sink.
    pub fn close_window(&mut self) -> Result<AggregateRecord, SinkError> {
        let time = self.clock.utc_now();
        let mut gases = BTreeMap::new();
        for slot in &mut self.sensors {
            let summary = slot.window.summarize();
            if summary.is_no_data() {
                warn!("AGG | no {} samples in this window", slot.gas);
            }
            gases.insert(slot.gas, summary);
            slot.window.clear();
        }

        let record = AggregateRecord { time, gases };
        info!("AGG | {}", record);
        self.sink.append(&record)?;
        Ok(record)
    }

    /// Run until the sink fails.
    pub async fn run(&mut self) -> Result<Infallible, Error> {
        let period = self.settings.measurement_interval;
        let window = self.settings.aggregation_interval;
        let start = self.clock.now();
        let mut next_measurement = start;
        let mut next_aggregation = start + window;

        info!(
            "SAMPLE | engine started: {} sensor(s), tick {:?}, window {:?}",
            self.sensors.len(),
            period,
            window
        );

        loop {
            self.clock.sleep_until(next_measurement).await;
            self.sample_tick(next_aggregation).await;

            let now = self.clock.now();
            next_measurement = next_on_grid(next_measurement, period, now);

            if now >= next_aggregation {
                next_aggregation = next_on_grid(next_aggregation, window, now);
                self.close_window()?;
            }
        }
    }
}

/// Sensors that already failed once in the current tick. Their first
/// failure is logged at `error` (wiring) or `warn`; retries at `debug`.
#[derive(Debug, Default)]
struct TickFaults {
    reported: heapless::Vec<usize, MAX_SENSORS>,
}

impl TickFaults {
    fn level(&mut self, slot: usize, error: &DriverError) -> Level {
        if self.reported.contains(&slot) {
            return Level::Debug;
        }
        let _ = self.reported.push(slot);
        if error.is_wiring_fault() {
            Level::Error
        } else {
            Level::Warn
        }
    }
}

fn update_flag(flags: &AlertFlags, levels: &AlertLevels, gas: MonitoredGas, reading: &SensorReading) {
    let hazard = levels.is_hazard(gas, reading.gas_concentration);
    let was = flags.get(gas);
    flags.set(gas, hazard);

    debug!(
        "SAMPLE | {} = {:.2} ({:.1}\u{00b0}C)",
        gas, reading.gas_concentration, reading.temperature
    );
    if hazard && !was {
        warn!("SAMPLE | {} {:.2} crossed alert level", gas, reading.gas_concentration);
    } else if !hazard && was {
        info!("SAMPLE | {} back in range ({:.2})", gas, reading.gas_concentration);
    }
}

/// Next deadline after `deadline` on its `period` grid that is still ahead
/// of `now`. `period` must be non-zero.
fn next_on_grid(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let mut next = deadline + period;
    let mut skipped = 0u32;
    while next <= now {
        next += period;
        skipped += 1;
    }
    if skipped > 0 {
        debug!("SAMPLE | overran, skipped {} deadline(s)", skipped);
    }
    next
}
