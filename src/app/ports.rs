//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Monitor (alert machine · sampling engine)
//! ```
//!
//! Driven adapters (clock, alert GPIO, record sinks) implement these
//! traits. The domain consumes them via generics, so nothing in
//! `alert` or `sampling` touches hardware or wall time directly. The
//! sensor bus itself is `embedded_hal::i2c::I2c` and needs no port.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::{OutputError, SinkError};
use crate::sampling::window::AggregateRecord;
use crate::sensors::MonitoredGas;

// ───────────────────────────────────────────────────────────────
// Clock port (time source + cooperative suspension)
// ───────────────────────────────────────────────────────────────

/// Monotonic time, wall time, and cooperative sleeping.
///
/// Every suspension point in the firmware goes through this trait so the
/// alert and sampling loops never block the executor thread.
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Wall-clock now, for record timestamps.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Suspend until the absolute `deadline`. Returns at once if it has passed.
    async fn sleep_until(&self, deadline: Instant);

    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration) {
        self.sleep_until(self.now() + duration).await;
    }
}

// ───────────────────────────────────────────────────────────────
// Alert output port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// Discrete alert outputs plus the acknowledge button.
pub trait AlertOutputs {
    /// Put every output into its power-on state: ok indicator lit, gas
    /// indicators and buzzer off.
    fn setup(&mut self) -> Result<(), OutputError> {
        self.set_ok_indicator(true)?;
        for gas in MonitoredGas::ALL {
            self.set_gas_indicator(gas, false)?;
        }
        self.set_buzzer(false)
    }

    fn set_ok_indicator(&mut self, on: bool) -> Result<(), OutputError>;

    fn set_gas_indicator(&mut self, gas: MonitoredGas, on: bool) -> Result<(), OutputError>;

    fn set_buzzer(&mut self, on: bool) -> Result<(), OutputError>;

    /// Sample the acknowledge button. `true` while held down.
    fn button_pressed(&mut self) -> Result<bool, OutputError>;

    /// Drive every output off. Best effort; runs on every exit path.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Record sink port (driven adapter: domain → storage)
// ───────────────────────────────────────────────────────────────

/// Accepts one aggregate record per aggregation cycle.
pub trait RecordSink {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), SinkError>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), SinkError> {
        (**self).append(record)
    }
}
