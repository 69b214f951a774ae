//! Monitoring coordinator.
//!
//! Owns the bus, the alert outputs, the record sink, and the shared
//! [`AlertFlags`]. [`Monitor::run`] drives the alert machine and the
//! sampling engine as two futures on the caller's executor:
//!
//! ```text
//!            ┌────────────── Monitor::run ──────────────┐
//!            │  OutputGuard (setup … release on drop)    │
//!            │                                           │
//!            │  AlertMachine ◀── AlertFlags ◀── Engine   │
//!            │       │                           │       │
//!            │       ▼                           ▼       │
//!            │  AlertOutputs               I²C · Sink    │
//!            └───────────────────────────────────────────┘
//! ```
//!
//! Neither task returns under normal operation. When one fails, the other
//! is dropped at its current suspension point, the guard releases every
//! output, and the error is returned to the caller.

use core::convert::Infallible;
use core::ops::{Deref, DerefMut};

use embedded_hal::i2c::I2c;
use futures_lite::future;
use log::{error, info};

use super::ports::{AlertOutputs, Clock, RecordSink};
use crate::alert::{AlertFlags, AlertMachine};
use crate::config::MonitorConfig;
use crate::error::{ConfigError, Error, OutputError};
use crate::sampling::{MAX_SENSORS, SamplingEngine, SamplingSettings};
use crate::sensors::{MonitoredGas, MultiGasSensor};

/// Scoped ownership of the alert outputs: set up on acquire, released on
/// drop (including while unwinding).
pub struct OutputGuard<'a, O: AlertOutputs> {
    outputs: &'a mut O,
}

impl<'a, O: AlertOutputs> OutputGuard<'a, O> {
    pub fn acquire(outputs: &'a mut O) -> Result<Self, OutputError> {
        if let Err(e) = outputs.setup() {
            outputs.release();
            return Err(e);
        }
        Ok(Self { outputs })
    }
}

impl<O: AlertOutputs> Deref for OutputGuard<'_, O> {
    type Target = O;

    fn deref(&self) -> &O {
        self.outputs
    }
}

impl<O: AlertOutputs> DerefMut for OutputGuard<'_, O> {
    fn deref_mut(&mut self) -> &mut O {
        self.outputs
    }
}

impl<O: AlertOutputs> Drop for OutputGuard<'_, O> {
    fn drop(&mut self) {
        self.outputs.release();
        info!("MONITOR | alert outputs released");
    }
}

pub struct Monitor<B, O, S> {
    settings: SamplingSettings,
    bus: B,
    outputs: O,
    sink: S,
    sensors: heapless::Vec<(MonitoredGas, MultiGasSensor), MAX_SENSORS>,
    flags: AlertFlags,
}

impl<B, O, S> Monitor<B, O, S>
where
    B: I2c,
    O: AlertOutputs,
    S: RecordSink,
{
    /// Validates `config`. No sensors are registered yet; see
    /// [`add_sensor`](Self::add_sensor) and
    /// [`add_default_sensors`](Self::add_default_sensors).
    pub fn new(config: &MonitorConfig, bus: B, outputs: O, sink: S) -> Result<Self, ConfigError> {
        Ok(Self {
            settings: SamplingSettings::new(config)?,
            bus,
            outputs,
            sink,
            sensors: heapless::Vec::new(),
            flags: AlertFlags::new(),
        })
    }

    pub fn add_sensor(&mut self, gas: MonitoredGas, driver: MultiGasSensor) -> Result<(), ConfigError> {
        if self.sensors.iter().any(|(g, _)| *g == gas) {
            return Err(ConfigError::SensorTable("gas already has a sensor"));
        }
        self.sensors
            .push((gas, driver))
            .map_err(|_| ConfigError::SensorTable("sensor table full"))
    }

    /// One sensor per monitored gas at its factory address, asserting the
    /// expected species.
    pub fn add_default_sensors(&mut self) -> Result<(), ConfigError> {
        for gas in MonitoredGas::ALL {
            self.add_sensor(gas, gas.default_driver())?;
        }
        Ok(())
    }

    pub fn flags(&self) -> &AlertFlags {
        &self.flags
    }

    pub fn into_parts(self) -> (B, O, S) {
        (self.bus, self.outputs, self.sink)
    }

    /// Run both tasks until one of them fails.
    pub async fn run<C: Clock>(&mut self, clock: &C) -> Result<Infallible, Error> {
        if self.sensors.is_empty() {
            return Err(ConfigError::SensorTable("no sensors configured").into());
        }
        for gas in MonitoredGas::ALL {
            self.flags.set(gas, false);
        }

        let mut engine = SamplingEngine::new(&mut self.bus, clock, &self.flags, &mut self.sink, self.settings);
        for (gas, driver) in &self.sensors {
            engine.add_sensor(*gas, *driver)?;
        }

        let mut outputs = OutputGuard::acquire(&mut self.outputs)?;
        let mut alerts = AlertMachine::new(&mut *outputs, clock, &self.flags);
        info!("MONITOR | running");

        match future::or(alerts.run(), engine.run()).await {
            Ok(never) => match never {},
            Err(e) => {
                error!("MONITOR | stopped: {}", e);
                Err(e)
            }
        }
    }
}
