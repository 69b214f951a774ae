//! Sensor subsystem: the monitored gas channels and their bus driver.
//!
//! Each [`MonitoredGas`] is one physical sensor board on the shared I²C
//! bus. The sampling engine holds one [`MultiGasSensor`] per gas.

pub mod multigas;

use serde::Serialize;

use crate::pins;
use crate::protocol::SensorType;

pub use multigas::MultiGasSensor;

/// The gas channels this system monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MonitoredGas {
    #[serde(rename = "NH3")]
    Nh3,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O2")]
    O2,
}

impl MonitoredGas {
    pub const ALL: [Self; 3] = [Self::Nh3, Self::Co, Self::O2];

    /// Species the board at this channel must report.
    pub const fn sensor_type(self) -> SensorType {
        match self {
            Self::Nh3 => SensorType::Nh3,
            Self::Co => SensorType::Co,
            Self::O2 => SensorType::O2,
        }
    }

    /// Factory bus address for this channel.
    pub const fn default_address(self) -> u8 {
        match self {
            Self::Nh3 => pins::NH3_I2C_ADDR,
            Self::Co => pins::CO_I2C_ADDR,
            Self::O2 => pins::O2_I2C_ADDR,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nh3 => "NH3",
            Self::Co => "CO",
            Self::O2 => "O2",
        }
    }

    /// Driver at the factory address, asserting the expected species.
    pub fn default_driver(self) -> MultiGasSensor {
        MultiGasSensor::new(self.default_address(), Some(self.sensor_type()))
    }
}

impl core::fmt::Display for MonitoredGas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded read-all response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// ppm (percent by volume for O2).
    pub gas_concentration: f64,
    pub sensor_type: SensorType,
    /// Degrees Celsius from the on-board thermistor.
    pub temperature: f64,
}
