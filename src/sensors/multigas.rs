//! Multi-gas sensor board driver (I²C, 9-byte command frames).
//!
//! One board per bus address. A read-all exchange is:
//!
//! 1. write `[0x00, <request frame>]` (register 0, then the frame),
//! 2. let the board prepare its answer ([`SETTLE_DELAY`], cooperative),
//! 3. read 9 bytes back from register 0 and validate them.
//!
//! The response payload is big-endian
//! `{concentration: u16, type: u8, decimals: u8, temperature_raw: u16}`.
//!
//! ## Thermistor
//!
//! The on-board NTC (10 kΩ @ 25 °C, B = 3380.13) sits in a divider with a
//! fixed 10 kΩ resistor on a 3 V rail, sampled by a 10-bit ADC. The
//! single-point Beta equation converts the resistance to °C. These
//! constants are the board's calibration contract; do not round them.

use std::time::Duration;

use embedded_hal::i2c::{Error as _, I2c};
use log::debug;

use super::SensorReading;
use crate::app::ports::Clock;
use crate::error::DriverError;
use crate::protocol::codec::FRAME_LEN;
use crate::protocol::{CommandCode, ResponsePayload, SensorType, decode_response, encode_command};

/// Time the board needs between request and response.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Data register every frame is written to and read from.
const DATA_REGISTER: u8 = 0x00;

const R25: f64 = 10_000.0;
const BETA: f64 = 3380.13;
const T25_K: f64 = 298.15;
const KELVIN_OFFSET: f64 = 273.15;
const R_DIVIDER: f64 = 10_000.0;
const ADC_STEPS: f64 = 1024.0;
const V_REF: f64 = 3.0;

/// Driver for one sensor board. Holds no bus handle; the sampling engine
/// owns the bus and lends it per exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiGasSensor {
    address: u8,
    expected: Option<SensorType>,
}

impl MultiGasSensor {
    /// `expected`: when set, a board reporting any other species fails
    /// every read with [`DriverError::SensorMismatch`].
    pub fn new(address: u8, expected: Option<SensorType>) -> Self {
        Self { address, expected }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read concentration, species, and temperature in one exchange.
    pub async fn read_all<B, C>(&self, bus: &mut B, clock: &C) -> Result<SensorReading, DriverError>
    where
        B: I2c,
        C: Clock,
    {
        let payload = self.exchange(bus, clock, CommandCode::ReadAll, &[]).await?;
        self.decode_read_all(&payload)
    }

    async fn exchange<B, C>(
        &self,
        bus: &mut B,
        clock: &C,
        command: CommandCode,
        args: &[u8],
    ) -> Result<ResponsePayload, DriverError>
    where
        B: I2c,
        C: Clock,
    {
        let request = encode_command(command, args)?;

        let mut tx = [0u8; FRAME_LEN + 1];
        tx[0] = DATA_REGISTER;
        tx[1..].copy_from_slice(request.as_bytes());
        bus.write(self.address, &tx)
            .map_err(|e| DriverError::Bus(e.kind()))?;

        clock.sleep(SETTLE_DELAY).await;

        let mut rx = [0u8; FRAME_LEN];
        bus.write_read(self.address, &[DATA_REGISTER], &mut rx)
            .map_err(|e| DriverError::Bus(e.kind()))?;
        debug!("gas[{:#04x}] rx {:02X?}", self.address, rx);

        Ok(decode_response(&rx, command)?)
    }

    /// Interpret a validated read-all payload.
    pub fn decode_read_all(&self, payload: &ResponsePayload) -> Result<SensorReading, DriverError> {
        let b = payload.as_bytes();
        let concentration_raw = u16::from_be_bytes([b[0], b[1]]);
        let type_code = b[2];
        let decimals = b[3];
        let temperature_raw = u16::from_be_bytes([b[4], b[5]]);

        let sensor_type =
            SensorType::from_code(type_code).ok_or(DriverError::UnknownSensorType(type_code))?;

        if let Some(expected) = self.expected {
            if expected != sensor_type {
                return Err(DriverError::SensorMismatch {
                    expected,
                    actual: sensor_type,
                });
            }
        }

        let temperature = thermistor_celsius(temperature_raw)
            .ok_or(DriverError::InvalidTemperature(temperature_raw))?;

        Ok(SensorReading {
            gas_concentration: scale_concentration(concentration_raw, decimals),
            sensor_type,
            temperature,
        })
    }
}

/// `raw × 10^(−decimals)`, computed as a division so whole-hundredths
/// values land on their nearest `f64`.
pub fn scale_concentration(raw: u16, decimals: u8) -> f64 {
    f64::from(raw) / 10f64.powi(i32::from(decimals))
}

/// Thermistor ADC count → °C. `None` when the divider reading cannot
/// correspond to a real resistance (raw = 0 or raw ≥ 1024).
pub fn thermistor_celsius(raw: u16) -> Option<f64> {
    let voltage = V_REF * f64::from(raw) / ADC_STEPS;
    let r_ntc = voltage * R_DIVIDER / (V_REF - voltage);
    if !r_ntc.is_finite() || r_ntc <= 0.0 {
        return None;
    }
    let inv_t = 1.0 / T25_K + (1.0 / BETA) * (r_ntc / R25).ln();
    Some(1.0 / inv_t - KELVIN_OFFSET)
}
