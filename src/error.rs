//! Unified error types for the GasWatch firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! coordinator can propagate either task's failure uniformly. All variants
//! are `Copy` so they pass through retry loops and log lines without
//! allocation.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::protocol::SensorType;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor read failed (only escapes the engine when the sensor table
    /// itself is misconfigured).
    Driver(DriverError),
    /// An alert output or the acknowledge button could not be driven/read.
    Output(OutputError),
    /// The aggregate record sink rejected a record.
    Sink(SinkError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "driver: {e}"),
            Self::Output(e) => write!(f, "alert output: {e}"),
            Self::Sink(e) => write!(f, "sink: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Frame-level failures. Always recoverable: discard the response and
/// retry the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Start marker or echoed command byte did not match.
    Framing { start: u8, command: u8, expected_command: u8 },
    /// Trailer byte does not match the checksum over bytes 1..8.
    Checksum { received: u8, computed: u8 },
    /// Request payload exceeds the five bytes a frame can carry.
    PayloadTooLong(usize),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framing {
                start,
                command,
                expected_command,
            } => write!(
                f,
                "bad frame header {start:#04x} {command:#04x} (expected 0xff {expected_command:#04x})"
            ),
            Self::Checksum { received, computed } => write!(
                f,
                "checksum mismatch: received {received:#04x}, computed {computed:#04x}"
            ),
            Self::PayloadTooLong(len) => write!(f, "payload of {len} bytes exceeds 5"),
        }
    }
}

impl std::error::Error for ProtocolError {}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Bus transfer failed (timeout, NACK, arbitration loss, ...).
    Bus(ErrorKind),
    /// Response frame was corrupt.
    Protocol(ProtocolError),
    /// Device reported a sensor type byte outside the known table.
    UnknownSensorType(u8),
    /// Device reported a different gas than the one wired to this address.
    SensorMismatch {
        expected: SensorType,
        actual: SensorType,
    },
    /// Thermistor reading outside the divider's valid range.
    InvalidTemperature(u16),
}

impl DriverError {
    /// Wiring/configuration faults that retrying cannot fix.
    pub fn is_wiring_fault(&self) -> bool {
        matches!(
            self,
            Self::UnknownSensorType(_) | Self::SensorMismatch { .. }
        )
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "bus error: {kind}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::UnknownSensorType(b) => write!(f, "unknown sensor type {b:#04x}"),
            Self::SensorMismatch { expected, actual } => {
                write!(f, "sensor mismatch: expected {expected:?}, found {actual:?}")
            }
            Self::InvalidTemperature(raw) => write!(f, "invalid temperature raw value {raw}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<ProtocolError> for DriverError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

// ---------------------------------------------------------------------------
// Alert output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// GPIO set failed.
    Write(&'static str),
    /// Button GPIO read failed.
    Read,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(pin) => write!(f, "GPIO write failed ({pin})"),
            Self::Read => write!(f, "button GPIO read failed"),
        }
    }
}

impl std::error::Error for OutputError {}

impl From<OutputError> for Error {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Underlying writer failed.
    Io(std::io::ErrorKind),
    /// Record could not be serialised.
    Encode,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
            Self::Encode => write!(f, "record encoding failed"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config could not be parsed.
    Parse,
    /// A field failed range validation; the message names the field.
    Invalid(&'static str),
    /// Sensor table is full or already holds this gas.
    SensorTable(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config could not be parsed"),
            Self::Invalid(msg) => write!(f, "validation failed: {msg}"),
            Self::SensorTable(msg) => write!(f, "sensor table: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
