//! Multi-gas sensor command protocol.
//!
//! Every exchange is a fixed 9-byte frame (see [`codec`]). The command byte
//! selects the operation; the response carries a device-reported
//! [`SensorType`] so the host can verify what is actually wired to each
//! bus address.

pub mod codec;

pub use codec::{Frame, ResponsePayload, checksum, decode_response, encode_command, encode_response};

/// Protocol operations understood by the sensor boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    ReadConcentration = 0x86,
    ReadTemperature = 0x87,
    ReadAll = 0x88,
}

impl CommandCode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x86 => Some(Self::ReadConcentration),
            0x87 => Some(Self::ReadTemperature),
            0x88 => Some(Self::ReadAll),
            _ => None,
        }
    }
}

/// Gas species a sensor board can report, keyed by protocol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorType {
    Nh3 = 0x02,
    H2s = 0x03,
    Co = 0x04,
    O2 = 0x05,
    H2 = 0x06,
    O3 = 0x2A,
    So2 = 0x2B,
    No2 = 0x2C,
    Hcl = 0x2E,
    Cl2 = 0x31,
    Hf = 0x33,
    Ph3 = 0x45,
}

impl SensorType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Map a protocol identifier back to a species. `None` for bytes the
    /// firmware does not know.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x02 => Self::Nh3,
            0x03 => Self::H2s,
            0x04 => Self::Co,
            0x05 => Self::O2,
            0x06 => Self::H2,
            0x2A => Self::O3,
            0x2B => Self::So2,
            0x2C => Self::No2,
            0x2E => Self::Hcl,
            0x31 => Self::Cl2,
            0x33 => Self::Hf,
            0x45 => Self::Ph3,
            _ => return None,
        })
    }
}
