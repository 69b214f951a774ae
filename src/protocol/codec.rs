//! Fixed-length frame codec.
//!
//! Wire format (request, host → sensor):
//! ```text
//! ┌──────┬──────┬─────────┬──────────────────────┬──────────┐
//! │ 0xFF │ 0x01 │ command │ payload (≤5B, 0-pad) │ checksum │
//! └──────┴──────┴─────────┴──────────────────────┴──────────┘
//!   [0]    [1]     [2]          [3..8]               [8]
//! ```
//!
//! Wire format (response, sensor → host):
//! ```text
//! ┌──────┬─────────┬───────────────────────────┬──────────┐
//! │ 0xFF │ command │ payload (6B)              │ checksum │
//! └──────┴─────────┴───────────────────────────┴──────────┘
//!   [0]     [1]        [2..8]                      [8]
//! ```
//!
//! The checksum is the two's-complement negation of the byte sum over
//! `[1..8]`, so a valid frame sums to zero (mod 256) over `[1..=8]`.

use super::CommandCode;
use crate::error::ProtocolError;

/// Total frame length on the wire.
pub const FRAME_LEN: usize = 9;

/// Start-of-frame marker.
const START: u8 = 0xFF;

/// Sender marker in host requests.
const HOST_ADDRESS: u8 = 0x01;

/// Payload bytes a request can carry.
const MAX_REQUEST_PAYLOAD: usize = 5;

/// Payload bytes in every response.
pub const RESPONSE_PAYLOAD_LEN: usize = 6;

/// A complete, checksummed 9-byte frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; FRAME_LEN] {
        self.0
    }

    fn seal(mut bytes: [u8; FRAME_LEN]) -> Self {
        bytes[FRAME_LEN - 1] = checksum(&bytes[1..FRAME_LEN - 1]);
        Self(bytes)
    }
}

/// The six payload bytes of a validated response, not yet interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePayload(pub [u8; RESPONSE_PAYLOAD_LEN]);

impl ResponsePayload {
    pub fn as_bytes(&self) -> &[u8; RESPONSE_PAYLOAD_LEN] {
        &self.0
    }
}

/// Two's-complement negation of the byte sum, mod 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

/// Build a host request frame.
pub fn encode_command(command: CommandCode, payload: &[u8]) -> Result<Frame, ProtocolError> {
    if payload.len() > MAX_REQUEST_PAYLOAD {
        return Err(ProtocolError::PayloadTooLong(payload.len()));
    }
    let mut bytes = [0u8; FRAME_LEN];
    bytes[0] = START;
    bytes[1] = HOST_ADDRESS;
    bytes[2] = command.code();
    bytes[3..3 + payload.len()].copy_from_slice(payload);
    Ok(Frame::seal(bytes))
}

/// Build a device response frame. Used by simulated sensors.
pub fn encode_response(command: CommandCode, payload: [u8; RESPONSE_PAYLOAD_LEN]) -> Frame {
    let mut bytes = [0u8; FRAME_LEN];
    bytes[0] = START;
    bytes[1] = command.code();
    bytes[2..8].copy_from_slice(&payload);
    Frame::seal(bytes)
}

/// Validate a device response and return its payload.
pub fn decode_response(
    bytes: &[u8; FRAME_LEN],
    expected: CommandCode,
) -> Result<ResponsePayload, ProtocolError> {
    if bytes[0] != START || bytes[1] != expected.code() {
        return Err(ProtocolError::Framing {
            start: bytes[0],
            command: bytes[1],
            expected_command: expected.code(),
        });
    }

    let computed = checksum(&bytes[1..FRAME_LEN - 1]);
    let received = bytes[FRAME_LEN - 1];
    if received != computed {
        return Err(ProtocolError::Checksum { received, computed });
    }

    let mut payload = [0u8; RESPONSE_PAYLOAD_LEN];
    payload.copy_from_slice(&bytes[2..FRAME_LEN - 1]);
    Ok(ResponsePayload(payload))
}
