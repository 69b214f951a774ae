//! Fuzz target: sensor response decoding
//!
//! Feeds arbitrary 9-byte frames through `decode_response` and, when the
//! frame validates, through the read-all payload decoder.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A frame only validates when bytes 1..=8 sum to zero mod 256
//! - A decoded reading is finite and reports the type byte it was given
//!
//! cargo fuzz run fuzz_response_decoder

#![no_main]

use gaswatch::protocol::codec::FRAME_LEN;
use gaswatch::protocol::{CommandCode, decode_response};
use gaswatch::sensors::MultiGasSensor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <[u8; FRAME_LEN]>::try_from(data.get(..FRAME_LEN).unwrap_or_default()) else {
        return;
    };

    let Ok(payload) = decode_response(&frame, CommandCode::ReadAll) else {
        return;
    };
    let sum = frame[1..].iter().fold(0u8, |a, b| a.wrapping_add(*b));
    assert_eq!(sum, 0, "accepted frame with bad checksum");

    let sensor = MultiGasSensor::new(0x75, None);
    if let Ok(reading) = sensor.decode_read_all(&payload) {
        assert!(reading.gas_concentration.is_finite());
        assert!(reading.temperature.is_finite());
        assert_eq!(reading.sensor_type.code(), frame[4]);
    }
});
