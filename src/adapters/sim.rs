//! Simulated peripherals for host runs.
//!
//! [`SimulatedBus`] answers read-all requests like a set of multi-gas
//! boards whose readings wander around a configurable level.
//! [`SimPin`] is a GPIO that remembers its level.

use core::convert::Infallible;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use log::debug;

use crate::pins;
use crate::protocol::codec::{FRAME_LEN, RESPONSE_PAYLOAD_LEN};
use crate::protocol::{CommandCode, SensorType, checksum, encode_response};

/// Thermistor count a little above the 25 °C midpoint.
const ROOM_TEMPERATURE_RAW: u16 = 500;

#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    address: u8,
    sensor_type: SensorType,
    decimals: u8,
    level_raw: u16,
    swing: u16,
    temperature_raw: u16,
    reads: u32,
    pending: Option<CommandCode>,
}

impl SimulatedBoard {
    /// Board at `address` reporting `level_raw × 10^(−decimals)`.
    pub fn new(address: u8, sensor_type: SensorType, decimals: u8, level_raw: u16) -> Self {
        Self {
            address,
            sensor_type,
            decimals,
            level_raw,
            swing: 0,
            temperature_raw: ROOM_TEMPERATURE_RAW,
            reads: 0,
            pending: None,
        }
    }

    /// Let successive readings oscillate by up to `swing` raw counts.
    pub fn with_swing(mut self, swing: u16) -> Self {
        self.swing = swing;
        self
    }

    fn next_payload(&mut self) -> [u8; RESPONSE_PAYLOAD_LEN] {
        let span = 2 * u32::from(self.swing) + 1;
        let offset = (self.reads % span) as i32 - i32::from(self.swing);
        self.reads = self.reads.wrapping_add(1);

        let raw = (i32::from(self.level_raw) + offset).clamp(0, i32::from(u16::MAX)) as u16;
        let c = raw.to_be_bytes();
        let t = self.temperature_raw.to_be_bytes();
        [c[0], c[1], self.sensor_type.code(), self.decimals, t[0], t[1]]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    boards: Vec<SimulatedBoard>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// NH3, CO and O2 boards at their factory addresses, in clean air.
    pub fn with_default_boards() -> Self {
        let mut bus = Self::new();
        bus.add_board(SimulatedBoard::new(pins::NH3_I2C_ADDR, SensorType::Nh3, 2, 250).with_swing(20));
        bus.add_board(SimulatedBoard::new(pins::CO_I2C_ADDR, SensorType::Co, 1, 30).with_swing(3));
        bus.add_board(SimulatedBoard::new(pins::O2_I2C_ADDR, SensorType::O2, 1, 209).with_swing(1));
        bus
    }

    pub fn add_board(&mut self, board: SimulatedBoard) {
        self.boards.push(board);
    }

    /// Change the level a board reports. Unknown addresses are ignored.
    pub fn set_level(&mut self, address: u8, level_raw: u16) {
        if let Some(b) = self.boards.iter_mut().find(|b| b.address == address) {
            b.level_raw = level_raw;
        }
    }

    fn on_write(board: &mut SimulatedBoard, bytes: &[u8]) -> Result<(), ErrorKind> {
        match bytes.len() {
            // Register select ahead of a read.
            1 => Ok(()),
            n if n == FRAME_LEN + 1 => {
                let frame = &bytes[1..];
                if frame[0] != 0xFF || frame[FRAME_LEN - 1] != checksum(&frame[1..FRAME_LEN - 1]) {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                }
                match CommandCode::from_code(frame[2]) {
                    Some(CommandCode::ReadAll) => {
                        board.pending = Some(CommandCode::ReadAll);
                        Ok(())
                    }
                    _ => Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
                }
            }
            _ => Err(ErrorKind::Other),
        }
    }

    fn on_read(board: &mut SimulatedBoard, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let command = board.pending.take().ok_or(ErrorKind::Other)?;
        let frame = encode_response(command, board.next_payload());
        let n = buf.len().min(FRAME_LEN);
        buf[..n].copy_from_slice(&frame.as_bytes()[..n]);
        debug!("sim[{:#04x}] -> {:02X?}", board.address, frame.as_bytes());
        Ok(())
    }
}

impl i2c::ErrorType for SimulatedBus {
    type Error = ErrorKind;
}

impl I2c for SimulatedBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let board = self
            .boards
            .iter_mut()
            .find(|b| b.address == address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

        for op in operations {
            match op {
                Operation::Write(bytes) => Self::on_write(board, bytes)?,
                Operation::Read(buf) => Self::on_read(board, buf)?,
            }
        }
        Ok(())
    }
}

/// A GPIO line held in memory. Output level changes are logged.
#[derive(Debug, Clone)]
pub struct SimPin {
    name: &'static str,
    high: bool,
}

impl SimPin {
    /// Output pin, initially low.
    pub fn output(name: &'static str) -> Self {
        Self { name, high: false }
    }

    /// Input pin at the given level.
    pub fn input(high: bool) -> Self {
        Self { name: "input", high }
    }

    pub fn is_set(&self) -> bool {
        self.high
    }

    pub fn set_level(&mut self, high: bool) {
        self.high = high;
    }

    fn drive(&mut self, high: bool) {
        if self.high != high {
            debug!("sim pin {} -> {}", self.name, if high { "HIGH" } else { "LOW" });
        }
        self.high = high;
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}
