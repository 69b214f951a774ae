//! Mock hardware for integration tests.
//!
//! Every mock is a cheap handle over shared state: clone it, hand one copy
//! to the code under test, and keep the other to script inputs and inspect
//! what happened without ending the borrow.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use gaswatch::app::ports::{AlertOutputs, RecordSink};
use gaswatch::error::{OutputError, SinkError};
use gaswatch::protocol::{CommandCode, SensorType, encode_response};
use gaswatch::sampling::AggregateRecord;
use gaswatch::sensors::MonitoredGas;

/// Thermistor midpoint: 25 °C.
pub const TEMP_25C_RAW: u16 = 512;

// ── MockBus ───────────────────────────────────────────────────

#[derive(Debug)]
struct MockBoard {
    address: u8,
    reported: SensorType,
    decimals: u8,
    values: VecDeque<u16>,
    fail_next: u32,
    corrupt_next: u32,
    requests: u32,
    armed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockBus {
    boards: Rc<RefCell<Vec<MockBoard>>>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board for `gas` at its default address, answering `values` in turn
    /// (the last value repeats).
    pub fn with_board(self, gas: MonitoredGas, decimals: u8, values: &[u16]) -> Self {
        self.with_reporting_board(gas, gas.sensor_type(), decimals, values)
    }

    /// Board at `gas`'s address that claims to be `reported`.
    pub fn with_reporting_board(
        self,
        gas: MonitoredGas,
        reported: SensorType,
        decimals: u8,
        values: &[u16],
    ) -> Self {
        self.boards.borrow_mut().push(MockBoard {
            address: gas.default_address(),
            reported,
            decimals,
            values: values.iter().copied().collect(),
            fail_next: 0,
            corrupt_next: 0,
            requests: 0,
            armed: false,
        });
        self
    }

    fn with<R>(&self, gas: MonitoredGas, f: impl FnOnce(&mut MockBoard) -> R) -> R {
        let mut boards = self.boards.borrow_mut();
        let board = boards
            .iter_mut()
            .find(|b| b.address == gas.default_address())
            .expect("no mock board for gas");
        f(board)
    }

    /// NACK the next `n` requests to this board.
    pub fn fail_next(&self, gas: MonitoredGas, n: u32) {
        self.with(gas, |b| b.fail_next = n);
    }

    /// Flip a payload bit in the next `n` responses (checksum failure).
    pub fn corrupt_next(&self, gas: MonitoredGas, n: u32) {
        self.with(gas, |b| b.corrupt_next = n);
    }

    pub fn script(&self, gas: MonitoredGas, values: &[u16]) {
        self.with(gas, |b| b.values = values.iter().copied().collect());
    }

    /// Read-all requests written to this board, failed ones included.
    pub fn requests(&self, gas: MonitoredGas) -> u32 {
        self.with(gas, |b| b.requests)
    }
}

impl MockBoard {
    fn next_value(&mut self) -> u16 {
        if self.values.len() > 1 {
            self.values.pop_front().unwrap_or(0)
        } else {
            self.values.front().copied().unwrap_or(0)
        }
    }

    fn on_write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        if bytes.len() == 1 {
            return Ok(());
        }
        self.requests += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        self.armed = true;
        Ok(())
    }

    fn on_read(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        if !std::mem::take(&mut self.armed) {
            return Err(ErrorKind::Other);
        }
        let c = self.next_value().to_be_bytes();
        let t = TEMP_25C_RAW.to_be_bytes();
        let payload = [c[0], c[1], self.reported.code(), self.decimals, t[0], t[1]];
        let mut frame = encode_response(CommandCode::ReadAll, payload).into_bytes();
        if self.corrupt_next > 0 {
            self.corrupt_next -= 1;
            frame[4] ^= 0x01;
        }
        buf.copy_from_slice(&frame[..buf.len()]);
        Ok(())
    }
}

impl i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut boards = self.boards.borrow_mut();
        let board = boards
            .iter_mut()
            .find(|b| b.address == address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;
        for op in operations {
            match op {
                Operation::Write(bytes) => board.on_write(bytes)?,
                Operation::Read(buf) => board.on_read(buf)?,
            }
        }
        Ok(())
    }
}

// ── MockOutputs ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct OutputState {
    pub ok: bool,
    pub nh3: bool,
    pub co: bool,
    pub o2: bool,
    pub buzzer: bool,
    /// Every buzzer write, in order.
    pub buzzer_history: Vec<bool>,
    /// Wall-clock instant of each buzzer write, parallel to `buzzer_history`.
    pub buzzer_times: Vec<Instant>,
    pub setup_calls: u32,
    pub release_calls: u32,
    /// Samples returned by successive button polls; the last one repeats.
    pub button_samples: VecDeque<bool>,
    pub button_polls: u32,
    pub fail_writes: bool,
    /// Writes allowed before every further write fails.
    pub writes_left: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct MockOutputs {
    state: Rc<RefCell<OutputState>>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::Ref<'_, OutputState> {
        self.state.borrow()
    }

    /// Queue button samples (`true` = held down).
    pub fn push_button(&self, samples: &[bool]) {
        self.state.borrow_mut().button_samples.extend(samples.iter().copied());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn fail_writes_after(&self, n: u32) {
        self.state.borrow_mut().writes_left = Some(n);
    }

    pub fn gas_lit(&self, gas: MonitoredGas) -> bool {
        let s = self.state.borrow();
        match gas {
            MonitoredGas::Nh3 => s.nh3,
            MonitoredGas::Co => s.co,
            MonitoredGas::O2 => s.o2,
        }
    }

    pub fn all_off(&self) -> bool {
        let s = self.state.borrow();
        !(s.ok || s.nh3 || s.co || s.o2 || s.buzzer)
    }

    fn write(&self, f: impl FnOnce(&mut OutputState)) -> Result<(), OutputError> {
        let mut s = self.state.borrow_mut();
        if s.fail_writes {
            return Err(OutputError::Write("mock"));
        }
        match s.writes_left {
            Some(0) => return Err(OutputError::Write("mock")),
            Some(n) => s.writes_left = Some(n - 1),
            None => {}
        }
        f(&mut s);
        Ok(())
    }
}

impl AlertOutputs for MockOutputs {
    fn setup(&mut self) -> Result<(), OutputError> {
        self.state.borrow_mut().setup_calls += 1;
        self.set_ok_indicator(true)?;
        for gas in MonitoredGas::ALL {
            self.set_gas_indicator(gas, false)?;
        }
        self.set_buzzer(false)
    }

    fn set_ok_indicator(&mut self, on: bool) -> Result<(), OutputError> {
        self.write(|s| s.ok = on)
    }

    fn set_gas_indicator(&mut self, gas: MonitoredGas, on: bool) -> Result<(), OutputError> {
        self.write(|s| match gas {
            MonitoredGas::Nh3 => s.nh3 = on,
            MonitoredGas::Co => s.co = on,
            MonitoredGas::O2 => s.o2 = on,
        })
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), OutputError> {
        self.write(|s| {
            s.buzzer = on;
            s.buzzer_history.push(on);
            s.buzzer_times.push(Instant::now());
        })
    }

    fn button_pressed(&mut self) -> Result<bool, OutputError> {
        let mut s = self.state.borrow_mut();
        s.button_polls += 1;
        let pressed = if s.button_samples.len() > 1 {
            s.button_samples.pop_front().unwrap_or(false)
        } else {
            s.button_samples.front().copied().unwrap_or(false)
        };
        Ok(pressed)
    }

    fn release(&mut self) {
        let mut s = self.state.borrow_mut();
        s.release_calls += 1;
        s.ok = false;
        s.nh3 = false;
        s.co = false;
        s.o2 = false;
        s.buzzer = false;
    }
}

// ── MemorySink ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Rc<RefCell<Vec<AggregateRecord>>>,
    fail_after: Rc<RefCell<Option<usize>>>,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` records, then fail every append.
    pub fn failing_after(n: usize) -> Self {
        let sink = Self::default();
        *sink.fail_after.borrow_mut() = Some(n);
        sink
    }

    pub fn records(&self) -> Vec<AggregateRecord> {
        self.records.borrow().clone()
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), SinkError> {
        let mut records = self.records.borrow_mut();
        if let Some(limit) = *self.fail_after.borrow() {
            if records.len() >= limit {
                return Err(SinkError::Io(std::io::ErrorKind::Other));
            }
        }
        records.push(record.clone());
        Ok(())
    }
}
