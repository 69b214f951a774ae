//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements     | Connects to                      |
//! |--------------|----------------|----------------------------------|
//! | `time`       | Clock          | system timer / virtual time      |
//! | `gpio`       | AlertOutputs   | LED, buzzer and button GPIOs     |
//! | `jsonl_sink` | RecordSink     | JSON-lines file                  |
//! | `log_sink`   | RecordSink     | Serial log output                |
//! | `sim`        | I2c, pins      | Simulated sensor boards (host)   |
//!
//! `esp_runtime` (ESP-IDF only) supplies the timer driver and critical
//! sections that `SystemClock`'s reactor timers link against.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod esp_runtime;
pub mod gpio;
pub mod jsonl_sink;
pub mod log_sink;
pub mod sim;
pub mod time;

pub use gpio::GpioAlertOutputs;
pub use jsonl_sink::JsonLinesSink;
pub use log_sink::LogRecordSink;
pub use sim::{SimPin, SimulatedBoard, SimulatedBus};
pub use time::{SimClock, SystemClock};
