//! Application core.
//!
//! [`monitor`] wires the alert machine and the sampling engine together.
//! All interaction with hardware and time happens through the **port
//! traits** in [`ports`], keeping the domain testable without peripherals.

pub mod monitor;
pub mod ports;

pub use monitor::{Monitor, OutputGuard};
