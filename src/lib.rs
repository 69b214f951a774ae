//! GasWatch firmware library.
//!
//! Multi-gas (NH3 / CO / O2) monitoring: the sensor board protocol and
//! driver, the sampling and aggregation engine, the alert state machine,
//! and the coordinator that runs them together. ESP-IDF peripheral setup
//! lives in the binary; the only target-specific library code is the
//! runtime hooks in `adapters::esp_runtime`. Everything else builds and
//! tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alert;
pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod protocol;
pub mod sampling;
pub mod sensors;
