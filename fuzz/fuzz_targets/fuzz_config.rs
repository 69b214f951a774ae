//! Fuzz target: `MonitorConfig::from_json`
//!
//! Invariants checked:
//! - No panics on arbitrary input
//! - Any accepted config passes `validate()` and has non-zero periods
//!
//! cargo fuzz run fuzz_config

#![no_main]

use gaswatch::config::MonitorConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = MonitorConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(!config.measurement_interval().is_zero());
        assert!(config.aggregation_interval() >= config.measurement_interval());
    }
});
