//! GasWatch firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  I2cDriver / SimulatedBus   GpioAlertOutputs   SystemClock   │
//! │  (embedded-hal I2c)         (AlertOutputs)     (Clock)       │
//! │  JsonLinesSink / LogRecordSink (RecordSink)                  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Monitor: AlertMachine ◀─ AlertFlags ◀─ SamplingEngine │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  edge-executor LocalExecutor · async-io-mini timers          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On ESP-IDF the monitor drives the real I²C bus and GPIOs. On the host it
//! runs against simulated sensor boards and pins, logging to the console
//! (`RUST_LOG` selects the level) and reading its config from the JSON file
//! named by `GASWATCH_CONFIG`, if set.

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use edge_executor::LocalExecutor;
use embedded_hal::i2c::I2c;
use log::info;

use gaswatch::adapters::{JsonLinesSink, LogRecordSink, SystemClock};
use gaswatch::app::Monitor;
use gaswatch::app::ports::{AlertOutputs, RecordSink};
use gaswatch::config::MonitorConfig;

fn main() -> Result<()> {
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GasWatch v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config()?;
    info!(
        "Config: NH3>{} ppm, CO>{} ppm, O2<{} %, tick {} ms, window {} s",
        config.nh3_alert_ppm,
        config.co_alert_ppm,
        config.o2_alert_percent,
        config.measurement_interval_ms,
        config.aggregation_interval_secs
    );

    let (bus, outputs) = platform::peripherals()?;
    run_monitor(&config, bus, outputs)
}

/// Build the monitor around `bus` and `outputs` and run it on a local
/// executor until it fails.
fn run_monitor<B, O>(config: &MonitorConfig, bus: B, outputs: O) -> Result<()>
where
    B: I2c,
    O: AlertOutputs,
{
    let sink: Box<dyn RecordSink> = match &config.record_path {
        Some(path) => Box::new(
            JsonLinesSink::open(path).with_context(|| format!("opening record file {path}"))?,
        ),
        None => Box::new(LogRecordSink::new()),
    };

    let mut monitor = Monitor::new(config, bus, outputs, sink)?;
    monitor.add_default_sensors()?;

    let clock = SystemClock::new();
    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    let task = executor.spawn(async { monitor.run(&clock).await });

    match futures_lite::future::block_on(executor.run(task)) {
        Ok(never) => match never {},
        Err(e) => Err(e).context("monitor stopped"),
    }
}

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger init failed: {e}"))
}

#[cfg(target_os = "espidf")]
fn load_config() -> Result<MonitorConfig> {
    let config = MonitorConfig::default();
    config.validate()?;
    Ok(config)
}

#[cfg(not(target_os = "espidf"))]
fn load_config() -> Result<MonitorConfig> {
    match std::env::var("GASWATCH_CONFIG") {
        Ok(path) => {
            let text =
                std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
            let config = MonitorConfig::from_json(&text).with_context(|| format!("in {path}"))?;
            info!("Config loaded from {}", path);
            Ok(config)
        }
        Err(_) => {
            info!("GASWATCH_CONFIG not set, using defaults");
            Ok(MonitorConfig::default())
        }
    }
}

#[cfg(target_os = "espidf")]
mod platform {
    use anyhow::Result;
    use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::units::Hertz;
    use log::info;

    use gaswatch::adapters::GpioAlertOutputs;
    use gaswatch::pins;

    type OutPin = PinDriver<'static, AnyOutputPin, Output>;
    type InPin = PinDriver<'static, AnyIOPin, Input>;

    fn output(gpio: i32) -> Result<OutPin> {
        // SAFETY: each GPIO number in `pins` is claimed exactly once here.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        Ok(PinDriver::output(pin)?)
    }

    pub fn peripherals() -> Result<(I2cDriver<'static>, GpioAlertOutputs<OutPin, InPin>)> {
        let p = Peripherals::take()?;

        let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
        // SAFETY: SDA/SCL numbers come from the board map and are not used elsewhere.
        let (sda, scl) = unsafe {
            (
                AnyIOPin::new(pins::I2C_SDA_GPIO),
                AnyIOPin::new(pins::I2C_SCL_GPIO),
            )
        };
        let bus = I2cDriver::new(p.i2c0, sda, scl, &i2c_config)?;
        info!(
            "I2C up: SDA={} SCL={} @ {} Hz",
            pins::I2C_SDA_GPIO,
            pins::I2C_SCL_GPIO,
            pins::I2C_BAUDRATE_HZ
        );

        // SAFETY: as above.
        let mut button = PinDriver::input(unsafe { AnyIOPin::new(pins::ACK_BUTTON_GPIO) })?;
        button.set_pull(Pull::Up)?;

        let outputs = GpioAlertOutputs::new(
            output(pins::OK_LED_GPIO)?,
            output(pins::NH3_LED_GPIO)?,
            output(pins::CO_LED_GPIO)?,
            output(pins::O2_LED_GPIO)?,
            output(pins::BUZZER_GPIO)?,
            button,
        );
        Ok((bus, outputs))
    }
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use anyhow::Result;
    use log::info;

    use gaswatch::adapters::{GpioAlertOutputs, SimPin, SimulatedBus};

    pub fn peripherals() -> Result<(SimulatedBus, GpioAlertOutputs<SimPin, SimPin>)> {
        info!("Host build: simulated sensor boards and pins");
        let outputs = GpioAlertOutputs::new(
            SimPin::output("ok"),
            SimPin::output("nh3"),
            SimPin::output("co"),
            SimPin::output("o2"),
            SimPin::output("buzzer"),
            // Pull-up, never pressed.
            SimPin::input(true),
        );
        Ok((SimulatedBus::with_default_boards(), outputs))
    }
}
