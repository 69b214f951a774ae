//! Sampling engine against a scripted mock bus and virtual time.

use std::time::{Duration, Instant};

use futures_lite::future::block_on;
use gaswatch::adapters::SimClock;
use gaswatch::alert::{AlertFlags, AlertMachine, AlertPhase, Blink};
use gaswatch::app::ports::Clock;
use gaswatch::config::MonitorConfig;
use gaswatch::error::{ConfigError, Error, SinkError};
use gaswatch::protocol::SensorType;
use gaswatch::sampling::{SamplingEngine, SamplingSettings, WindowSummary};
use gaswatch::sensors::MonitoredGas;

use crate::mock_hw::{MemorySink, MockBus, MockOutputs};

fn clean_air() -> MockBus {
    MockBus::new()
        .with_board(MonitoredGas::Nh3, 2, &[250])
        .with_board(MonitoredGas::Co, 1, &[30])
        .with_board(MonitoredGas::O2, 1, &[209])
}

fn settings(config: &MonitorConfig) -> SamplingSettings {
    SamplingSettings::new(config).unwrap()
}

fn far_future(clock: &SimClock) -> Instant {
    clock.now() + Duration::from_secs(60)
}

fn add_all<B, C, S>(engine: &mut SamplingEngine<'_, B, C, S>)
where
    B: embedded_hal::i2c::I2c,
    C: Clock,
    S: gaswatch::app::ports::RecordSink,
{
    for gas in MonitoredGas::ALL {
        engine.add_sensor(gas, gas.default_driver()).unwrap();
    }
}

#[test]
fn failing_sensor_is_retried_without_rereading_the_others() {
    let mut bus = clean_air();
    let panel = bus.clone();
    panel.fail_next(MonitoredGas::Co, 2);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    add_all(&mut engine);

    assert!(block_on(engine.sample_tick(far_future(&clock))));

    assert_eq!(panel.requests(MonitoredGas::Nh3), 1);
    assert_eq!(panel.requests(MonitoredGas::Co), 3);
    assert_eq!(panel.requests(MonitoredGas::O2), 1);
    for gas in MonitoredGas::ALL {
        assert_eq!(engine.window(gas).unwrap().len(), 1, "{gas}");
    }
    // Two good reads (100 ms settle each), two backoffs, one good CO read.
    assert_eq!(clock.elapsed(), Duration::from_millis(400));
}

#[test]
fn corrupt_response_is_retried() {
    let mut bus = clean_air();
    let panel = bus.clone();
    panel.corrupt_next(MonitoredGas::O2, 1);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    add_all(&mut engine);

    assert!(block_on(engine.sample_tick(far_future(&clock))));
    assert_eq!(panel.requests(MonitoredGas::O2), 2);
    assert_eq!(engine.window(MonitoredGas::O2).unwrap().len(), 1);
}

#[test]
fn o2_flag_follows_readings_and_reaches_the_alert_machine() {
    let mut bus = MockBus::new().with_board(MonitoredGas::O2, 1, &[250, 150]);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    engine.add_sensor(MonitoredGas::O2, MonitoredGas::O2.default_driver()).unwrap();

    let mut outputs = MockOutputs::new();
    let mut machine = AlertMachine::new(&mut outputs, &clock, &flags);

    assert!(block_on(engine.sample_tick(far_future(&clock))));
    assert!(!flags.get(MonitoredGas::O2));
    assert_eq!(block_on(machine.step()).unwrap(), AlertPhase::Normal);

    assert!(block_on(engine.sample_tick(far_future(&clock))));
    assert!(flags.get(MonitoredGas::O2));
    assert_eq!(block_on(machine.step()).unwrap(), AlertPhase::Alert(Blink::On));
}

#[test]
fn flag_clears_when_reading_recovers() {
    let mut bus = MockBus::new().with_board(MonitoredGas::Co, 0, &[150, 20]);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    engine.add_sensor(MonitoredGas::Co, MonitoredGas::Co.default_driver()).unwrap();

    block_on(engine.sample_tick(far_future(&clock)));
    assert!(flags.get(MonitoredGas::Co));
    block_on(engine.sample_tick(far_future(&clock)));
    assert!(!flags.get(MonitoredGas::Co));
}

#[test]
fn empty_window_reports_no_data_for_that_gas_only() {
    let mut bus = clean_air();
    let panel = bus.clone();
    panel.fail_next(MonitoredGas::Co, u32::MAX);
    let mut sink = MemorySink::new();
    let records = sink.clone();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    add_all(&mut engine);

    for _ in 0..2 {
        let give_up = clock.now() + Duration::from_millis(500);
        assert!(!block_on(engine.sample_tick(give_up)));
    }
    let record = engine.close_window().unwrap();

    assert_eq!(record.summary(MonitoredGas::Co), Some(&WindowSummary::NoData));
    assert_eq!(
        record.summary(MonitoredGas::Nh3),
        Some(&WindowSummary::Stats {
            min: 2.5,
            max: 2.5,
            avg: 2.5
        })
    );
    assert_eq!(
        record.summary(MonitoredGas::O2),
        Some(&WindowSummary::Stats {
            min: 20.9,
            max: 20.9,
            avg: 20.9
        })
    );

    let json = serde_json::to_value(&record).unwrap();
    for field in ["min", "max", "avg"] {
        assert!(json["CO"][field].is_null());
        assert!(json["NH3"][field].is_number());
        assert!(json["O2"][field].is_number());
    }

    assert_eq!(records.records(), vec![record]);
    assert!(engine.window(MonitoredGas::Nh3).unwrap().is_empty());
}

#[test]
fn stats_cover_every_sample_in_the_window() {
    let mut bus = MockBus::new().with_board(MonitoredGas::Nh3, 1, &[10, 40, 70]);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    engine.add_sensor(MonitoredGas::Nh3, MonitoredGas::Nh3.default_driver()).unwrap();

    for _ in 0..3 {
        block_on(engine.sample_tick(far_future(&clock)));
    }
    let record = engine.close_window().unwrap();
    let Some(WindowSummary::Stats { min, max, avg }) = record.summary(MonitoredGas::Nh3).copied() else {
        panic!("expected stats");
    };
    assert!((min - 1.0).abs() < 1e-12);
    assert!((max - 7.0).abs() < 1e-12);
    assert!((avg - 4.0).abs() < 1e-12);
}

#[test]
fn miswired_board_never_feeds_the_window() {
    let mut bus = MockBus::new().with_reporting_board(MonitoredGas::Co, SensorType::O2, 1, &[209]);
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    engine.add_sensor(MonitoredGas::Co, MonitoredGas::Co.default_driver()).unwrap();

    let give_up = clock.now() + Duration::from_millis(300);
    assert!(!block_on(engine.sample_tick(give_up)));
    assert!(engine.window(MonitoredGas::Co).unwrap().is_empty());
    assert!(!flags.any());
}

#[test]
fn duplicate_gas_rejected() {
    let mut bus = clean_air();
    let mut sink = MemorySink::new();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig::default();
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    add_all(&mut engine);

    assert!(matches!(
        engine.add_sensor(MonitoredGas::Co, MonitoredGas::Co.default_driver()),
        Err(ConfigError::SensorTable(_))
    ));
}

#[test]
fn windows_keep_closing_while_a_sensor_is_dead() {
    let mut bus = clean_air();
    bus.fail_next(MonitoredGas::Co, u32::MAX);
    let mut sink = MemorySink::failing_after(2);
    let records = sink.clone();
    let clock = SimClock::new();
    let flags = AlertFlags::new();
    let config = MonitorConfig {
        aggregation_interval_secs: 1,
        ..MonitorConfig::default()
    };
    let mut engine = SamplingEngine::new(&mut bus, &clock, &flags, &mut sink, settings(&config));
    add_all(&mut engine);

    let e = block_on(engine.run()).unwrap_err();
    assert_eq!(e, Error::Sink(SinkError::Io(std::io::ErrorKind::Other)));

    let records = records.records();
    assert_eq!(records.len(), 2);
    for r in &records {
        assert!(r.summary(MonitoredGas::Co).unwrap().is_no_data());
        assert!(!r.summary(MonitoredGas::Nh3).unwrap().is_no_data());
    }
    assert!(records[0].time < records[1].time);
    // Third window closes shortly after the 3 s boundary.
    assert!(clock.elapsed() >= Duration::from_secs(3));
    assert!(clock.elapsed() < Duration::from_millis(3500));
}
