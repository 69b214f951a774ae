//! Clock adapters.
//!
//! - [`SystemClock`]: `std::time::Instant` for monotonic time, the system
//!   wall clock for record timestamps, and `async-io-mini` reactor timers
//!   for sleeping. On ESP-IDF the wall clock reads 1970 until SNTP syncs.
//! - [`SimClock`]: virtual time for tests and simulation. Sleeping jumps
//!   the clock straight to the deadline and yields once to the executor.

use core::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};

use crate::app::ports::Clock;

/// Real time, reactor-driven sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        async_io_mini::Timer::at(deadline).await;
    }
}

/// Deterministic virtual clock. Not `Sync`; share it by reference between
/// futures on one executor.
#[derive(Debug)]
pub struct SimClock {
    origin: Instant,
    utc_origin: DateTime<Utc>,
    offset: Cell<Duration>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Virtual clock whose wall time starts at `utc`.
    pub fn starting_at(utc: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            utc_origin: utc,
            offset: Cell::new(Duration::ZERO),
        }
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Move time forward without yielding.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let since = TimeDelta::from_std(self.offset.get()).unwrap_or(TimeDelta::zero());
        self.utc_origin + since
    }

    async fn sleep_until(&self, deadline: Instant) {
        let target = deadline.saturating_duration_since(self.origin);
        if target > self.offset.get() {
            self.offset.set(target);
        }
        futures_lite::future::yield_now().await;
    }
}
