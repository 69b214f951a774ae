//! ESP-IDF providers for the link-time hooks of `embassy-time` and
//! `critical-section`.
//!
//! - Time: `esp_timer_get_time` (µs since boot, matching embassy's default
//!   1 MHz tick) and one alarm thread that sleeps on a condvar until the
//!   earliest registered deadline, then wakes every expired waker.
//! - Critical sections: a process-wide std mutex, re-entrant per thread.
//!
//! On the host the same hooks come from `embassy-time/std` and
//! `critical-section/std`.

use core::cell::{Cell, RefCell};
use core::task::Waker;
use std::sync::{Condvar, Mutex, MutexGuard, Once, PoisonError};
use std::time::Duration;

use log::{error, warn};

/// Timers armed at once. The monitor runs two tasks, each with one timer.
const MAX_ALARMS: usize = 8;
const ALARM_STACK_BYTES: usize = 4096;

struct EspTimeDriver {
    alarms: Mutex<heapless::Vec<(u64, Waker), MAX_ALARMS>>,
    changed: Condvar,
    started: Once,
}

embassy_time_driver::time_driver_impl!(static DRIVER: EspTimeDriver = EspTimeDriver {
    alarms: Mutex::new(heapless::Vec::new()),
    changed: Condvar::new(),
    started: Once::new(),
});

fn now_us() -> u64 {
    // SAFETY: plain read of the monotonic system timer.
    let t = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    t.max(0) as u64
}

impl EspTimeDriver {
    fn lock(&self) -> MutexGuard<'_, heapless::Vec<(u64, Waker), MAX_ALARMS>> {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&'static self) {
        self.started.call_once(|| {
            let spawned = std::thread::Builder::new()
                .name("gw-alarm".into())
                .stack_size(ALARM_STACK_BYTES)
                .spawn(move || self.alarm_loop());
            if let Err(e) = spawned {
                error!("TIME | alarm thread failed to start: {}", e);
            }
        });
    }

    fn alarm_loop(&self) -> ! {
        let mut alarms = self.lock();
        loop {
            let now = now_us();
            let mut next = u64::MAX;
            let mut i = 0;
            while i < alarms.len() {
                if alarms[i].0 <= now {
                    let (_, waker) = alarms.swap_remove(i);
                    waker.wake();
                } else {
                    next = next.min(alarms[i].0);
                    i += 1;
                }
            }

            alarms = if next == u64::MAX {
                self.changed.wait(alarms).unwrap_or_else(PoisonError::into_inner)
            } else {
                let timeout = Duration::from_micros(next - now);
                match self.changed.wait_timeout(alarms, timeout) {
                    Ok((guard, _)) => guard,
                    Err(poisoned) => poisoned.into_inner().0,
                }
            };
        }
    }
}

impl embassy_time_driver::Driver for EspTimeDriver {
    fn now(&self) -> u64 {
        now_us()
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        DRIVER.start();

        let mut alarms = self.lock();
        if let Some(slot) = alarms.iter_mut().find(|(_, w)| w.will_wake(waker)) {
            slot.0 = slot.0.min(at);
        } else if alarms.push((at, waker.clone())).is_err() {
            // Spurious wake: the timer re-registers on its next poll.
            warn!("TIME | alarm table full, waking early");
            waker.wake_by_ref();
            return;
        }
        drop(alarms);
        self.changed.notify_one();
    }
}

static SECTION_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static SECTION_DEPTH: Cell<u32> = const { Cell::new(0) };
    static SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

struct StdMutexSection;

critical_section::set_impl!(StdMutexSection);

// SAFETY: the outermost acquire on a thread takes `SECTION_LOCK`, nested
// acquires only count, and the matching outermost release drops the guard
// on the same thread.
unsafe impl critical_section::Impl for StdMutexSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        SECTION_DEPTH.with(|depth| {
            if depth.get() == 0 {
                let guard = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
                SECTION_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));
            }
            depth.set(depth.get() + 1);
        });
    }

    unsafe fn release(_restore: critical_section::RawRestoreState) {
        SECTION_DEPTH.with(|depth| match depth.get() {
            0 => {}
            1 => {
                depth.set(0);
                SECTION_GUARD.with(|slot| *slot.borrow_mut() = None);
            }
            n => depth.set(n - 1),
        });
    }
}
