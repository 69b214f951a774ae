//! Alert state machine.
//!
//! ```text
//!            any flag                       timeout (400 ms)
//!  ┌────────┐ ──────▶ ┌──────────────┐ ◀──────────────▶ ┌───────────────┐
//!  │ Normal │         │ Alert/BlinkOn│                  │ Alert/BlinkOff│
//!  └────────┘ ◀────── └──────────────┘                  └───────────────┘
//!    ▲   ▲  flags clear        │ button edge (either phase)
//!    │   │                     ▼
//!    │   │   flags clear ┌─────────────┐
//!    │   └────────────── │ Acknowledge │
//!    └────────────────── └─────────────┘
//!         button edge (re-arm)
//! ```
//!
//! `Normal` re-enters `Alert` on its very next step if flags are still set,
//! so a second button press in `Acknowledge` silences nothing: it re-arms
//! the audible alarm.
//!
//! Each call to [`AlertMachine::step`] runs the current phase body once
//! (including its cooperative waits) and records the next phase.

use core::convert::Infallible;
use std::time::Duration;

use log::{debug, info};

use super::AlertFlags;
use super::button::ButtonEdge;
use crate::app::ports::{AlertOutputs, Clock};
use crate::error::{Error, OutputError};
use crate::sensors::MonitoredGas;

/// Length of each blink half-period.
pub const BLINK_PHASE: Duration = Duration::from_millis(400);
/// Button/flag poll cadence while blinking.
pub const ALERT_POLL: Duration = Duration::from_millis(50);
/// Button/flag poll cadence while acknowledged.
pub const ACK_POLL: Duration = Duration::from_millis(100);
/// Flag poll cadence while no alert is active.
pub const NORMAL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blink {
    On,
    Off,
}

impl Blink {
    fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Normal,
    Alert(Blink),
    Acknowledge,
}

/// How a bounded alert wait ended. Whichever condition is observed first
/// wins; the others are not remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Timeout,
    ButtonPressed,
    AlertCleared,
}

pub struct AlertMachine<'a, O, C> {
    outputs: &'a mut O,
    clock: &'a C,
    flags: &'a AlertFlags,
    button: ButtonEdge,
    phase: AlertPhase,
}

impl<'a, O, C> AlertMachine<'a, O, C>
where
    O: AlertOutputs,
    C: Clock,
{
    pub fn new(outputs: &'a mut O, clock: &'a C, flags: &'a AlertFlags) -> Self {
        Self {
            outputs,
            clock,
            flags,
            button: ButtonEdge::new(),
            phase: AlertPhase::Normal,
        }
    }

    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    /// Run for the lifetime of the process. Returns only on output failure.
    pub async fn run(&mut self) -> Result<Infallible, Error> {
        info!("ALERT | machine started in {:?}", self.phase);
        loop {
            self.step().await?;
        }
    }

    /// Execute the current phase once and advance.
    pub async fn step(&mut self) -> Result<AlertPhase, OutputError> {
        let next = match self.phase {
            AlertPhase::Normal => self.normal().await?,
            AlertPhase::Alert(blink) => self.alert(blink).await?,
            AlertPhase::Acknowledge => self.acknowledge().await?,
        };

        match (self.phase, next) {
            (a, b) if a == b => {}
            (AlertPhase::Alert(_), AlertPhase::Alert(_)) => debug!("ALERT | blink {:?}", next),
            (from, to) => info!("ALERT | {:?} -> {:?}", from, to),
        }
        self.phase = next;
        Ok(next)
    }

    async fn normal(&mut self) -> Result<AlertPhase, OutputError> {
        if !self.flags.any() {
            self.outputs.set_ok_indicator(true)?;
            self.show_indicators(false)?;
            self.outputs.set_buzzer(false)?;
            self.clock.sleep(NORMAL_POLL).await;
            return Ok(AlertPhase::Normal);
        }

        self.outputs.set_ok_indicator(false)?;
        self.button.rearm();
        Ok(AlertPhase::Alert(Blink::On))
    }

    async fn alert(&mut self, blink: Blink) -> Result<AlertPhase, OutputError> {
        match blink {
            Blink::On => {
                self.show_indicators(true)?;
                self.outputs.set_buzzer(true)?;
            }
            Blink::Off => {
                self.show_indicators(false)?;
                self.outputs.set_buzzer(false)?;
            }
        }

        Ok(match self.wait_for_alert_end(BLINK_PHASE).await? {
            WaitOutcome::Timeout => AlertPhase::Alert(blink.toggled()),
            WaitOutcome::ButtonPressed => {
                self.outputs.set_buzzer(false)?;
                self.button.rearm();
                AlertPhase::Acknowledge
            }
            WaitOutcome::AlertCleared => AlertPhase::Normal,
        })
    }

    async fn acknowledge(&mut self) -> Result<AlertPhase, OutputError> {
        if !self.flags.any() {
            return Ok(AlertPhase::Normal);
        }

        let pressed = self.outputs.button_pressed()?;
        if self.button.sample(pressed) {
            info!("ALERT | acknowledge cancelled by button, re-arming");
            return Ok(AlertPhase::Normal);
        }

        self.show_indicators(true)?;
        self.clock.sleep(ACK_POLL).await;
        Ok(AlertPhase::Acknowledge)
    }

    /// Wait up to `max_wait` for a debounced button edge or for every flag
    /// to clear, polling at [`ALERT_POLL`].
    pub async fn wait_for_alert_end(&mut self, max_wait: Duration) -> Result<WaitOutcome, OutputError> {
        let deadline = self.clock.now() + max_wait;
        loop {
            let pressed = self.outputs.button_pressed()?;
            if self.button.sample(pressed) {
                return Ok(WaitOutcome::ButtonPressed);
            }
            if !self.flags.any() {
                return Ok(WaitOutcome::AlertCleared);
            }

            let next_poll = self.clock.now() + ALERT_POLL;
            if next_poll >= deadline {
                self.clock.sleep_until(deadline).await;
                return Ok(WaitOutcome::Timeout);
            }
            self.clock.sleep_until(next_poll).await;
        }
    }

    /// `live = true`: each gas LED mirrors its flag. `false`: all dark.
    fn show_indicators(&mut self, live: bool) -> Result<(), OutputError> {
        for gas in MonitoredGas::ALL {
            let on = live && self.flags.get(gas);
            self.outputs.set_gas_indicator(gas, on)?;
        }
        Ok(())
    }
}
