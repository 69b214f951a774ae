//! GPIO alert outputs over `embedded-hal` digital pins.
//!
//! All outputs are active HIGH. The acknowledge button is active LOW
//! (switch to GND, pull-up enabled by the caller when the pin is built).

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::app::ports::AlertOutputs;
use crate::error::OutputError;
use crate::sensors::MonitoredGas;

pub struct GpioAlertOutputs<P, I> {
    ok: P,
    nh3: P,
    co: P,
    o2: P,
    buzzer: P,
    button: I,
}

impl<P, I> GpioAlertOutputs<P, I>
where
    P: OutputPin,
    I: InputPin,
{
    pub fn new(ok: P, nh3: P, co: P, o2: P, buzzer: P, button: I) -> Self {
        Self {
            ok,
            nh3,
            co,
            o2,
            buzzer,
            button,
        }
    }

    fn gas_pin(&mut self, gas: MonitoredGas) -> &mut P {
        match gas {
            MonitoredGas::Nh3 => &mut self.nh3,
            MonitoredGas::Co => &mut self.co,
            MonitoredGas::O2 => &mut self.o2,
        }
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool, name: &'static str) -> Result<(), OutputError> {
    pin.set_state(PinState::from(on))
        .map_err(|_| OutputError::Write(name))
}

impl<P, I> AlertOutputs for GpioAlertOutputs<P, I>
where
    P: OutputPin,
    I: InputPin,
{
    fn set_ok_indicator(&mut self, on: bool) -> Result<(), OutputError> {
        drive(&mut self.ok, on, "ok led")
    }

    fn set_gas_indicator(&mut self, gas: MonitoredGas, on: bool) -> Result<(), OutputError> {
        drive(self.gas_pin(gas), on, gas.name())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), OutputError> {
        drive(&mut self.buzzer, on, "buzzer")
    }

    fn button_pressed(&mut self) -> Result<bool, OutputError> {
        self.button.is_low().map_err(|_| OutputError::Read)
    }

    fn release(&mut self) {
        for pin in [
            &mut self.ok,
            &mut self.nh3,
            &mut self.co,
            &mut self.o2,
            &mut self.buzzer,
        ] {
            let _ = pin.set_low();
        }
    }
}
