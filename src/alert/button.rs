//! Polled edge detector for the acknowledge button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The alert machine samples it
//! every 50 ms (blink phases) or 100 ms (acknowledge).
//!
//! ## Debounce
//!
//! A press counts only when a "released" sample is followed by a "pressed"
//! sample. A button held down across any number of polls therefore yields
//! exactly one edge, and contact bounce within one poll interval is never
//! seen.

/// Rising-edge detector over successive button samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEdge {
    previous_pressed: bool,
}

impl ButtonEdge {
    /// Armed as if the button were already held, so a press that began
    /// before arming is ignored until it is released.
    pub fn new() -> Self {
        Self {
            previous_pressed: true,
        }
    }

    /// Forget history; the next edge needs a fresh release first.
    pub fn rearm(&mut self) {
        self.previous_pressed = true;
    }

    /// Feed one sample. Returns `true` on a released → pressed transition.
    pub fn sample(&mut self, pressed: bool) -> bool {
        let edge = !self.previous_pressed && pressed;
        self.previous_pressed = pressed;
        edge
    }
}

impl Default for ButtonEdge {
    fn default() -> Self {
        Self::new()
    }
}
