//! Vibration motor driver.
//!
//! Drives the motor MOSFET from an [`OutputPin`].  Two modes:
//!
//! - **continuous**: `vibrate(true)` until `vibrate(false)`
//! - **pulse train**: `pulse(on, off, repeat)` runs `repeat` on/off
//!   cycles, sequenced by [`VibratorPort::update`] from the control tick
//!
//! Starting either mode cancels the other.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::app::ports::VibratorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Off,
    Continuous,
    Pulsing {
        on_ms: u32,
        off_ms: u32,
        /// Cycles left, including the current one.
        remaining: u32,
        /// `None` until the first `update` after the train starts.
        phase_since_ms: Option<u32>,
    },
}

pub struct VibratorDriver<P: OutputPin> {
    pin: P,
    mode: Mode,
    on: bool,
}

impl<P: OutputPin> VibratorDriver<P> {
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            warn!("Vibrator: pin init failed: {:?}", e);
        }
        Self {
            pin,
            mode: Mode::Off,
            on: false,
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn drive(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("Vibrator: pin write failed: {:?}", e),
        }
    }
}

impl<P: OutputPin> VibratorPort for VibratorDriver<P> {
    fn pulse(&mut self, on_ms: u32, off_ms: u32, repeat: u32) {
        debug!("Vibrator: pulse {}ms/{}ms x{}", on_ms, off_ms, repeat);
        self.mode = Mode::Pulsing {
            on_ms,
            off_ms,
            remaining: repeat.max(1),
            phase_since_ms: None,
        };
        self.drive(true);
    }

    fn vibrate(&mut self, on: bool) {
        self.mode = if on { Mode::Continuous } else { Mode::Off };
        self.drive(on);
    }

    fn is_vibrating(&self) -> bool {
        self.on
    }

    fn update(&mut self, now_ms: u32) {
        let Mode::Pulsing {
            on_ms,
            off_ms,
            remaining,
            phase_since_ms,
        } = self.mode
        else {
            return;
        };

        let Some(since) = phase_since_ms else {
            self.mode = Mode::Pulsing {
                on_ms,
                off_ms,
                remaining,
                phase_since_ms: Some(now_ms),
            };
            return;
        };

        let elapsed = now_ms.wrapping_sub(since);
        if self.on && elapsed >= on_ms {
            self.drive(false);
            let remaining = remaining - 1;
            self.mode = if remaining == 0 {
                Mode::Off
            } else {
                Mode::Pulsing {
                    on_ms,
                    off_ms,
                    remaining,
                    phase_since_ms: Some(now_ms),
                }
            };
        } else if !self.on && elapsed >= off_ms {
            self.drive(true);
            self.mode = Mode::Pulsing {
                on_ms,
                off_ms,
                remaining,
                phase_since_ms: Some(now_ms),
            };
        }
    }
}
