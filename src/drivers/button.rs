//! Debounced push-button driver with press / hold detection.
//!
//! ## Hardware
//!
//! Momentary switch on any [`InputPin`].  The pin is sampled from the
//! control tick; no ISR is needed at the tick rates the router runs at.
//!
//! ## States
//!
//! | State      | Condition                                    |
//! |------------|----------------------------------------------|
//! | `Released` | Debounced level is "not pressed"             |
//! | `Pressed`  | Debounced level is "pressed"                 |
//! | `Holding`  | Pressed for at least the hold threshold      |
//!
//! Every transition is reported exactly once by [`ButtonPort::poll`].

use embedded_hal::digital::InputPin;
use log::debug;

use crate::app::events::ButtonState;
use crate::app::ports::ButtonPort;

pub const DEBOUNCE_MS: u32 = 30;

pub struct ButtonDriver<P: InputPin> {
    pin: P,
    active_low: bool,
    state: ButtonState,
    /// Last raw sample and when it last changed.
    raw: bool,
    raw_since_ms: u32,
    pressed_at_ms: u32,
}

impl<P: InputPin> ButtonDriver<P> {
    /// `active_low`: the switch pulls the line to ground when pressed.
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            state: ButtonState::Released,
            raw: false,
            raw_since_ms: 0,
            pressed_at_ms: 0,
        }
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    fn sample(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(e) => {
                debug!("Button: pin read failed: {:?}", e);
                self.raw
            }
        }
    }
}

impl<P: InputPin> ButtonPort for ButtonDriver<P> {
    fn poll(&mut self, now_ms: u32, hold_ms: u32) -> Option<ButtonState> {
        let raw = self.sample();
        if raw != self.raw {
            self.raw = raw;
            self.raw_since_ms = now_ms;
        }

        let down = self.state != ButtonState::Released;
        if raw != down && now_ms.wrapping_sub(self.raw_since_ms) >= DEBOUNCE_MS {
            self.state = if raw {
                self.pressed_at_ms = now_ms;
                ButtonState::Pressed
            } else {
                ButtonState::Released
            };
            return Some(self.state);
        }

        if self.state == ButtonState::Pressed
            && now_ms.wrapping_sub(self.pressed_at_ms) >= hold_ms
        {
            self.state = ButtonState::Holding;
            return Some(self.state);
        }

        None
    }

    fn state(&self) -> ButtonState {
        self.state
    }
}
