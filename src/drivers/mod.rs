//! Drivers for the button and the vibration motor.

pub mod button;
pub mod vibrator;
