//! motionlink firmware library.
//!
//! Command and telemetry router for a wearable motion sensor.  Exposes the
//! pure-logic modules for integration testing; all ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod osc;
pub mod sensors;

pub use error::{Error, Result};
