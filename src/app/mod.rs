//! Application core — dispatch logic, zero I/O.
//!
//! The router and the tick loop live here.  All interaction with
//! transports, sensors, the button and the vibrator goes through the
//! **port traits** in [`ports`], keeping this layer fully testable on the
//! host.

pub mod commands;
pub mod config_page;
pub mod device;
pub mod events;
pub mod ports;
pub mod router;
