//! Messaging layer: message model, OSC packet codec, SLIP framing and the
//! device address table.
//!
//! ```text
//!   bytes ──▶ slip::SlipDecoder ──▶ codec::decode ──▶ Message ──▶ Router
//!   Router ──▶ Message ──▶ codec::encode ──▶ slip::encode ──▶ bytes
//! ```

pub mod address;
pub mod codec;
pub mod message;
pub mod slip;

pub use address::{AddressTable, Inbound, Outbound};
pub use message::{Arg, Message};
