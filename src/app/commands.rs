//! Inbound commands, decoded from wire messages.
//!
//! Decoding is all-or-nothing: a message whose address is unknown, or
//! whose arguments are too few or of the wrong type, yields `None` and is
//! treated as if it never arrived.

use crate::config::{clamp_period, clamp_port, clamp_range};
use crate::osc::message::StringArg;
use crate::osc::{AddressTable, Inbound, Message};

/// Commands the [`Router`](super::router::Router) applies.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    WifiEnable(bool),
    /// `password` is empty when the sender gave only ssid and host.
    WifiSet {
        ssid: StringArg,
        password: StringArg,
        host_ip: StringArg,
    },
    WifiGet,
    PortsSet {
        input: u16,
        output: u16,
    },
    PortsGet,
    RangeSet {
        accel: u8,
        gyro: u8,
    },
    RangeGet,
    ConfigSet(GlobalSettings),
    ConfigGet,
    SetAll,
    GetAll,
    VibroPulse {
        on_ms: u32,
        off_ms: u32,
        repeat: u32,
    },
    VibroNow(bool),
}

/// Arguments of `config/set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSettings {
    pub use_serial: bool,
    pub send_single_frame: bool,
    pub read_mag_period_ms: u32,
    pub output_frame_period_ms: u32,
    pub button_hold_duration_ms: u32,
}

impl Command {
    /// Resolve `msg` against `table` and extract typed arguments.
    pub fn decode(table: &AddressTable, msg: &Message) -> Option<Self> {
        let id = table.lookup(msg.address())?;
        if msg.len() < id.min_args() {
            return None;
        }

        let cmd = match id {
            Inbound::WifiEnable => Self::WifiEnable(msg.int(0)? > 0),
            Inbound::WifiSet => {
                let ssid = string_arg(msg, 0)?;
                let (password, host_ip) = if msg.len() == 2 {
                    (StringArg::new(), string_arg(msg, 1)?)
                } else {
                    (string_arg(msg, 1)?, string_arg(msg, 2)?)
                };
                Self::WifiSet {
                    ssid,
                    password,
                    host_ip,
                }
            }
            Inbound::WifiGet => Self::WifiGet,
            Inbound::PortsSet => Self::PortsSet {
                input: clamp_port(msg.int(0)?),
                output: clamp_port(msg.int(1)?),
            },
            Inbound::PortsGet => Self::PortsGet,
            Inbound::RangeSet => Self::RangeSet {
                accel: clamp_range(msg.int(0)?),
                gyro: clamp_range(msg.int(1)?),
            },
            Inbound::RangeGet => Self::RangeGet,
            Inbound::ConfigSet => Self::ConfigSet(GlobalSettings {
                use_serial: msg.int(0)? > 0,
                send_single_frame: msg.int(1)? > 0,
                read_mag_period_ms: clamp_period(msg.int(2)?),
                output_frame_period_ms: clamp_period(msg.int(3)?),
                button_hold_duration_ms: clamp_period(msg.int(4)?),
            }),
            Inbound::ConfigGet => Self::ConfigGet,
            Inbound::SetAll => Self::SetAll,
            Inbound::GetAll => Self::GetAll,
            Inbound::VibroPulse => Self::VibroPulse {
                on_ms: clamp_period(msg.int(0)?),
                off_ms: clamp_period(msg.int(1)?),
                repeat: clamp_period(msg.int(2)?),
            },
            Inbound::VibroNow => Self::VibroNow(msg.int(0)? != 0),
        };
        Some(cmd)
    }
}

fn string_arg(msg: &Message, index: usize) -> Option<StringArg> {
    msg.string(index).map(crate::osc::message::truncated)
}
