//! Device-scoped address table.
//!
//! Every address is `/<device_id>/<suffix>`.  The table is built once at
//! boot; inbound lookups go through a hash map from the full wire address
//! to a closed [`Inbound`] identifier, so dispatch is one lookup followed
//! by an exhaustive `match`.

use heapless::FnvIndexMap;
use log::warn;

use super::message::{Address, formatted};

/// Commands the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inbound {
    WifiEnable,
    WifiSet,
    WifiGet,
    PortsSet,
    PortsGet,
    RangeSet,
    RangeGet,
    ConfigSet,
    ConfigGet,
    /// Reserved, currently a no-op.
    SetAll,
    /// Reserved, currently a no-op.
    GetAll,
    VibroPulse,
    VibroNow,
}

impl Inbound {
    pub const ALL: [Self; 13] = [
        Self::WifiEnable,
        Self::WifiSet,
        Self::WifiGet,
        Self::PortsSet,
        Self::PortsGet,
        Self::RangeSet,
        Self::RangeGet,
        Self::ConfigSet,
        Self::ConfigGet,
        Self::SetAll,
        Self::GetAll,
        Self::VibroPulse,
        Self::VibroNow,
    ];

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::WifiEnable => "wifi/enable",
            Self::WifiSet => "wifi/set",
            Self::WifiGet => "wifi/get",
            Self::PortsSet => "ports/set",
            Self::PortsGet => "ports/get",
            Self::RangeSet => "range/set",
            Self::RangeGet => "range/get",
            Self::ConfigSet => "config/set",
            Self::ConfigGet => "config/get",
            Self::SetAll => "set-all",
            Self::GetAll => "get-all",
            Self::VibroPulse => "vibro/pulse",
            Self::VibroNow => "vibro/now",
        }
    }

    /// Minimum argument count for the command to be applied.
    pub const fn min_args(self) -> usize {
        match self {
            Self::WifiEnable | Self::VibroNow => 1,
            Self::WifiSet | Self::PortsSet | Self::RangeSet => 2,
            Self::VibroPulse => 3,
            Self::ConfigSet => 5,
            Self::WifiGet
            | Self::PortsGet
            | Self::RangeGet
            | Self::ConfigGet
            | Self::SetAll
            | Self::GetAll => 0,
        }
    }
}

/// Topics the device emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    WifiState,
    WifiSettingsAck,
    PortsAck,
    RangeAck,
    ConfigAck,
    Button,
    Sensors,
    Frame,
}

impl Outbound {
    pub const ALL: [Self; 8] = [
        Self::WifiState,
        Self::WifiSettingsAck,
        Self::PortsAck,
        Self::RangeAck,
        Self::ConfigAck,
        Self::Button,
        Self::Sensors,
        Self::Frame,
    ];

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::WifiState => "wifi/state",
            Self::WifiSettingsAck => "wifi/settings-ack",
            Self::PortsAck => "ports-ack",
            Self::RangeAck => "range-ack",
            Self::ConfigAck => "config-ack",
            Self::Button => "button",
            Self::Sensors => "sensors",
            Self::Frame => "frame",
        }
    }
}

/// Address table; read-only after [`AddressTable::new`].
pub struct AddressTable {
    inbound: FnvIndexMap<Address, Inbound, 16>,
    outbound: [Address; Outbound::ALL.len()],
}

impl AddressTable {
    pub fn new(device_id: &str) -> Self {
        let mut inbound = FnvIndexMap::new();
        for cmd in Inbound::ALL {
            let address: Address = formatted(format_args!("/{}/{}", device_id, cmd.suffix()));
            if inbound.insert(address, cmd).is_err() {
                warn!("AddressTable: no room for {:?}", cmd);
            }
        }
        let outbound = Outbound::ALL
            .map(|topic| formatted(format_args!("/{}/{}", device_id, topic.suffix())));
        Self { inbound, outbound }
    }

    /// Resolve a wire address.  `None` for anything not in the table.
    pub fn lookup(&self, address: &str) -> Option<Inbound> {
        let key: Address = formatted(format_args!("{address}"));
        // A truncated key could alias a real address; reject instead.
        if key.len() != address.len() {
            return None;
        }
        self.inbound.get(&key).copied()
    }

    pub fn outbound(&self, topic: Outbound) -> &str {
        &self.outbound[topic as usize]
    }

    pub fn inbound(&self, cmd: Inbound) -> Option<&str> {
        self.inbound
            .iter()
            .find(|(_, c)| **c == cmd)
            .map(|(a, _)| a.as_str())
    }
}
