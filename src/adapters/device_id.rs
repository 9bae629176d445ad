//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable device ID in the form `ml-xxyyzz` (last 3 bytes of
//! the 6-byte MAC in lowercase hex).  The ID namespaces every OSC address
//! (`/ml-xxyyzz/...`), so it must stay identical across reboots.

use core::fmt::Write;

use crate::config::DeviceId;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `ml-` plus the last 3 MAC bytes, e.g. `ml-efcafe`.
pub fn device_id(mac: &MacAddress) -> DeviceId {
    let mut id = DeviceId::new();
    let _ = write!(id, "ml-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}
