//! Device configuration record.
//!
//! The single persisted entity.  It is owned by the
//! [`Router`](crate::app::router::Router) and mutated only from its
//! message handlers; drivers receive the individual fields they need as
//! call arguments.

use serde::{Deserialize, Serialize};

use crate::osc::message::truncated;

pub const DEFAULT_DEVICE_ID: &str = "motionlink";

/// Highest accelerometer / gyroscope full-scale code.
pub const MAX_RANGE_CODE: u8 = 3;

pub type DeviceId = heapless::String<24>;
pub type Ssid = heapless::String<32>;
pub type Secret = heapless::String<64>;
pub type HostIp = heapless::String<64>;

/// Persisted device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Namespaces every wire address.  Fixed at boot.
    pub device_id: DeviceId,

    // --- Transport fan-out ---
    pub use_wifi: bool,
    pub use_serial: bool,

    // --- Wireless ---
    pub ssid: Ssid,
    pub password: Secret,
    /// Telemetry destination.
    pub host_ip: HostIp,
    pub input_port: u16,
    pub output_port: u16,

    // --- Sensors ---
    /// Accelerometer full-scale code (0..=3).
    pub accel_range: u8,
    /// Gyroscope full-scale code (0..=3).
    pub gyro_range: u8,

    // --- Telemetry shape and timing ---
    pub send_single_frame: bool,
    pub read_mag_period_ms: u32,
    pub output_frame_period_ms: u32,
    pub button_hold_duration_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: truncated(DEFAULT_DEVICE_ID),

            use_wifi: true,
            use_serial: true,

            ssid: Ssid::new(),
            password: Secret::new(),
            host_ip: truncated("192.168.0.100"),
            input_port: 7400,
            output_port: 7401,

            accel_range: 0, // ±2 g
            gyro_range: 0,  // ±250 °/s

            send_single_frame: true,
            read_mag_period_ms: 10,
            output_frame_period_ms: 10,
            button_hold_duration_ms: 500,
        }
    }
}

impl DeviceConfig {
    /// Defaults, keeping the boot-time device id.
    pub fn reset_keeping_id(&self) -> Self {
        Self {
            device_id: self.device_id.clone(),
            ..Self::default()
        }
    }

    pub fn set_ssid(&mut self, ssid: &str) {
        self.ssid = truncated(ssid);
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = truncated(password);
    }

    pub fn set_host_ip(&mut self, host_ip: &str) {
        self.host_ip = truncated(host_ip);
    }
}

/// Clamp a wire integer into a UDP port number.
pub fn clamp_port(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

/// Clamp a wire integer into a sensor full-scale code.
pub fn clamp_range(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_RANGE_CODE)) as u8
}

/// Clamp a wire integer into a non-negative millisecond period.
pub fn clamp_period(value: i32) -> u32 {
    value.max(0) as u32
}
