//! Port traits — the boundary between the router and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Router (domain)
//! ```
//!
//! Transports, event sources, the actuator and storage implement these
//! traits.  The [`Router`](super::router::Router) and
//! [`Device`](super::device::Device) consume them via generics, so the
//! dispatch core never touches hardware directly.
//!
//! Every poll is non-blocking: an adapter that would block must buffer
//! internally and report "nothing ready".

use crate::config::DeviceConfig;
use crate::osc::Message;
use crate::osc::codec::CodecError;

use super::events::{ButtonState, ConnectionState, SensorFrame};

// ───────────────────────────────────────────────────────────────
// Transports
// ───────────────────────────────────────────────────────────────

/// A message-level channel (serial link or UDP link).
pub trait OscTransport {
    /// Send one message.  Delivery is best effort; a transport that is
    /// down drops the message.
    fn send(&mut self, msg: &Message);

    /// Return the next complete inbound packet, if any.  Packets that
    /// fail to decode are reported as `Err` so the router's error hook
    /// sees them.
    fn poll(&mut self) -> Option<Result<Message, CodecError>>;
}

/// Everything the wireless transport needs to (re)start, copied out of
/// the config at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct WirelessSettings {
    pub enabled: bool,
    pub ssid: crate::config::Ssid,
    pub password: crate::config::Secret,
    pub host_ip: crate::config::HostIp,
    pub input_port: u16,
    pub output_port: u16,
}

impl WirelessSettings {
    pub fn from_config(cfg: &DeviceConfig) -> Self {
        Self {
            enabled: cfg.use_wifi,
            ssid: cfg.ssid.clone(),
            password: cfg.password.clone(),
            host_ip: cfg.host_ip.clone(),
            input_port: cfg.input_port,
            output_port: cfg.output_port,
        }
    }
}

/// Lifecycle control of the wireless transport.
pub trait WirelessControl {
    /// Start joining the network.  Does nothing when
    /// `settings.enabled` is false.
    fn start(&mut self, settings: &WirelessSettings);

    /// Leave the network and close the socket.
    fn stop(&mut self);

    /// Advance the connection state machine and return the oldest
    /// unreported state change.  Every change is returned exactly once,
    /// in order; call until `None` to drain them.
    fn poll_connection(&mut self, now_ms: u32) -> Option<ConnectionState>;
}

/// Text channel to the browser configuration page.
pub trait ConfigPageChannel {
    /// Next complete text frame from the page, if any.
    fn poll(&mut self) -> Option<heapless::String<512>>;

    /// Push a text frame to the connected page.
    fn send(&mut self, text: &str);
}

/// Channel for boards without a configuration page.
pub struct NoConfigPage;

impl ConfigPageChannel for NoConfigPage {
    fn poll(&mut self) -> Option<heapless::String<512>> {
        None
    }

    fn send(&mut self, _text: &str) {}
}

// ───────────────────────────────────────────────────────────────
// Event sources
// ───────────────────────────────────────────────────────────────

/// Debounced push button.
pub trait ButtonPort {
    /// Advance the state machine; returns the new state on a change.
    /// `hold_ms` is the press duration after which the state becomes
    /// [`ButtonState::Holding`].
    fn poll(&mut self, now_ms: u32, hold_ms: u32) -> Option<ButtonState>;

    /// Current debounced state.
    fn state(&self) -> ButtonState;
}

/// Inertial sensor block.
pub trait SensorPort {
    /// Return a new sample batch when one is due.
    fn poll(&mut self, now_ms: u32) -> Option<SensorFrame>;

    /// Apply accelerometer / gyroscope full-scale codes to the hardware.
    fn set_ranges(&mut self, accel: u8, gyro: u8);

    /// Apply magnetometer read period and frame output period.
    fn set_periods(&mut self, read_mag_ms: u32, output_frame_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Actuator
// ───────────────────────────────────────────────────────────────

/// Vibration motor.
pub trait VibratorPort {
    /// Run `repeat` on/off cycles (at least one).
    fn pulse(&mut self, on_ms: u32, off_ms: u32, repeat: u32);

    /// Switch continuously on or off, cancelling any pulse sequence.
    fn vibrate(&mut self, on: bool);

    fn is_vibrating(&self) -> bool;

    /// Advance the pulse sequencer.
    fn update(&mut self, now_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the device configuration.
///
/// `save` must be atomic at record granularity: after power loss the
/// stored record is either the previous one or the new one, never a mix.
pub trait ConfigPort {
    /// Load configuration from storage.
    /// Returns [`DeviceConfig::default()`] if no record exists.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError>;

    /// Remove the stored record.
    fn erase(&mut self) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored record failed the magic / deserialization check.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
