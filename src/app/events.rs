//! Low-level state reported by the event sources.
//!
//! The [`Router`](super::router::Router) turns these into protocol
//! messages; the integer codes below are the wire values.

/// Wireless link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
}

impl ConnectionState {
    pub const fn wire_value(self) -> i32 {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
            Self::Connecting => 2,
        }
    }
}

/// Debounced button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
    /// Pressed for longer than the configured hold duration.
    Holding,
}

impl ButtonState {
    pub const fn wire_value(self) -> i32 {
        match self {
            Self::Released => 0,
            Self::Pressed => 1,
            Self::Holding => 2,
        }
    }
}

/// Number of floats in one sample batch.
pub const FRAME_LEN: usize = 9;

/// One sample batch: accelerometer xyz, gyroscope xyz, magnetometer xyz.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorFrame(pub [f32; FRAME_LEN]);

impl SensorFrame {
    pub fn new(accel: [f32; 3], gyro: [f32; 3], mag: [f32; 3]) -> Self {
        let mut v = [0.0; FRAME_LEN];
        v[..3].copy_from_slice(&accel);
        v[3..6].copy_from_slice(&gyro);
        v[6..].copy_from_slice(&mag);
        Self(v)
    }

    pub fn values(&self) -> &[f32; FRAME_LEN] {
        &self.0
    }
}
