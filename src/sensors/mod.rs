//! Sensor subsystem: the [`Imu`] seam and the scheduling [`SensorHub`].
//!
//! The hub owns the IMU and decides when to sample it.  Magnetometer reads
//! are slow, so they run on their own period; between reads the last
//! magnetometer vector is repeated in every frame.

use log::{debug, warn};

use crate::app::events::SensorFrame;
use crate::app::ports::SensorPort;

/// Register-level inertial sensor access.
pub trait Imu {
    type Error: core::fmt::Debug;

    /// Accelerometer full-scale code (0..=3).
    fn set_accel_range(&mut self, code: u8) -> Result<(), Self::Error>;

    /// Gyroscope full-scale code (0..=3).
    fn set_gyro_range(&mut self, code: u8) -> Result<(), Self::Error>;

    /// One accelerometer + gyroscope sample: `(accel xyz, gyro xyz)`.
    fn read_motion(&mut self) -> Result<([f32; 3], [f32; 3]), Self::Error>;

    fn read_mag(&mut self) -> Result<[f32; 3], Self::Error>;
}

/// IMU stand-in that reports a device at rest.
#[derive(Debug, Default)]
pub struct NullImu;

impl Imu for NullImu {
    type Error = core::convert::Infallible;

    fn set_accel_range(&mut self, _code: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_gyro_range(&mut self, _code: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_motion(&mut self) -> Result<([f32; 3], [f32; 3]), Self::Error> {
        Ok(([0.0, 0.0, 1.0], [0.0; 3]))
    }

    fn read_mag(&mut self) -> Result<[f32; 3], Self::Error> {
        Ok([0.0; 3])
    }
}

pub struct SensorHub<I: Imu> {
    imu: I,
    read_mag_period_ms: u32,
    output_frame_period_ms: u32,
    last_mag_ms: Option<u32>,
    last_frame_ms: Option<u32>,
    mag: [f32; 3],
}

impl<I: Imu> SensorHub<I> {
    pub fn new(imu: I) -> Self {
        Self {
            imu,
            read_mag_period_ms: 0,
            output_frame_period_ms: 0,
            last_mag_ms: None,
            last_frame_ms: None,
            mag: [0.0; 3],
        }
    }

    pub fn imu(&self) -> &I {
        &self.imu
    }

    fn due(last: Option<u32>, now_ms: u32, period_ms: u32) -> bool {
        last.is_none_or(|t| now_ms.wrapping_sub(t) >= period_ms)
    }
}

impl<I: Imu> SensorPort for SensorHub<I> {
    fn poll(&mut self, now_ms: u32) -> Option<SensorFrame> {
        if Self::due(self.last_mag_ms, now_ms, self.read_mag_period_ms) {
            self.last_mag_ms = Some(now_ms);
            match self.imu.read_mag() {
                Ok(mag) => self.mag = mag,
                // Previous vector is kept.
                Err(e) => debug!("Sensors: magnetometer read failed: {:?}", e),
            }
        }

        if !Self::due(self.last_frame_ms, now_ms, self.output_frame_period_ms) {
            return None;
        }
        self.last_frame_ms = Some(now_ms);

        match self.imu.read_motion() {
            Ok((accel, gyro)) => Some(SensorFrame::new(accel, gyro, self.mag)),
            Err(e) => {
                warn!("Sensors: motion read failed: {:?}", e);
                None
            }
        }
    }

    fn set_ranges(&mut self, accel: u8, gyro: u8) {
        if let Err(e) = self.imu.set_accel_range(accel) {
            warn!("Sensors: cannot set accel range {}: {:?}", accel, e);
        }
        if let Err(e) = self.imu.set_gyro_range(gyro) {
            warn!("Sensors: cannot set gyro range {}: {:?}", gyro, e);
        }
    }

    fn set_periods(&mut self, read_mag_ms: u32, output_frame_ms: u32) {
        self.read_mag_period_ms = read_mag_ms;
        self.output_frame_period_ms = output_frame_ms;
    }
}
