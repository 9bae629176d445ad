//! Line-delimited text protocol spoken with the browser configuration page.
//!
//! ```text
//! page → device   settings\n<13 fields>\n      overwrite + persist
//!                 clear\n                       reset to defaults + persist
//!                 anything else                 treated as a hello
//! device → page   settings\n<13 fields>\n<build-id>\n<version>\n
//! ```
//!
//! Field order: ssid, password, host ip, input port, output port, accel
//! range, gyro range, use wifi, use serial, send single frame, mag read
//! period, frame output period, button hold duration.  Booleans are `0`
//! or `1`.

use core::fmt::{self, Write};

use crate::config::{DeviceConfig, clamp_period, clamp_port, clamp_range};

/// Number of configuration fields in a `settings` frame.
pub const FIELD_COUNT: usize = 13;

/// Reply frame capacity.
pub type PageText = heapless::String<512>;

/// Decoded page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    /// Replace every configurable field.
    Settings(Box<DeviceConfig>),
    /// Reset to compiled defaults.
    Clear,
    /// Page opened the channel (or sent something we do not act on).
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// Fewer than [`FIELD_COUNT`] lines after the `settings` keyword.
    MissingField(usize),
    /// A numeric field did not parse.
    BadNumber(usize),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(i) => write!(f, "settings field {i} missing"),
            Self::BadNumber(i) => write!(f, "settings field {i} is not a number"),
        }
    }
}

/// Parse one text frame.  `base` supplies the fields the page does not
/// carry (the device id).
pub fn parse(text: &str, base: &DeviceConfig) -> Result<PageRequest, PageError> {
    let mut lines = text.split('\n');
    match lines.next().map(str::trim_end) {
        Some("settings") => {}
        Some("clear") => return Ok(PageRequest::Clear),
        _ => return Ok(PageRequest::Hello),
    }

    let mut fields: [&str; FIELD_COUNT] = [""; FIELD_COUNT];
    for (i, slot) in fields.iter_mut().enumerate() {
        *slot = lines
            .next()
            .map(|l| l.trim_end_matches('\r'))
            .ok_or(PageError::MissingField(i))?;
    }

    let int = |i: usize| -> Result<i32, PageError> {
        fields[i].trim().parse::<i32>().map_err(|_| PageError::BadNumber(i))
    };

    let mut cfg = base.clone();
    cfg.set_ssid(fields[0]);
    cfg.set_password(fields[1]);
    cfg.set_host_ip(fields[2]);
    cfg.input_port = clamp_port(int(3)?);
    cfg.output_port = clamp_port(int(4)?);
    cfg.accel_range = clamp_range(int(5)?);
    cfg.gyro_range = clamp_range(int(6)?);
    cfg.use_wifi = int(7)? != 0;
    cfg.use_serial = int(8)? != 0;
    cfg.send_single_frame = int(9)? != 0;
    cfg.read_mag_period_ms = clamp_period(int(10)?);
    cfg.output_frame_period_ms = clamp_period(int(11)?);
    cfg.button_hold_duration_ms = clamp_period(int(12)?);

    Ok(PageRequest::Settings(Box::new(cfg)))
}

/// Render the `settings` frame sent on connect and after every update.
pub fn render(cfg: &DeviceConfig, build_id: &str, version: &str) -> PageText {
    let mut out = PageText::new();
    // A full 512-byte frame cannot be exceeded with bounded config strings.
    let _ = write_settings(&mut out, cfg, build_id, version);
    out
}

fn write_settings(
    out: &mut impl Write,
    cfg: &DeviceConfig,
    build_id: &str,
    version: &str,
) -> fmt::Result {
    let flag = u8::from;
    writeln!(out, "settings")?;
    writeln!(out, "{}", cfg.ssid)?;
    writeln!(out, "{}", cfg.password)?;
    writeln!(out, "{}", cfg.host_ip)?;
    writeln!(out, "{}", cfg.input_port)?;
    writeln!(out, "{}", cfg.output_port)?;
    writeln!(out, "{}", cfg.accel_range)?;
    writeln!(out, "{}", cfg.gyro_range)?;
    writeln!(out, "{}", flag(cfg.use_wifi))?;
    writeln!(out, "{}", flag(cfg.use_serial))?;
    writeln!(out, "{}", flag(cfg.send_single_frame))?;
    writeln!(out, "{}", cfg.read_mag_period_ms)?;
    writeln!(out, "{}", cfg.output_frame_period_ms)?;
    writeln!(out, "{}", cfg.button_hold_duration_ms)?;
    writeln!(out, "{}", build_id)?;
    writeln!(out, "{}", version)
}
