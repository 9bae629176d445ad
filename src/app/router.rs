//! Router — the dispatch core.
//!
//! [`Router`] owns the device configuration, the address table and the
//! config store.  It applies inbound messages, translates event-source
//! state into protocol messages and decides which transport(s) receive
//! each outbound message.
//!
//! ```text
//!  wired ──┐                         ┌──▶ wired    (use_serial | ack)
//!          ├──▶ route_message ──┐    │
//! wireless ┘                    ├──▶ fan-out
//!  button ───▶ on_button ───────┤    │
//! sensors ───▶ on_sensor_frame ─┘    └──▶ wireless (use_wifi   | ack)
//! ```
//!
//! Control-plane acknowledgements go to both transports regardless of the
//! `use_serial` / `use_wifi` flags; telemetry is gated by them.

use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::error::Error;
use crate::osc::codec::CodecError;
use crate::osc::{AddressTable, Message, Outbound};

use super::commands::{Command, GlobalSettings};
use super::config_page::{self, PageRequest, PageText};
use super::events::{ButtonState, ConnectionState, SensorFrame};
use super::ports::{
    ConfigPort, OscTransport, SensorPort, VibratorPort, WirelessControl, WirelessSettings,
};

/// Firmware version reported to the configuration page.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier reported to the configuration page.
pub const BUILD_ID: &str = match option_env!("MOTIONLINK_BUILD_ID") {
    Some(id) => id,
    None => "dev",
};

/// Which transport a message or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Wired,
    Wireless,
}

/// The two transports, borrowed for the duration of one callback.
pub struct Links<'a, S, W> {
    pub wired: &'a mut S,
    pub wireless: &'a mut W,
}

impl<S: OscTransport, W: OscTransport + WirelessControl> Links<'_, S, W> {
    /// Control-plane fan-out: every transport, unconditionally.
    fn broadcast(&mut self, msg: &Message) {
        self.wired.send(msg);
        self.wireless.send(msg);
    }

    /// Telemetry fan-out: only the transports enabled in `cfg`.
    fn telemetry(&mut self, msg: &Message, cfg: &DeviceConfig) {
        if cfg.use_serial {
            self.wired.send(msg);
        }
        if cfg.use_wifi {
            self.wireless.send(msg);
        }
    }

    fn restart_wireless(&mut self, cfg: &DeviceConfig) {
        self.wireless.stop();
        self.wireless.start(&WirelessSettings::from_config(cfg));
    }
}

pub struct Router<C: ConfigPort> {
    config: DeviceConfig,
    table: AddressTable,
    store: C,
    /// Set by every persist; cleared by [`Router::take_config_changed`].
    changed: bool,
}

impl<C: ConfigPort> Router<C> {
    /// Load the stored configuration (or defaults) and build the address
    /// table for `device_id`.
    pub fn new(store: C, device_id: &str) -> Self {
        let mut config = match store.load() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Router: config load failed ({}), using defaults", e);
                DeviceConfig::default()
            }
        };
        config.device_id = crate::osc::message::truncated(device_id);
        let table = AddressTable::new(&config.device_id);
        info!("Router: device '{}' ready", config.device_id);
        Self {
            config,
            table,
            store,
            changed: false,
        }
    }

    /// Push the loaded settings to the drivers and bring the wireless
    /// link up if enabled.  Call once after construction.
    pub fn start<S, W>(&mut self, links: &mut Links<'_, S, W>, sensors: &mut impl SensorPort)
    where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        sensors.set_ranges(self.config.accel_range, self.config.gyro_range);
        sensors.set_periods(
            self.config.read_mag_period_ms,
            self.config.output_frame_period_ms,
        );
        links
            .wireless
            .start(&WirelessSettings::from_config(&self.config));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn addresses(&self) -> &AddressTable {
        &self.table
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// True once after any call that updated the configuration.  The
    /// caller pushes a fresh [`page_snapshot`](Self::page_snapshot) to the
    /// configuration page.
    pub fn take_config_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    // ── Inbound dispatch ──────────────────────────────────────

    /// Apply one inbound message.  Unknown addresses and short argument
    /// lists are dropped without a reply.
    pub fn route_message<S, W>(
        &mut self,
        msg: &Message,
        links: &mut Links<'_, S, W>,
        sensors: &mut impl SensorPort,
        vibrator: &mut impl VibratorPort,
    ) where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        let Some(cmd) = Command::decode(&self.table, msg) else {
            debug!("Router: ignored '{}' ({} args)", msg.address(), msg.len());
            return;
        };

        match cmd {
            Command::WifiEnable(on) => {
                self.config.use_wifi = on;
                self.persist();
                let echo = Message::new(msg.address()).with(i32::from(on));
                links.broadcast(&echo);
                if on {
                    links
                        .wireless
                        .start(&WirelessSettings::from_config(&self.config));
                } else {
                    links.wireless.stop();
                }
                info!("Router: wifi {}", if on { "enabled" } else { "disabled" });
            }
            Command::WifiSet {
                ssid,
                password,
                host_ip,
            } => {
                self.config.set_ssid(&ssid);
                self.config.set_password(&password);
                self.config.set_host_ip(&host_ip);
                self.persist();
                links.broadcast(&self.wifi_settings());
                links.restart_wireless(&self.config);
                info!("Router: wifi settings updated (ssid='{}')", self.config.ssid);
            }
            Command::WifiGet => links.broadcast(&self.wifi_settings()),
            Command::PortsSet { input, output } => {
                self.config.input_port = input;
                self.config.output_port = output;
                self.persist();
                links.broadcast(&self.ports());
                links.restart_wireless(&self.config);
                info!("Router: ports in={} out={}", input, output);
            }
            Command::PortsGet => links.broadcast(&self.ports()),
            Command::RangeSet { accel, gyro } => {
                self.apply_ranges(accel, gyro, sensors);
                self.persist();
                links.broadcast(&self.ranges());
            }
            Command::RangeGet => links.broadcast(&self.ranges()),
            Command::ConfigSet(settings) => {
                self.apply_global(settings, sensors);
                self.persist();
                links.broadcast(&self.global_config());
            }
            Command::ConfigGet => links.broadcast(&self.global_config()),
            Command::SetAll | Command::GetAll => {
                debug!("Router: '{}' is reserved", msg.address());
            }
            Command::VibroPulse {
                on_ms,
                off_ms,
                repeat,
            } => vibrator.pulse(on_ms, off_ms, repeat),
            Command::VibroNow(on) => vibrator.vibrate(on),
        }
    }

    /// Hook for undecodable packets.  Nothing is sent back.
    pub fn on_transport_error(&mut self, origin: Origin, err: CodecError) {
        debug!("Router: {:?} transport dropped a packet: {}", origin, Error::from(err));
    }

    // ── Event translation ─────────────────────────────────────

    /// Wireless link status, reported on the wired transport only.
    pub fn on_connection_change(&mut self, state: ConnectionState, wired: &mut impl OscTransport) {
        info!("Router: wifi {:?}", state);
        let msg = Message::new(self.table.outbound(Outbound::WifiState)).with(state.wire_value());
        wired.send(&msg);
    }

    /// Button change.  Folded into the frame in single-frame mode.
    pub fn on_button<S, W>(&mut self, state: ButtonState, links: &mut Links<'_, S, W>)
    where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        if self.config.send_single_frame {
            return;
        }
        let msg = Message::new(self.table.outbound(Outbound::Button)).with(state.wire_value());
        links.telemetry(&msg, &self.config);
    }

    /// New sample batch.  `button` and `vibrating` are the states at the
    /// same tick, embedded in single-frame mode.
    pub fn on_sensor_frame<S, W>(
        &mut self,
        frame: &SensorFrame,
        button: ButtonState,
        vibrating: bool,
        links: &mut Links<'_, S, W>,
    ) where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        let topic = if self.config.send_single_frame {
            Outbound::Frame
        } else {
            Outbound::Sensors
        };
        let mut msg = Message::new(self.table.outbound(topic));
        for &v in frame.values() {
            msg.push(v);
        }
        if self.config.send_single_frame {
            msg.push(button.wire_value());
            msg.push(i32::from(vibrating));
        }
        links.telemetry(&msg, &self.config);
    }

    // ── Configuration page ────────────────────────────────────

    /// Current settings as a page frame.
    pub fn page_snapshot(&self) -> PageText {
        config_page::render(&self.config, BUILD_ID, FIRMWARE_VERSION)
    }

    /// Apply one text frame from the configuration page and return the
    /// frame to send back.
    pub fn handle_config_page<S, W>(
        &mut self,
        text: &str,
        links: &mut Links<'_, S, W>,
        sensors: &mut impl SensorPort,
    ) -> Option<PageText>
    where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        match self.apply_page(text, links, sensors) {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!("Router: rejected page frame: {}", e);
                None
            }
        }
    }

    fn apply_page<S, W>(
        &mut self,
        text: &str,
        links: &mut Links<'_, S, W>,
        sensors: &mut impl SensorPort,
    ) -> crate::error::Result<PageText>
    where
        S: OscTransport,
        W: OscTransport + WirelessControl,
    {
        let next = match config_page::parse(text, &self.config)? {
            PageRequest::Hello => return Ok(self.page_snapshot()),
            PageRequest::Settings(cfg) => *cfg,
            PageRequest::Clear => {
                if let Err(e) = self.store.erase() {
                    warn!("Router: erase failed: {}", Error::from(e));
                }
                self.config.reset_keeping_id()
            }
        };

        let global = GlobalSettings {
            use_serial: next.use_serial,
            send_single_frame: next.send_single_frame,
            read_mag_period_ms: next.read_mag_period_ms,
            output_frame_period_ms: next.output_frame_period_ms,
            button_hold_duration_ms: next.button_hold_duration_ms,
        };
        self.config = next;
        self.apply_ranges(self.config.accel_range, self.config.gyro_range, sensors);
        self.apply_global(global, sensors);
        self.persist();
        links.restart_wireless(&self.config);
        info!("Router: settings replaced from configuration page");
        Ok(self.page_snapshot())
    }

    // ── Apply-and-persist groups ──────────────────────────────

    /// Ranges live in the sensor hardware and in the config; both are
    /// written here and nowhere else.
    fn apply_ranges(&mut self, accel: u8, gyro: u8, sensors: &mut impl SensorPort) {
        sensors.set_ranges(accel, gyro);
        self.config.accel_range = accel;
        self.config.gyro_range = gyro;
    }

    /// Same pairing for the sensor timing knobs.
    fn apply_global(&mut self, g: GlobalSettings, sensors: &mut impl SensorPort) {
        sensors.set_periods(g.read_mag_period_ms, g.output_frame_period_ms);
        self.config.use_serial = g.use_serial;
        self.config.send_single_frame = g.send_single_frame;
        self.config.read_mag_period_ms = g.read_mag_period_ms;
        self.config.output_frame_period_ms = g.output_frame_period_ms;
        self.config.button_hold_duration_ms = g.button_hold_duration_ms;
    }

    fn persist(&mut self) {
        self.changed = true;
        if let Err(e) = self.store.save(&self.config).map_err(Error::from) {
            warn!("Router: {}", e);
        }
    }

    // ── Reply builders ────────────────────────────────────────

    fn wifi_settings(&self) -> Message {
        Message::new(self.table.outbound(Outbound::WifiSettingsAck))
            .with(self.config.ssid.as_str())
            .with(self.config.password.as_str())
            .with(self.config.host_ip.as_str())
    }

    fn ports(&self) -> Message {
        Message::new(self.table.outbound(Outbound::PortsAck))
            .with(i32::from(self.config.input_port))
            .with(i32::from(self.config.output_port))
    }

    fn ranges(&self) -> Message {
        Message::new(self.table.outbound(Outbound::RangeAck))
            .with(i32::from(self.config.accel_range))
            .with(i32::from(self.config.gyro_range))
    }

    /// Flags go out as `"1"` / `"0"` strings, periods as integers.
    fn global_config(&self) -> Message {
        let flag = |b: bool| if b { "1" } else { "0" };
        Message::new(self.table.outbound(Outbound::ConfigAck))
            .with(flag(self.config.use_serial))
            .with(flag(self.config.send_single_frame))
            .with(self.config.read_mag_period_ms as i32)
            .with(self.config.output_frame_period_ms as i32)
            .with(self.config.button_hold_duration_ms as i32)
    }
}
