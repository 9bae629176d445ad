//! WiFi station + UDP wireless transport.
//!
//! [`WifiLink`] implements [`OscTransport`] and [`WirelessControl`].  It is
//! generic over the [`Station`] (joins the access point) and the
//! [`Datagram`] socket (UDP send/receive), so the connection state machine
//! runs unchanged on the host.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspStation`] drives `esp_idf_svc::wifi`.
//! - **all other targets**: [`SimStation`] for host-side tests.
//!
//! ## Reconnection policy
//!
//! A join attempt that has not produced a link within
//! [`CONNECT_TIMEOUT_MS`] is abandoned.  The adapter then waits an
//! exponential backoff (2 s → 4 s → 8 s … capped at 60 s) before retrying.
//! A successful join resets the backoff.

use core::fmt;
use heapless::Deque;
use log::{debug, info, warn};

use crate::app::events::ConnectionState;
use crate::app::ports::{OscTransport, WirelessControl, WirelessSettings};
use crate::config::HostIp;
use crate::osc::codec::{self, CodecError, MAX_PACKET_LEN};
use crate::osc::Message;

pub const CONNECT_TIMEOUT_MS: u32 = 10_000;
const MIN_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

/// Unreported connection changes kept between polls.  One restart queues
/// at most three (Disconnected, Connecting, Connected).
const CHANGE_QUEUE_DEPTH: usize = 4;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Platform seams
// ───────────────────────────────────────────────────────────────

/// Access-point association.
pub trait Station {
    /// Begin joining `ssid`.  Must not block until the link is up.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    /// True once associated and holding an IP address.
    fn is_connected(&mut self) -> bool;

    fn disconnect(&mut self);
}

/// Non-blocking UDP socket.
pub trait Datagram {
    type Error: fmt::Debug;

    /// Bind the receive port.  Rebinding replaces the previous socket.
    fn bind(&mut self, port: u16) -> Result<(), Self::Error>;

    fn close(&mut self);

    fn send_to(&mut self, data: &[u8], host: &str, port: u16) -> Result<(), Self::Error>;

    /// Receive one datagram.  Returns 0 when nothing is pending.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() {
        return Err(ConnectivityError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Stopped, disabled, or no usable credentials.
    Idle,
    /// Join in progress.  `since_ms` is stamped on the first poll.
    Connecting { since_ms: Option<u32> },
    Connected,
    /// Waiting out the backoff before the next join attempt.
    Backoff { since_ms: u32 },
}

pub struct WifiLink<S: Station, D: Datagram> {
    station: S,
    socket: D,
    state: LinkState,
    settings: Option<WirelessSettings>,
    backoff_secs: u32,
    reported: ConnectionState,
    changes: Deque<ConnectionState, CHANGE_QUEUE_DEPTH>,
}

impl<S: Station, D: Datagram> WifiLink<S, D> {
    pub fn new(station: S, socket: D) -> Self {
        Self {
            station,
            socket,
            state: LinkState::Idle,
            settings: None,
            backoff_secs: MIN_BACKOFF_SECS,
            reported: ConnectionState::Disconnected,
            changes: Deque::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn station(&self) -> &S {
        &self.station
    }

    pub fn station_mut(&mut self) -> &mut S {
        &mut self.station
    }

    pub fn socket(&self) -> &D {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut D {
        &mut self.socket
    }

    /// Current destination for outgoing datagrams.
    pub fn destination(&self) -> Option<(&HostIp, u16)> {
        self.settings.as_ref().map(|s| (&s.host_ip, s.output_port))
    }

    fn report(&mut self, state: ConnectionState) {
        if state == self.reported {
            return;
        }
        self.reported = state;
        if self.changes.is_full() {
            debug!("WiFi: change queue full, dropping oldest");
            self.changes.pop_front();
        }
        let _ = self.changes.push_back(state);
    }

    fn begin_join(&mut self, now_ms: Option<u32>) {
        let Some(settings) = &self.settings else {
            return;
        };
        match self.station.begin(&settings.ssid, &settings.password) {
            Ok(()) => {
                info!("WiFi: joining '{}'", settings.ssid);
                self.state = LinkState::Connecting { since_ms: now_ms };
                self.report(ConnectionState::Connecting);
            }
            Err(e) => {
                warn!("WiFi: join failed: {}", e);
                self.state = LinkState::Backoff {
                    since_ms: now_ms.unwrap_or(0),
                };
                self.report(ConnectionState::Disconnected);
            }
        }
    }

    fn on_link_up(&mut self) {
        let port = self.settings.as_ref().map_or(0, |s| s.input_port);
        if let Err(e) = self.socket.bind(port) {
            warn!("WiFi: cannot bind UDP port {}: {:?}", port, e);
        }
        self.state = LinkState::Connected;
        self.backoff_secs = MIN_BACKOFF_SECS;
        info!("WiFi: connected, listening on UDP {}", port);
        self.report(ConnectionState::Connected);
    }

    fn on_link_down(&mut self, now_ms: u32) {
        self.socket.close();
        self.station.disconnect();
        self.state = LinkState::Backoff { since_ms: now_ms };
        self.report(ConnectionState::Disconnected);
    }
}

impl<S: Station, D: Datagram> WirelessControl for WifiLink<S, D> {
    fn start(&mut self, settings: &WirelessSettings) {
        if !settings.enabled {
            info!("WiFi: disabled");
            return;
        }
        if let Err(e) =
            validate_ssid(&settings.ssid).and_then(|()| validate_password(&settings.password))
        {
            warn!("WiFi: not starting: {}", e);
            return;
        }

        self.settings = Some(settings.clone());
        self.backoff_secs = MIN_BACKOFF_SECS;
        self.begin_join(None);
    }

    fn stop(&mut self) {
        if self.state != LinkState::Idle {
            self.socket.close();
            self.station.disconnect();
            info!("WiFi: stopped");
        }
        self.state = LinkState::Idle;
        self.settings = None;
        self.report(ConnectionState::Disconnected);
    }

    fn poll_connection(&mut self, now_ms: u32) -> Option<ConnectionState> {
        match self.state {
            LinkState::Idle => {}
            LinkState::Connecting { since_ms: None } => {
                if self.station.is_connected() {
                    self.on_link_up();
                } else {
                    self.state = LinkState::Connecting {
                        since_ms: Some(now_ms),
                    };
                }
            }
            LinkState::Connecting {
                since_ms: Some(since),
            } => {
                if self.station.is_connected() {
                    self.on_link_up();
                } else if now_ms.wrapping_sub(since) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: join timed out, retrying in {}s", self.backoff_secs);
                    self.on_link_down(now_ms);
                }
            }
            LinkState::Connected => {
                if !self.station.is_connected() {
                    warn!("WiFi: connection lost, retrying in {}s", self.backoff_secs);
                    self.on_link_down(now_ms);
                }
            }
            LinkState::Backoff { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.backoff_secs * 1000 {
                    self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
                    self.begin_join(Some(now_ms));
                }
            }
        }
        self.changes.pop_front()
    }
}

impl<S: Station, D: Datagram> OscTransport for WifiLink<S, D> {
    fn send(&mut self, msg: &Message) {
        if self.state != LinkState::Connected {
            return;
        }
        let Some((host, port)) = self
            .settings
            .as_ref()
            .map(|s| (s.host_ip.clone(), s.output_port))
        else {
            return;
        };

        let mut packet = [0u8; MAX_PACKET_LEN];
        match codec::encode(msg, &mut packet) {
            Ok(len) => {
                if let Err(e) = self.socket.send_to(&packet[..len], &host, port) {
                    debug!("WiFi: send to {}:{} failed: {:?}", host, port, e);
                }
            }
            Err(e) => warn!("WiFi: cannot encode {}: {}", msg.address(), e),
        }
    }

    fn poll(&mut self) -> Option<Result<Message, CodecError>> {
        if self.state != LinkState::Connected {
            return None;
        }
        let mut buf = [0u8; MAX_PACKET_LEN];
        match self.socket.recv(&mut buf) {
            Ok(0) => None,
            Ok(n) => Some(codec::decode(&buf[..n])),
            Err(e) => {
                debug!("WiFi: recv failed: {:?}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Station backends
// ───────────────────────────────────────────────────────────────

/// Simulated access point.  `reachable` decides whether a join succeeds.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimStation {
    pub reachable: bool,
    joined: bool,
    joins: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimStation {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            ..Self::default()
        }
    }

    /// Number of join attempts so far.
    pub fn joins(&self) -> u32 {
        self.joins
    }
}

#[cfg(not(target_os = "espidf"))]
impl Station for SimStation {
    fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        self.joins += 1;
        self.joined = true;
        debug!("WiFi(sim): join '{}' (attempt {})", ssid, self.joins);
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.joined && self.reachable
    }

    fn disconnect(&mut self) {
        self.joined = false;
    }
}

#[cfg(target_os = "espidf")]
pub struct EspStation {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
}

#[cfg(target_os = "espidf")]
impl EspStation {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self { wifi }
    }
}

#[cfg(target_os = "espidf")]
impl Station for EspStation {
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: password
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        self.wifi
            .set_configuration(&config)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi
                .start()
                .map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.wifi
            .connect()
            .map_err(|_| ConnectivityError::ConnectionFailed)
    }

    fn is_connected(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            debug!("WiFi(espidf): disconnect: {:?}", e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
