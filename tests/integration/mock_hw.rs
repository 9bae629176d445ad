//! Mock hardware for integration tests.
//!
//! Every mock records the calls it receives so tests can assert on the
//! full history without touching real UART, radio or GPIO.

use std::collections::VecDeque;

use motionlink::app::config_page::PageText;
use motionlink::app::device::{Board, Peripherals};
use motionlink::app::events::{ButtonState, ConnectionState, SensorFrame};
use motionlink::app::ports::{
    ButtonPort, ConfigError, ConfigPageChannel, ConfigPort, OscTransport, SensorPort,
    VibratorPort, WirelessControl, WirelessSettings,
};
use motionlink::app::router::{Links, Router};
use motionlink::config::DeviceConfig;
use motionlink::osc::codec::CodecError;
use motionlink::osc::Message;

// ── Transports ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<Message>,
    pub inbox: VecDeque<Result<Message, CodecError>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn queue(&mut self, msg: Message) {
        self.inbox.push_back(Ok(msg));
    }

    /// Messages sent to `address`.
    pub fn sent_to(&self, address: &str) -> Vec<&Message> {
        self.sent.iter().filter(|m| m.address() == address).collect()
    }

    pub fn last(&self) -> Option<&Message> {
        self.sent.last()
    }
}

impl OscTransport for MockTransport {
    fn send(&mut self, msg: &Message) {
        self.sent.push(msg.clone());
    }

    fn poll(&mut self) -> Option<Result<Message, CodecError>> {
        self.inbox.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WirelessCall {
    Send(Message),
    Start(WirelessSettings),
    Stop,
}

#[derive(Default)]
pub struct MockWireless {
    pub calls: Vec<WirelessCall>,
    pub inbox: VecDeque<Result<Message, CodecError>>,
    pub states: VecDeque<ConnectionState>,
}

#[allow(dead_code)]
impl MockWireless {
    pub fn queue(&mut self, msg: Message) {
        self.inbox.push_back(Ok(msg));
    }

    pub fn sent(&self) -> Vec<&Message> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                WirelessCall::Send(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> Vec<&WirelessSettings> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                WirelessCall::Start(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl OscTransport for MockWireless {
    fn send(&mut self, msg: &Message) {
        self.calls.push(WirelessCall::Send(msg.clone()));
    }

    fn poll(&mut self) -> Option<Result<Message, CodecError>> {
        self.inbox.pop_front()
    }
}

impl WirelessControl for MockWireless {
    fn start(&mut self, settings: &WirelessSettings) {
        self.calls.push(WirelessCall::Start(settings.clone()));
    }

    fn stop(&mut self) {
        self.calls.push(WirelessCall::Stop);
    }

    fn poll_connection(&mut self, _now_ms: u32) -> Option<ConnectionState> {
        self.states.pop_front()
    }
}

#[derive(Default)]
pub struct MockPage {
    pub inbox: VecDeque<String>,
    pub sent: Vec<String>,
}

impl ConfigPageChannel for MockPage {
    fn poll(&mut self) -> Option<PageText> {
        self.inbox
            .pop_front()
            .map(|s| motionlink::osc::message::truncated(&s))
    }

    fn send(&mut self, text: &str) {
        self.sent.push(text.to_string());
    }
}

// ── Event sources and actuator ────────────────────────────────

#[derive(Default)]
pub struct MockSensors {
    pub ranges: Vec<(u8, u8)>,
    pub periods: Vec<(u32, u32)>,
    pub frames: VecDeque<SensorFrame>,
}

impl SensorPort for MockSensors {
    fn poll(&mut self, _now_ms: u32) -> Option<SensorFrame> {
        self.frames.pop_front()
    }

    fn set_ranges(&mut self, accel: u8, gyro: u8) {
        self.ranges.push((accel, gyro));
    }

    fn set_periods(&mut self, read_mag_ms: u32, output_frame_ms: u32) {
        self.periods.push((read_mag_ms, output_frame_ms));
    }
}

#[derive(Default)]
pub struct MockButton {
    pub changes: VecDeque<ButtonState>,
    pub state: ButtonState,
    pub hold_seen: Option<u32>,
}

impl ButtonPort for MockButton {
    fn poll(&mut self, _now_ms: u32, hold_ms: u32) -> Option<ButtonState> {
        self.hold_seen = Some(hold_ms);
        let next = self.changes.pop_front()?;
        self.state = next;
        Some(next)
    }

    fn state(&self) -> ButtonState {
        self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibratorCall {
    Pulse { on_ms: u32, off_ms: u32, repeat: u32 },
    Vibrate(bool),
}

#[derive(Default)]
pub struct MockVibrator {
    pub calls: Vec<VibratorCall>,
    pub on: bool,
    pub updates: u32,
}

impl VibratorPort for MockVibrator {
    fn pulse(&mut self, on_ms: u32, off_ms: u32, repeat: u32) {
        self.calls.push(VibratorCall::Pulse {
            on_ms,
            off_ms,
            repeat,
        });
        self.on = true;
    }

    fn vibrate(&mut self, on: bool) {
        self.calls.push(VibratorCall::Vibrate(on));
        self.on = on;
    }

    fn is_vibrating(&self) -> bool {
        self.on
    }

    fn update(&mut self, _now_ms: u32) {
        self.updates += 1;
    }
}

// ── Config store ──────────────────────────────────────────────

/// In-memory config store.  `fail_saves` makes every save fail.
#[derive(Default)]
pub struct MockStore {
    pub stored: Option<DeviceConfig>,
    pub saves: usize,
    pub erases: usize,
    pub fail_saves: bool,
    pub corrupted: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with(cfg: DeviceConfig) -> Self {
        Self {
            stored: Some(cfg),
            ..Self::default()
        }
    }
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        if self.corrupted {
            return Err(ConfigError::Corrupted);
        }
        Ok(self.stored.clone().unwrap_or_default())
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError> {
        if self.fail_saves {
            return Err(ConfigError::IoError);
        }
        self.stored = Some(config.clone());
        self.saves += 1;
        Ok(())
    }

    fn erase(&mut self) -> Result<(), ConfigError> {
        self.stored = None;
        self.erases += 1;
        Ok(())
    }
}

// ── Board ─────────────────────────────────────────────────────

pub struct MockBoard;

impl Board for MockBoard {
    type Wired = MockTransport;
    type Wireless = MockWireless;
    type Page = MockPage;
    type Vibrator = MockVibrator;
    type Button = MockButton;
    type Sensors = MockSensors;
}

pub fn mock_peripherals() -> Peripherals<MockBoard> {
    Peripherals {
        wired: MockTransport::default(),
        wireless: MockWireless::default(),
        page: MockPage::default(),
        vibrator: MockVibrator::default(),
        button: MockButton::default(),
        sensors: MockSensors::default(),
    }
}

/// Loose components for driving a [`Router`] directly.
#[derive(Default)]
pub struct Bench {
    pub wired: MockTransport,
    pub wireless: MockWireless,
    pub sensors: MockSensors,
    pub vibrator: MockVibrator,
}

#[allow(dead_code)]
impl Bench {
    pub fn route<C: ConfigPort>(&mut self, router: &mut Router<C>, msg: &Message) {
        let mut links = Links {
            wired: &mut self.wired,
            wireless: &mut self.wireless,
        };
        router.route_message(msg, &mut links, &mut self.sensors, &mut self.vibrator);
    }

    pub fn start<C: ConfigPort>(&mut self, router: &mut Router<C>) {
        let mut links = Links {
            wired: &mut self.wired,
            wireless: &mut self.wireless,
        };
        router.start(&mut links, &mut self.sensors);
    }

    pub fn button<C: ConfigPort>(&mut self, router: &mut Router<C>, state: ButtonState) {
        let mut links = Links {
            wired: &mut self.wired,
            wireless: &mut self.wireless,
        };
        router.on_button(state, &mut links);
    }

    pub fn frame<C: ConfigPort>(
        &mut self,
        router: &mut Router<C>,
        frame: &SensorFrame,
        button: ButtonState,
    ) {
        let vibrating = self.vibrator.is_vibrating();
        let mut links = Links {
            wired: &mut self.wired,
            wireless: &mut self.wireless,
        };
        router.on_sensor_frame(frame, button, vibrating, &mut links);
    }

    pub fn page<C: ConfigPort>(&mut self, router: &mut Router<C>, text: &str) -> Option<PageText> {
        let mut links = Links {
            wired: &mut self.wired,
            wireless: &mut self.wireless,
        };
        router.handle_config_page(text, &mut links, &mut self.sensors)
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.wired.sent.clear();
        self.wireless.calls.clear();
        self.sensors.ranges.clear();
        self.sensors.periods.clear();
        self.vibrator.calls.clear();
    }
}
