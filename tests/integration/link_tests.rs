//! Full-stack host test: real framing, wireless state machine, drivers,
//! sensor scheduling and NVS simulation behind the control tick.  Only
//! the byte pipes, the UDP socket and the GPIO pins are fakes.

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use motionlink::adapters::nvs::NvsAdapter;
use motionlink::adapters::serial::{ByteLink, SerialLink};
use motionlink::adapters::wifi::{Datagram, SimStation, WifiLink};
use motionlink::app::device::{Board, Device, Peripherals};
use motionlink::app::ports::{ConfigPort, NoConfigPage};
use motionlink::config::DeviceConfig;
use motionlink::drivers::button::{ButtonDriver, DEBOUNCE_MS};
use motionlink::drivers::vibrator::VibratorDriver;
use motionlink::osc::codec::{self, MAX_PACKET_LEN};
use motionlink::osc::slip::{self, MAX_ENCODED_LEN, SlipDecoder};
use motionlink::osc::Message;
use motionlink::sensors::{NullImu, SensorHub};

// ── Fakes ─────────────────────────────────────────────────────

#[derive(Default)]
struct Pipe {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl ByteLink for Pipe {
    type Error = Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let n = buf.len().min(self.rx.len());
        for slot in &mut buf[..n] {
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Default)]
struct Air {
    bound: Option<u16>,
    inbox: VecDeque<Vec<u8>>,
    sent: Vec<(Vec<u8>, u16)>,
}

impl Datagram for Air {
    type Error = Infallible;

    fn bind(&mut self, port: u16) -> Result<(), Infallible> {
        self.bound = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.bound = None;
    }

    fn send_to(&mut self, data: &[u8], _host: &str, port: u16) -> Result<(), Infallible> {
        self.sent.push((data.to_vec(), port));
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let Some(d) = self.inbox.pop_front() else {
            return Ok(0);
        };
        buf[..d.len()].copy_from_slice(&d);
        Ok(d.len())
    }
}

#[derive(Default)]
struct Pin {
    high: bool,
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

struct HostBoard;

impl Board for HostBoard {
    type Wired = SerialLink<Pipe>;
    type Wireless = WifiLink<SimStation, Air>;
    type Page = NoConfigPage;
    type Vibrator = VibratorDriver<Pin>;
    type Button = ButtonDriver<Pin>;
    type Sensors = SensorHub<NullImu>;
}

const ID: &str = "ml-efcafe";

fn boot(cfg: DeviceConfig) -> Device<NvsAdapter, HostBoard> {
    let mut store = NvsAdapter::new().unwrap();
    store.save(&cfg).unwrap();
    let hw = Peripherals::<HostBoard> {
        wired: SerialLink::new(Pipe::default()),
        wireless: WifiLink::new(SimStation::new(true), Air::default()),
        page: NoConfigPage,
        vibrator: VibratorDriver::new(Pin::default()),
        // Active-low button, idle high.
        button: ButtonDriver::new(Pin { high: true }, true),
        sensors: SensorHub::new(NullImu),
    };
    Device::new(store, ID, hw)
}

fn wifi_config() -> DeviceConfig {
    let mut cfg = DeviceConfig::default();
    cfg.set_ssid("studio");
    cfg.set_password("hunter22");
    cfg
}

fn slip_frame(msg: &Message) -> Vec<u8> {
    let mut packet = [0u8; MAX_PACKET_LEN];
    let len = codec::encode(msg, &mut packet).unwrap();
    let mut frame = [0u8; MAX_ENCODED_LEN];
    let n = slip::encode(&packet[..len], &mut frame).unwrap();
    frame[..n].to_vec()
}

fn drain_wired(dev: &mut Device<NvsAdapter, HostBoard>) -> Vec<Message> {
    let bytes = std::mem::take(&mut dev.peripherals_mut().wired.link_mut().tx);
    let mut decoder = SlipDecoder::new();
    bytes
        .into_iter()
        .filter_map(|b| decoder.push(b).map(|f| codec::decode(f).unwrap()))
        .collect()
}

fn wifi_states(out: Vec<Message>) -> Vec<i32> {
    out.iter()
        .filter(|m| m.address() == "/ml-efcafe/wifi/state")
        .filter_map(|m| m.int(0))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn serial_command_round_trip() {
    let mut cfg = DeviceConfig::default();
    cfg.send_single_frame = false;
    cfg.output_frame_period_ms = 1_000_000;
    let mut dev = boot(cfg);
    // First tick emits the initial sensor batch.
    dev.update(0);
    drain_wired(&mut dev);

    let cmd = slip_frame(&Message::new("/ml-efcafe/ports/set").with(9000).with(9001));
    dev.peripherals_mut().wired.link_mut().rx.extend(cmd);
    dev.update(1);

    let out = drain_wired(&mut dev);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].address(), "/ml-efcafe/ports-ack");
    assert_eq!((out[0].int(0), out[0].int(1)), (Some(9000), Some(9001)));
    assert_eq!(dev.router().store().load().unwrap().input_port, 9000);
}

#[test]
fn wifi_comes_up_and_carries_telemetry() {
    let mut dev = boot(wifi_config());
    dev.update(0);

    assert_eq!(wifi_states(drain_wired(&mut dev)), vec![2, 1]);
    assert_eq!(dev.peripherals().wireless.socket().bound, Some(7400));

    dev.update(20);
    let air = &dev.peripherals().wireless.socket().sent;
    let (bytes, port) = air.last().unwrap();
    assert_eq!(*port, 7401);
    let msg = codec::decode(bytes).unwrap();
    assert_eq!(msg.address(), "/ml-efcafe/frame");
    assert_eq!(msg.len(), 11);
}

#[test]
fn wifi_set_restart_is_visible_on_the_wired_link() {
    let mut dev = boot(wifi_config());
    dev.update(0);
    drain_wired(&mut dev);

    let cmd = slip_frame(
        &Message::new("/ml-efcafe/wifi/set")
            .with("studio")
            .with("hunter22")
            .with("192.168.0.50"),
    );
    dev.peripherals_mut().wired.link_mut().rx.extend(cmd);
    dev.update(1);
    dev.update(2);

    assert_eq!(wifi_states(drain_wired(&mut dev)), vec![0, 2, 1]);
    assert_eq!(dev.peripherals().wireless.station().joins(), 2);
}

#[test]
fn udp_command_updates_config_and_acks_on_both_links() {
    let mut dev = boot(wifi_config());
    dev.update(0);
    drain_wired(&mut dev);

    let mut packet = [0u8; MAX_PACKET_LEN];
    let n = codec::encode(
        &Message::new("/ml-efcafe/range/set").with(1).with(2),
        &mut packet,
    )
    .unwrap();
    let wireless = &mut dev.peripherals_mut().wireless;
    wireless.socket_mut().sent.clear();
    wireless.socket_mut().inbox.push_back(packet[..n].to_vec());
    dev.update(1);

    let wired = drain_wired(&mut dev);
    assert!(wired.iter().any(|m| m.address() == "/ml-efcafe/range-ack"));
    let air: Vec<_> = dev
        .peripherals()
        .wireless
        .socket()
        .sent
        .iter()
        .map(|(b, _)| codec::decode(b).unwrap())
        .collect();
    assert!(air.iter().any(|m| m.address() == "/ml-efcafe/range-ack"));
    assert_eq!(dev.router().config().gyro_range, 2);
}

#[test]
fn button_press_and_hold_in_split_mode() {
    let mut cfg = DeviceConfig::default();
    cfg.send_single_frame = false;
    cfg.output_frame_period_ms = 1_000_000;
    cfg.button_hold_duration_ms = 200;
    let mut dev = boot(cfg);
    dev.update(0);
    drain_wired(&mut dev);

    dev.peripherals_mut().button.pin_mut().high = false;
    dev.update(10);
    dev.update(10 + DEBOUNCE_MS);
    dev.update(10 + DEBOUNCE_MS + 200);

    let states: Vec<_> = drain_wired(&mut dev)
        .into_iter()
        .filter(|m| m.address() == "/ml-efcafe/button")
        .map(|m| m.int(0))
        .collect();
    assert_eq!(states, vec![Some(1), Some(2)]);
}

#[test]
fn vibro_pulse_drives_the_pin() {
    let mut cfg = DeviceConfig::default();
    cfg.output_frame_period_ms = 1_000_000;
    let mut dev = boot(cfg);
    dev.update(0);

    let cmd = slip_frame(&Message::new("/ml-efcafe/vibro/pulse").with(50).with(50).with(1));
    dev.peripherals_mut().wired.link_mut().rx.extend(cmd);
    dev.update(100);
    assert!(dev.peripherals().vibrator.pin().high);
    dev.update(150);
    assert!(!dev.peripherals().vibrator.pin().high);
}
