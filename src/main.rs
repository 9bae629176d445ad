//! motionlink firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SerialLink<UART>   WifiLink<EspStation, StdUdp>   PageQueue │
//! │  ButtonDriver       VibratorDriver   SensorHub     NvsAdapter│
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │        Router (dispatch, fan-out, config)          │      │
//! │  └────────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  Device::update: wired → wireless → vibrator → button → IMU  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pin map (ESP32 DevKit):
//!
//! | Function | GPIO |
//! |----------|------|
//! | UART TX  | 1    |
//! | UART RX  | 3    |
//! | Button   | 0 (active low, internal pull-up) |
//! | Vibrator | 26   |
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{
    AnyIOPin, AnyInputPin, AnyOutputPin, Input, InputPin, Output, OutputPin, PinDriver, Pull,
};
use esp_idf_hal::peripherals::Peripherals as EspPeripherals;
use esp_idf_hal::uart::{self, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use motionlink::adapters::device_id;
use motionlink::adapters::nvs::NvsAdapter;
use motionlink::adapters::page::{self, PageQueue};
use motionlink::adapters::serial::SerialLink;
use motionlink::adapters::time::Clock;
use motionlink::adapters::udp::StdUdp;
use motionlink::adapters::wifi::{EspStation, WifiLink};
use motionlink::app::device::{Board, Device, Peripherals};
use motionlink::app::router::FIRMWARE_VERSION;
use motionlink::drivers::button::ButtonDriver;
use motionlink::drivers::vibrator::VibratorDriver;
use motionlink::sensors::{NullImu, SensorHub};

const SERIAL_BAUD: u32 = 115_200;

struct Esp32Board;

impl Board for Esp32Board {
    type Wired = SerialLink<UartDriver<'static>>;
    type Wireless = WifiLink<EspStation, StdUdp>;
    type Page = PageQueue;
    type Vibrator = VibratorDriver<PinDriver<'static, AnyOutputPin, Output>>;
    type Button = ButtonDriver<PinDriver<'static, AnyInputPin, Input>>;
    type Sensors = SensorHub<NullImu>;
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let id = device_id::device_id(&device_id::read_mac());
    info!("motionlink v{} ({})", FIRMWARE_VERSION, id);

    // ── 2. Peripherals ────────────────────────────────────────
    let p = EspPeripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let uart_config = uart::config::Config::default().baudrate(Hertz(SERIAL_BAUD));
    let uart = UartDriver::new(
        p.uart0,
        p.pins.gpio1,
        p.pins.gpio3,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;

    let mut button_pin = PinDriver::input(p.pins.gpio0.downgrade_input())?;
    button_pin.set_pull(Pull::Up)?;
    let vibrator_pin = PinDriver::output(p.pins.gpio26.downgrade_output())?;

    let wifi = EspWifi::new(p.modem, sysloop, None)?;

    // ── 3. Config store ───────────────────────────────────────
    let store = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::default()
        }
    };

    // ── 4. Configuration page ─────────────────────────────────
    let page = PageQueue::new();
    let _server = page::serve(&page)?;

    // ── 5. Router ─────────────────────────────────────────────
    let hw = Peripherals::<Esp32Board> {
        wired: SerialLink::new(uart),
        wireless: WifiLink::new(EspStation::new(wifi), StdUdp::new()),
        page,
        vibrator: VibratorDriver::new(vibrator_pin),
        button: ButtonDriver::new(button_pin, true),
        sensors: SensorHub::new(NullImu),
    };
    let mut device = Device::new(store, &id, hw);

    info!("System ready. Entering tick loop.");

    // ── 6. Tick loop ──────────────────────────────────────────
    let clock = Clock::new();
    loop {
        device.update(clock.now_ms());
        FreeRtos::delay_ms(1);
    }
}
