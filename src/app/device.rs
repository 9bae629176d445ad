//! The cooperative control tick.
//!
//! [`Device::update`] polls every component once, in a fixed order:
//!
//! 1. wired transport
//! 2. wireless transport (connection changes, inbound message, config page)
//! 3. vibrator
//! 4. button
//! 5. sensors
//!
//! Whatever a poll yields is handed to the [`Router`] synchronously before
//! the next poll.  A message that changes the configuration also pushes a
//! fresh settings frame to the configuration page.  No component spawns work of its own.

use crate::osc::Message;
use crate::osc::codec::CodecError;

use super::ports::{
    ButtonPort, ConfigPageChannel, ConfigPort, OscTransport, SensorPort, VibratorPort,
    WirelessControl,
};
use super::router::{Links, Origin, Router};

/// The concrete component types of one board.
pub trait Board {
    type Wired: OscTransport;
    type Wireless: OscTransport + WirelessControl;
    type Page: ConfigPageChannel;
    type Vibrator: VibratorPort;
    type Button: ButtonPort;
    type Sensors: SensorPort;
}

/// Component instances handed to [`Device::new`].
pub struct Peripherals<B: Board> {
    pub wired: B::Wired,
    pub wireless: B::Wireless,
    pub page: B::Page,
    pub vibrator: B::Vibrator,
    pub button: B::Button,
    pub sensors: B::Sensors,
}

pub struct Device<C: ConfigPort, B: Board> {
    router: Router<C>,
    hw: Peripherals<B>,
}

impl<C: ConfigPort, B: Board> Device<C, B> {
    /// Load config, build the router and push settings to the hardware.
    pub fn new(store: C, device_id: &str, mut hw: Peripherals<B>) -> Self {
        let mut router = Router::new(store, device_id);
        router.start(
            &mut Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            },
            &mut hw.sensors,
        );
        Self { router, hw }
    }

    pub fn router(&self) -> &Router<C> {
        &self.router
    }

    pub fn peripherals(&self) -> &Peripherals<B> {
        &self.hw
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<B> {
        &mut self.hw
    }

    /// Run one tick.  `now_ms` is a monotonic millisecond clock.
    pub fn update(&mut self, now_ms: u32) {
        let router = &mut self.router;
        let hw = &mut self.hw;

        // 1. Wired transport
        if let Some(packet) = hw.wired.poll() {
            let mut links = Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            };
            dispatch(router, Origin::Wired, packet, &mut links, &mut hw.sensors, &mut hw.vibrator);
            refresh_page(router, &mut hw.page);
        }

        // 2. Wireless transport
        while let Some(state) = hw.wireless.poll_connection(now_ms) {
            router.on_connection_change(state, &mut hw.wired);
        }
        if let Some(packet) = hw.wireless.poll() {
            let mut links = Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            };
            dispatch(router, Origin::Wireless, packet, &mut links, &mut hw.sensors, &mut hw.vibrator);
            refresh_page(router, &mut hw.page);
        }
        if let Some(text) = hw.page.poll() {
            let mut links = Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            };
            if let Some(reply) = router.handle_config_page(&text, &mut links, &mut hw.sensors) {
                hw.page.send(&reply);
            }
            // The reply already carries the new settings.
            router.take_config_changed();
        }

        // 3. Vibrator
        hw.vibrator.update(now_ms);

        // 4. Button
        let hold_ms = router.config().button_hold_duration_ms;
        if let Some(state) = hw.button.poll(now_ms, hold_ms) {
            let mut links = Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            };
            router.on_button(state, &mut links);
        }

        // 5. Sensors
        if let Some(frame) = hw.sensors.poll(now_ms) {
            let button = hw.button.state();
            let vibrating = hw.vibrator.is_vibrating();
            let mut links = Links {
                wired: &mut hw.wired,
                wireless: &mut hw.wireless,
            };
            router.on_sensor_frame(&frame, button, vibrating, &mut links);
        }
    }
}

/// Push the current settings to the page after a config change.
fn refresh_page<C: ConfigPort>(router: &mut Router<C>, page: &mut impl ConfigPageChannel) {
    if router.take_config_changed() {
        page.send(&router.page_snapshot());
    }
}

fn dispatch<C, S, W>(
    router: &mut Router<C>,
    origin: Origin,
    packet: Result<Message, CodecError>,
    links: &mut Links<'_, S, W>,
    sensors: &mut impl SensorPort,
    vibrator: &mut impl VibratorPort,
) where
    C: ConfigPort,
    S: OscTransport,
    W: OscTransport + WirelessControl,
{
    match packet {
        Ok(msg) => router.route_message(&msg, links, sensors, vibrator),
        Err(e) => router.on_transport_error(origin, e),
    }
}
