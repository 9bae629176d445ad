//! Integration tests for the control tick: poll order and end-to-end
//! delivery from an inbound packet to every outbound effect.

use super::mock_hw::{MockBoard, MockStore, VibratorCall, WirelessCall, mock_peripherals};

use motionlink::app::device::Device;
use motionlink::app::events::{ButtonState, ConnectionState, SensorFrame};
use motionlink::config::DeviceConfig;
use motionlink::osc::codec::CodecError;
use motionlink::osc::Message;

fn boot(cfg: DeviceConfig) -> Device<MockStore, MockBoard> {
    Device::new(MockStore::with(cfg), "ml-000001", mock_peripherals())
}

fn frame() -> SensorFrame {
    SensorFrame::new([0.0, 0.0, 1.0], [0.0; 3], [0.5; 3])
}

#[test]
fn boot_then_range_set_reaches_driver_store_and_both_links() {
    let mut dev = boot(DeviceConfig::default());
    assert_eq!(dev.peripherals().sensors.ranges, vec![(0, 0)]);

    dev.peripherals_mut()
        .wired
        .queue(Message::new("/ml-000001/range/set").with(2).with(1));
    dev.update(0);

    let hw = dev.peripherals();
    assert_eq!(hw.sensors.ranges.last(), Some(&(2, 1)));
    let stored = dev.router().store().stored.as_ref().unwrap();
    assert_eq!((stored.accel_range, stored.gyro_range), (2, 1));

    let wired = hw.wired.sent_to("/ml-000001/range-ack");
    assert_eq!(wired.len(), 1);
    assert_eq!((wired[0].int(0), wired[0].int(1)), (Some(2), Some(1)));
    assert_eq!(
        hw.wireless
            .sent()
            .iter()
            .filter(|m| m.address() == "/ml-000001/range-ack")
            .count(),
        1
    );
}

#[test]
fn wired_is_handled_before_wireless() {
    let mut dev = boot(DeviceConfig::default());
    let hw = dev.peripherals_mut();
    hw.wired.queue(Message::new("/ml-000001/range/get"));
    hw.wireless
        .queue(Message::new("/ml-000001/range/set").with(3).with(3));
    dev.update(0);

    let acks = dev.peripherals().wired.sent_to("/ml-000001/range-ack");
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0].int(0), Some(0));
    assert_eq!(acks[1].int(0), Some(3));
}

#[test]
fn one_packet_per_transport_per_tick() {
    let mut dev = boot(DeviceConfig::default());
    let hw = dev.peripherals_mut();
    hw.wired.queue(Message::new("/ml-000001/ports/get"));
    hw.wired.queue(Message::new("/ml-000001/ports/get"));
    dev.update(0);
    assert_eq!(dev.peripherals().wired.sent.len(), 1);
    dev.update(1);
    assert_eq!(dev.peripherals().wired.sent.len(), 2);
}

#[test]
fn vibrator_state_is_current_when_frame_is_built() {
    let mut dev = boot(DeviceConfig::default());
    let hw = dev.peripherals_mut();
    hw.wired.queue(Message::new("/ml-000001/vibro/now").with(1));
    hw.sensors.frames.push_back(frame());
    dev.update(0);

    let hw = dev.peripherals();
    assert_eq!(hw.vibrator.calls, vec![VibratorCall::Vibrate(true)]);
    assert_eq!(hw.vibrator.updates, 1);
    let frames = hw.wired.sent_to("/ml-000001/frame");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].int(10), Some(1));
}

#[test]
fn button_and_frame_in_one_tick_fold_into_frame() {
    let mut dev = boot(DeviceConfig::default());
    let hw = dev.peripherals_mut();
    hw.button.changes.push_back(ButtonState::Pressed);
    hw.sensors.frames.push_back(frame());
    dev.update(0);

    let hw = dev.peripherals();
    assert!(hw.wired.sent_to("/ml-000001/button").is_empty());
    let frames = hw.wired.sent_to("/ml-000001/frame");
    assert_eq!(frames[0].int(9), Some(ButtonState::Pressed.wire_value()));
}

#[test]
fn config_change_applies_within_the_same_tick() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut().wired.queue(
        Message::new("/ml-000001/config/set")
            .with(1)
            .with(1)
            .with(10)
            .with(10)
            .with(1234),
    );
    dev.update(0);
    assert_eq!(dev.peripherals().button.hold_seen, Some(1234));
}

#[test]
fn connection_change_reported_on_wired_only() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut()
        .wireless
        .states
        .push_back(ConnectionState::Connecting);
    let before = dev.peripherals().wireless.calls.len();
    dev.update(0);

    let hw = dev.peripherals();
    let states = hw.wired.sent_to("/ml-000001/wifi/state");
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].int(0), Some(2));
    assert_eq!(hw.wireless.calls.len(), before);
}

#[test]
fn undecodable_packets_are_dropped_silently() {
    let mut dev = boot(DeviceConfig::default());
    let hw = dev.peripherals_mut();
    hw.wired.inbox.push_back(Err(CodecError::Truncated));
    hw.wireless.inbox.push_back(Err(CodecError::Bundle));
    dev.update(0);
    assert!(dev.peripherals().wired.sent.is_empty());
    assert_eq!(dev.router().store().saves, 0);
}

#[test]
fn page_frames_get_a_reply_on_the_page() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut().page.inbox.push_back("hello\n".to_string());
    dev.update(0);
    let sent = &dev.peripherals().page.sent;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("settings\n"));
}

#[test]
fn wifi_disabled_at_boot_still_calls_start_with_flag() {
    let cfg = DeviceConfig {
        use_wifi: false,
        ..DeviceConfig::default()
    };
    let dev = boot(cfg);
    let starts = dev.peripherals().wireless.starts();
    assert_eq!(starts.len(), 1);
    assert!(!starts[0].enabled);
    assert!(
        !dev.peripherals()
            .wireless
            .calls
            .iter()
            .any(|c| matches!(c, WirelessCall::Send(_)))
    );
}

#[test]
fn every_connection_change_in_a_tick_is_reported_in_order() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut().wireless.states.extend([
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
    ]);
    dev.update(0);

    let states: Vec<_> = dev
        .peripherals()
        .wired
        .sent_to("/ml-000001/wifi/state")
        .iter()
        .map(|m| m.int(0))
        .collect();
    assert_eq!(states, vec![Some(0), Some(2), Some(1)]);
}

#[test]
fn osc_config_changes_refresh_the_page() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut().page.inbox.push_back("Connect".to_string());
    dev.update(0);
    assert_eq!(dev.peripherals().page.sent.len(), 1);

    // Queries leave the page alone.
    dev.peripherals_mut()
        .wired
        .queue(Message::new("/ml-000001/ports/get"));
    dev.update(1);
    assert_eq!(dev.peripherals().page.sent.len(), 1);

    dev.peripherals_mut()
        .wired
        .queue(Message::new("/ml-000001/ports/set").with(9000).with(9001));
    dev.update(2);
    let sent = &dev.peripherals().page.sent;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].starts_with("settings\n"));
    assert!(sent[1].contains("\n9000\n9001\n"));

    dev.peripherals_mut()
        .wireless
        .queue(Message::new("/ml-000001/range/set").with(2).with(1));
    dev.update(3);
    assert_eq!(dev.peripherals().page.sent.len(), 3);
}

#[test]
fn page_update_sends_a_single_reply() {
    let mut dev = boot(DeviceConfig::default());
    dev.peripherals_mut().page.inbox.push_back("clear\n".to_string());
    dev.update(0);
    assert_eq!(dev.peripherals().page.sent.len(), 1);
    dev.update(1);
    assert_eq!(dev.peripherals().page.sent.len(), 1);
}
