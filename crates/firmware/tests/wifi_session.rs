//! Radio-link bring-up and renegotiation over a composed device.

#![allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions

use afe::{Acquisition, AfeBus};
use firmware::{Device, DeviceTimers, FrontEnd, WifiFront};
use platform::mocks::{
    FixedIdentity, FixedRails, NoDelay, RecordingChipSelect, RecordingControlLines, ScriptedPort,
    ScriptedSpi,
};
use wifi::{LinkConfig, LinkState};

type TestDevice<'a> = Device<
    'a,
    ScriptedSpi,
    RecordingChipSelect,
    ScriptedPort,
    RecordingControlLines,
    NoDelay,
    FixedIdentity,
    FixedRails,
    FixedIdentity,
>;

fn wifi_device(timers: &DeviceTimers) -> TestDevice<'_> {
    let engine = Acquisition::new(AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new()));
    Device::new(
        engine,
        ScriptedPort::new(),
        RecordingControlLines::new(),
        NoDelay,
        FixedIdentity::blank(0x0F),
        FixedRails::nominal(),
        FixedIdentity::blank(0x0F),
        timers,
        FrontEnd::Wifi(WifiFront::new(&timers.link, LinkConfig::default())),
    )
    .with_simulator()
}

fn link_state(device: &mut TestDevice<'_>) -> LinkState {
    match device.front_mut() {
        FrontEnd::Wifi(front) => front.link.state(),
        _ => unreachable!("wifi device"),
    }
}

#[test]
fn modem_responses_walk_the_negotiation_to_idle() {
    let timers = DeviceTimers::new();
    let mut device = wifi_device(&timers);

    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::WaitInit);
    let tx = device.port_mut().tx_string();
    assert!(tx.contains("AT+CWMODE=1\r\n"));
    assert!(tx.contains("AT+CIPMUX=1\r\n"));

    device.port_mut().queue_str("OK\r\n");
    device.poll().unwrap(); // line handled; classifier reports success
    device.poll().unwrap(); // Connect issues the join
    assert_eq!(link_state(&mut device), LinkState::WaitConnect);

    device.port_mut().queue_str("OK\r\n");
    device.poll().unwrap();
    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::WaitServer);

    device.port_mut().queue_str("OK\r\n");
    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::Idle);
}

#[test]
fn join_failure_line_restarts_the_negotiation() {
    let timers = DeviceTimers::new();
    let mut device = wifi_device(&timers);

    device.poll().unwrap();
    device.port_mut().queue_str("OK\r\n");
    device.poll().unwrap();
    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::WaitConnect);

    // The join reports FAIL with plenty of timeout budget remaining; the
    // machine must renegotiate from scratch on the next poll.
    assert!(!timers.link.is_expired());
    device.port_mut().queue_str("FAIL\r\n");
    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::Init);
}

#[test]
fn negotiation_timeout_restarts_from_init() {
    let timers = DeviceTimers::new();
    let mut device = wifi_device(&timers);

    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::WaitInit);

    // Drain the 5000-tick probe timeout with no modem response.
    while !timers.link.is_expired() {
        device.tick();
    }
    device.poll().unwrap();
    assert_eq!(link_state(&mut device), LinkState::Init);
}
