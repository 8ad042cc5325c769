//! Sample-store overrun policy, driven through real acquisition cycles.

#![allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
#![allow(clippy::indexing_slicing)] // Tests index fixed-size fixtures

use afe::{Acquisition, AfeBus};
use firmware::{Device, DeviceTimers, FrontEnd, PacketFront};
use platform::mocks::{
    FixedIdentity, FixedRails, NoDelay, RecordingChipSelect, RecordingControlLines, ScriptedPort,
    ScriptedSpi,
};

/// Script one acquisition cycle whose first channel reads `code`.
fn script_cycle(spi: &mut ScriptedSpi, code: u32) {
    for chip in 0..4u32 {
        spi.script(&[0x00, 0, 0, 0]); // RDATA reply + status word
        for ch in 0..8u32 {
            let value = if chip == 0 && ch == 0 { code } else { 0 };
            #[allow(clippy::cast_possible_truncation)]
            spi.script(&[(value >> 16) as u8, (value >> 8) as u8, value as u8]);
        }
    }
}

#[test]
fn hundred_and_first_cycle_resets_the_consumer_to_slot_zero() {
    let timers = DeviceTimers::new();
    let engine = Acquisition::new(AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new()));
    let mut device = Device::new(
        engine,
        ScriptedPort::new(),
        RecordingControlLines::new(),
        NoDelay,
        FixedIdentity::blank(0x0F),
        FixedRails::nominal(),
        FixedIdentity::blank(0x0F),
        &timers,
        FrontEnd::Packet(PacketFront::new(&timers.serial_rx)),
    );

    device.engine_mut().start_conversions().unwrap();

    // 100 cycles with the consumer never advancing fill the ring exactly.
    for _ in 0..100 {
        device.data_ready().set();
        device.poll().unwrap();
    }
    {
        let store = device.engine_mut().store();
        assert_eq!(store.backlog(), 100);
        assert_eq!(store.consumer_index(), 0);
        assert_eq!(store.producer_index(), 0);
    }

    // The 101st cycle overruns: the unread backlog is dropped and the
    // consumer is reset to slot 0 — the slot just overwritten — rather
    // than letting the producer corrupt unread data silently.
    script_cycle(device.engine_mut().bus_mut().transport_mut(), 42);
    device.data_ready().set();
    device.poll().unwrap();

    let store = device.engine_mut().store();
    assert_eq!(store.consumer_index(), 0);
    assert_eq!(store.backlog(), 1);
    assert_eq!(store.latest().unwrap().channels[0], 42);
    assert_eq!(device.engine_mut().latest_channel_value(1).unwrap(), 42);
}

#[test]
fn data_ready_flag_gates_acquisition() {
    let timers = DeviceTimers::new();
    let engine = Acquisition::new(AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new()));
    let mut device = Device::new(
        engine,
        ScriptedPort::new(),
        RecordingControlLines::new(),
        NoDelay,
        FixedIdentity::blank(0x0F),
        FixedRails::nominal(),
        FixedIdentity::blank(0x0F),
        &timers,
        FrontEnd::Packet(PacketFront::new(&timers.serial_rx)),
    );
    device.engine_mut().start_conversions().unwrap();

    // No data-ready edge: the poll must not touch the bus.
    device.poll().unwrap();
    assert_eq!(device.engine_mut().store().backlog(), 0);

    // One edge, one cycle; the flag is consumed.
    device.data_ready().set();
    device.poll().unwrap();
    device.poll().unwrap();
    assert_eq!(device.engine_mut().store().backlog(), 1);
}
