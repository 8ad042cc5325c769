//! Host-side console walkthrough against the ramp-pattern simulator.
//!
//! Composes a full device from the platform test doubles — no hardware —
//! and drives an interactive-style console session, printing the transcript.
//!
//! Run with `cargo run -p firmware --example console_session`.

use afe::{Acquisition, AfeBus};
use firmware::{ConsoleFront, DeviceTimers, FrontEnd};
use platform::mocks::{
    FixedIdentity, FixedRails, NoDelay, RecordingChipSelect, RecordingControlLines, ScriptedPort,
    ScriptedSpi,
};
use static_cell::StaticCell;

static TIMERS: StaticCell<DeviceTimers> = StaticCell::new();

type DemoError = firmware::DeviceError<
    core::convert::Infallible,
    core::convert::Infallible,
    core::convert::Infallible,
    core::convert::Infallible,
>;

fn main() -> Result<(), DemoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let timers: &'static DeviceTimers = TIMERS.init(DeviceTimers::new());
    let engine = Acquisition::new(AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new()));
    let mut device = firmware::Device::new(
        engine,
        ScriptedPort::new(),
        RecordingControlLines::new(),
        NoDelay,
        FixedIdentity::blank(0x0F),
        FixedRails::nominal(),
        FixedIdentity::blank(0x0F),
        timers,
        FrontEnd::Console(ConsoleFront::new()),
    )
    .with_simulator();

    tracing::info!("starting simulated device");
    device.start()?;

    let session = [
        "help", "ver", "diag", "rq", "sg 5,8", "rv 5", "mark 42", "chon all,1", "rc 5",
    ];
    for command in session {
        tracing::info!(command, "issuing console command");
        device.port_mut().queue_str(command);
        device.port_mut().queue(b"\r");
        device.poll()?;
        // Let the simulator pace a couple of records between commands.
        for _ in 0..4 {
            device.tick();
        }
        device.poll()?;
    }

    println!("--- transcript ---");
    println!("{}", device.port_mut().tx_string());
    tracing::info!("session complete");
    Ok(())
}
