//! The device: component wiring plus the cooperative main-loop step.
//!
//! `Device` owns every explicit component instance — acquisition engine,
//! host port, control pins, identity/diagnostic collaborators, the selected
//! front end — and borrows the shared countdown bank. `poll` is one loop
//! iteration; on hardware the outer `loop { device.poll() }` plus the two
//! interrupt bodies ([`DeviceTimers::tick_all`], [`DataReady::set`]) are
//! the whole program.

use core::sync::atomic::{AtomicBool, Ordering};

use afe::{Acquisition, BusError, ResetError};
use embedded_hal::delay::DelayNs;
use platform::config::DEVICE_NAME;
use platform::identity::{BootControl, DeviceIdentity, RailMonitor};
use platform::peripheral::{AfeSpi, ChipSelect, ControlLines, LinePort};
use protocol::console::ConsoleCtx;
use thiserror_no_std::Error;
use wifi::LinkError;

use crate::fronts::FrontEnd;
use crate::sim::SampleSimulator;
use crate::timers::DeviceTimers;

/// Errors surfaced by a device poll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError<PE, SE, CE, LE> {
    /// The host port rejected a write.
    #[error("port write failed")]
    Port(PE),
    /// A bus transaction failed.
    #[error("bus transaction failed")]
    Bus(BusError<SE, CE>),
    /// A control pin could not be driven.
    #[error("control line failed")]
    Control(LE),
}

impl<PE, SE, CE, LE> DeviceError<PE, SE, CE, LE> {
    /// Fold a radio-link error into the device error space.
    pub fn from_link(error: LinkError<PE, SE, CE>) -> Self {
        match error {
            LinkError::Port(e) => DeviceError::Port(e),
            LinkError::Bus(e) => DeviceError::Bus(e),
        }
    }

    fn from_reset(error: ResetError<SE, CE, LE>) -> Self {
        match error {
            ResetError::Bus(e) => DeviceError::Bus(e),
            ResetError::Control(e) => DeviceError::Control(e),
        }
    }
}

/// Single-bit data-ready flag set by the AFE's pin-edge interrupt.
///
/// The ISR only sets the flag; the main loop consumes it. The read side is
/// a single atomic load, so no critical section is required.
pub struct DataReady(AtomicBool);

impl DataReady {
    /// Create a cleared flag.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag (pin-edge ISR body).
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Consume the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for DataReady {
    fn default() -> Self {
        Self::new()
    }
}

/// The composed device.
pub struct Device<'a, S, C, P, L, D, I, R, B> {
    engine: Acquisition<S, C>,
    port: P,
    lines: L,
    delay: D,
    identity: I,
    rails: R,
    boot: B,
    timers: &'a DeviceTimers,
    front: FrontEnd<'a>,
    data_ready: DataReady,
    simulator: Option<SampleSimulator>,
}

impl<'a, S, C, P, L, D, I, R, B> Device<'a, S, C, P, L, D, I, R, B>
where
    S: AfeSpi,
    C: ChipSelect,
    P: LinePort,
    L: ControlLines,
    D: DelayNs,
    I: DeviceIdentity,
    R: RailMonitor,
    B: BootControl,
{
    /// Wire the components together.
    #[allow(clippy::too_many_arguments)] // the composition root names every part once
    pub fn new(
        engine: Acquisition<S, C>,
        port: P,
        lines: L,
        delay: D,
        identity: I,
        rails: R,
        boot: B,
        timers: &'a DeviceTimers,
        front: FrontEnd<'a>,
    ) -> Self {
        Self {
            engine,
            port,
            lines,
            delay,
            identity,
            rails,
            boot,
            timers,
            front,
            data_ready: DataReady::new(),
            simulator: None,
        }
    }

    /// Replace bus acquisition with the ramp-pattern simulator.
    #[must_use]
    pub fn with_simulator(mut self) -> Self {
        self.simulator = Some(SampleSimulator::new());
        self
    }

    /// Power-on bring-up: greet a console host, then reset the AFE bank,
    /// restart conversions and resynchronize the register images.
    pub fn start(&mut self) -> Result<(), DeviceError<P::Error, S::Error, C::Error, L::Error>> {
        if matches!(self.front, FrontEnd::Console(_)) {
            let mut banner: heapless::String<64> = heapless::String::new();
            use core::fmt::Write as _;
            write!(banner, "\n\r{DEVICE_NAME} Serial CLI\n\r\n\r-->").ok();
            self.port
                .write_all(banner.as_bytes())
                .map_err(DeviceError::Port)?;
        }
        if self.simulator.is_none() {
            self.engine
                .reset_and_restart(&mut self.lines, &mut self.delay)
                .map_err(DeviceError::from_reset)?;
        }
        Ok(())
    }

    /// One cooperative main-loop iteration: the acquisition-or-simulation
    /// step, then one turn of the host front end.
    pub fn poll(&mut self) -> Result<(), DeviceError<P::Error, S::Error, C::Error, L::Error>> {
        if let Some(simulator) = self.simulator.as_mut() {
            simulator.poll(&self.timers.sim, &mut self.engine);
        } else if self.data_ready.take() && self.engine.converting() {
            self.engine.acquire_cycle().map_err(DeviceError::Bus)?;
        }

        match &mut self.front {
            FrontEnd::Console(front) => {
                let mut ctx = ConsoleCtx {
                    engine: &mut self.engine,
                    lines: &mut self.lines,
                    delay: &mut self.delay,
                    identity: &mut self.identity,
                    rails: &mut self.rails,
                    boot: &mut self.boot,
                };
                front.poll(&mut self.port, &mut ctx)
            }
            FrontEnd::Packet(front) => front.poll(&mut self.port, &mut self.engine),
            FrontEnd::Wifi(front) => front.poll(&mut self.port, &mut self.engine),
        }
    }

    /// One timer tick (periodic timer ISR body).
    pub fn tick(&self) {
        self.timers.tick_all();
    }

    /// The data-ready flag (pin-edge ISR target).
    #[must_use]
    pub fn data_ready(&self) -> &DataReady {
        &self.data_ready
    }

    /// The acquisition engine (tests and bring-up).
    pub fn engine_mut(&mut self) -> &mut Acquisition<S, C> {
        &mut self.engine
    }

    /// The host port (tests and bring-up).
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// The configured front end.
    pub fn front_mut(&mut self) -> &mut FrontEnd<'a> {
        &mut self.front
    }
}
