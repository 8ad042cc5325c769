//! Radio-link negotiation state machine.
//!
//! Bring-up sequence (one `poll` step per main-loop iteration):
//!
//! ```text
//! Init → WaitInit → Connect → WaitConnect → StartServer → WaitServer
//!      → Idle ⇄ SendRequest → SendData → Idle
//! ```
//!
//! Every `Wait*` state polls a response classifier fed by the asynchronous
//! line handler plus a countdown timer: `Pending` while neither the
//! expected success line nor the timer has fired, `Success` on a matching
//! response line, `Failure` on a matching error line or on timer expiry.
//! Any `Failure` observed in any wait state restarts the machine from
//! `Init` — full renegotiation, never partial retry.
//!
//! The link owns the single outbound connection exclusively; all sends
//! serialize behind its `Idle` state.

use core::fmt::Write as _;

use afe::{Acquisition, BusError, SampleRecord};
use heapless::String;
use platform::config::{DEVICE_NAME, FW_VERSION};
use platform::peripheral::{AfeSpi, ChipSelect, CsMask, LinePort};
use platform::timer::Countdown;
use thiserror_no_std::Error;

use crate::inbound::{classify_command, CommandBuffers, CommandKind};

/// Records streamed per send request.
pub const SEND_CHUNK: usize = 30;
/// Bytes per streamed record line: 8 channels × 7 hex chars, CRLF-closed.
pub const RECORD_LINE_LEN: usize = 57;
/// Channels included in a streamed record line.
const STREAM_CHANNELS: usize = 8;

/// Negotiation timeout while probing/configuring the modem, in ticks.
const INIT_TIMEOUT: u16 = 5000;
/// Timeout for joining the network, in ticks.
const CONNECT_TIMEOUT: u16 = 20000;
/// Timeout for the server start and send handshakes, in ticks.
const SEND_TIMEOUT: u16 = 1000;

/// Connection-status bit: joined to the network.
pub const STATUS_JOINED: u8 = 0x01;
/// Connection-status bit: a client is attached to the server socket.
pub const STATUS_CLIENT: u8 = 0x02;

/// Negotiation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Probe and configure the modem.
    Init,
    /// Await the configuration responses.
    WaitInit,
    /// Join the network.
    Connect,
    /// Await the join result.
    WaitConnect,
    /// Start the TCP server.
    StartServer,
    /// Await the server start result.
    WaitServer,
    /// Link up; waiting for data worth sending.
    Idle,
    /// Send-request handshake issued.
    SendRequest,
    /// Streaming one chunk of records.
    SendData,
}

/// Response classification for the wait states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Neither the expected line nor the timer has fired.
    Pending,
    /// The expected success line arrived.
    Success,
    /// An error line arrived, or the timer expired.
    Failure,
}

/// Latched result of the most recent command, fed by the line handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFlag {
    /// No command outstanding.
    Idle,
    /// Awaiting a response.
    Busy,
    /// Expected line seen.
    Ok,
    /// Error line seen.
    Error,
}

/// Network parameters for the bring-up sequence.
pub struct LinkConfig {
    /// Network SSID.
    pub ssid: &'static str,
    /// Network passphrase.
    pub password: &'static str,
    /// TCP server port.
    pub port: &'static str,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ssid: "tetra32",
            password: "tetra32",
            port: "3000",
        }
    }
}

/// Errors surfaced by the link driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError<PE, SE, CE> {
    /// The serial port rejected a write.
    #[error("port write failed")]
    Port(PE),
    /// A register operation on behalf of an inbound command failed.
    #[error("bus transaction failed")]
    Bus(BusError<SE, CE>),
}

/// The radio-link driver.
pub struct WifiLink<'a> {
    state: LinkState,
    response: ResponseFlag,
    /// `true` when the link may issue a new outbound command.
    ready: bool,
    expected: String<16>,
    timer: &'a Countdown,
    connection: u8,
    send_intro: bool,
    chunk_sent: usize,
    chunk_ok: bool,
    config: LinkConfig,
    /// Inbound double-buffered command channel.
    pub inbound: CommandBuffers,
}

impl<'a> WifiLink<'a> {
    /// Create a link driver using `timer` for its negotiation timeouts.
    pub fn new(timer: &'a Countdown, config: LinkConfig) -> Self {
        Self {
            state: LinkState::Init,
            response: ResponseFlag::Idle,
            ready: true,
            expected: String::new(),
            timer,
            connection: 0,
            send_intro: false,
            chunk_sent: 0,
            chunk_ok: false,
            config,
            inbound: CommandBuffers::new(),
        }
    }

    /// Current negotiation state.
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Connection-status bitmask ([`STATUS_JOINED`] | [`STATUS_CLIENT`]).
    #[must_use]
    pub const fn connection_status(&self) -> u8 {
        self.connection
    }

    /// Classify the outstanding command's outcome.
    #[must_use]
    pub fn classify(&self) -> Response {
        match self.response {
            ResponseFlag::Ok => Response::Success,
            _ if self.timer.is_expired() => Response::Failure,
            ResponseFlag::Error => Response::Failure,
            _ => Response::Pending,
        }
    }

    /// Handle one received line (terminators already stripped).
    ///
    /// Runs in response to the asynchronous line-received path; only sets
    /// flags and stages inbound frames, so it stays cheap.
    pub fn on_line(&mut self, line: &str) {
        if line == self.expected.as_str() {
            self.ready = true;
            self.response = ResponseFlag::Ok;
        } else if line == "ERROR" {
            self.ready = true;
            self.response = ResponseFlag::Error;
        } else if line == "WIFI DISCONNECT" {
            self.connection = 0;
        } else if line == "WIFI CONNECTED" {
            self.connection = STATUS_JOINED;
        } else if line.contains(",CONNECT") {
            self.send_intro = true;
            self.connection |= STATUS_CLIENT;
        } else if line.contains(",CLOSED") {
            self.connection &= !STATUS_CLIENT;
            self.send_intro = false;
        } else if line == "Unlink" {
            self.connection &= !STATUS_CLIENT;
        } else if line.contains("+IPD,0,") {
            self.inbound.on_ipd_line(line);
        } else if self.state == LinkState::WaitConnect && line == "FAIL" {
            // The join reports failure with FAIL rather than ERROR.
            self.ready = true;
            self.response = ResponseFlag::Error;
        }
    }

    /// Run one cooperative step of the state machine.
    #[allow(clippy::arithmetic_side_effects)] // Safety: chunk_sent < SEND_CHUNK bound
    pub fn poll<P, S, C>(
        &mut self,
        port: &mut P,
        engine: &mut Acquisition<S, C>,
    ) -> Result<(), LinkError<P::Error, S::Error, C::Error>>
    where
        P: LinePort,
        S: AfeSpi,
        C: ChipSelect,
    {
        // Interpret any completed inbound command first.
        if let Some(cmd) = self.inbound.take_ready() {
            self.handle_command(cmd.as_str(), engine, port)?;
            self.send_payload(port, "Ready\r\n")?;
        }

        match self.state {
            LinkState::Init => {
                self.connection = 0;
                self.timer.start(INIT_TIMEOUT);
                self.command(port, "AT\r\n", "OK")?;
                self.command(port, "AT+RST\r\n", "ready")?;
                self.command(port, "AT+CWMODE=1\r\n", "OK")?;
                self.command(port, "AT+CIPMUX=1\r\n", "OK")?;
                self.state = LinkState::WaitInit;
            }
            LinkState::WaitInit => match self.classify() {
                Response::Success => self.state = LinkState::Connect,
                Response::Failure => self.restart(),
                Response::Pending => {}
            },
            LinkState::Connect => {
                let mut join: String<96> = String::new();
                write!(
                    join,
                    "AT+CWJAP=\"{}\",\"{}\"\r\n",
                    self.config.ssid, self.config.password
                )
                .ok();
                self.timer.start(CONNECT_TIMEOUT);
                self.command(port, join.as_str(), "OK")?;
                self.state = LinkState::WaitConnect;
            }
            LinkState::WaitConnect => match self.classify() {
                Response::Success => {
                    self.connection |= STATUS_JOINED;
                    self.state = LinkState::StartServer;
                }
                Response::Failure => self.restart(),
                Response::Pending => {}
            },
            LinkState::StartServer => {
                let mut start: String<48> = String::new();
                write!(start, "AT+CIPSERVER=1,{}\r\n", self.config.port).ok();
                self.timer.start(SEND_TIMEOUT);
                self.command(port, start.as_str(), "OK")?;
                self.state = LinkState::WaitServer;
            }
            LinkState::WaitServer => match self.classify() {
                Response::Success => self.state = LinkState::Idle,
                Response::Failure => self.restart(),
                Response::Pending => {}
            },
            LinkState::Idle => {
                // New data plus a quiet line gate the next transmission.
                if !engine.store().is_empty() && self.ready {
                    self.state = LinkState::SendRequest;
                }
            }
            LinkState::SendRequest => {
                let mut request: String<32> = String::new();
                write!(request, "AT+CIPSEND=0,{}\r\n", SEND_CHUNK * RECORD_LINE_LEN).ok();
                self.timer.start(SEND_TIMEOUT);
                self.command(port, request.as_str(), "OK")?;
                self.chunk_sent = 0;
                self.chunk_ok = false;
                self.state = LinkState::SendData;
            }
            LinkState::SendData => {
                if !self.chunk_ok {
                    match self.classify() {
                        Response::Success => self.chunk_ok = true,
                        Response::Failure => {
                            self.restart();
                            return Ok(());
                        }
                        Response::Pending => return Ok(()),
                    }
                }
                while self.chunk_sent < SEND_CHUNK {
                    let Some(record) = engine.store_mut().pop() else {
                        // Chunk not yet full: wait for more acquisition.
                        return Ok(());
                    };
                    let line = format_stream_record(&record);
                    port.write_all(line.as_bytes()).map_err(LinkError::Port)?;
                    self.chunk_sent += 1;
                }
                // Chunk complete: await the modem's transmit confirmation
                // before going idle again.
                self.expected.clear();
                self.expected.push_str("SEND OK").ok();
                self.response = ResponseFlag::Busy;
                self.ready = false;
                self.state = LinkState::Idle;
            }
        }

        // Greet a newly attached client once.
        if self.connection & STATUS_CLIENT != 0 && self.send_intro {
            self.send_intro = false;
            let mut banner: String<64> = String::new();
            write!(banner, "{DEVICE_NAME}\r\nREV {FW_VERSION}\r\nReady\r\n").ok();
            self.send_payload(port, banner.as_str())?;
        }
        Ok(())
    }

    /// Force a full renegotiation from `Init`.
    fn restart(&mut self) {
        self.state = LinkState::Init;
        self.response = ResponseFlag::Idle;
        self.ready = true;
        self.chunk_sent = 0;
        self.chunk_ok = false;
    }

    /// Send one AT command and arm the response matcher.
    fn command<P, S, C>(
        &mut self,
        port: &mut P,
        line: &str,
        expect: &str,
    ) -> Result<(), LinkError<P::Error, S, C>>
    where
        P: LinePort,
    {
        port.write_all(line.as_bytes()).map_err(LinkError::Port)?;
        self.expected.clear();
        self.expected.push_str(expect).ok();
        self.response = ResponseFlag::Busy;
        self.ready = false;
        Ok(())
    }

    /// Send an application payload: a send-request header immediately
    /// followed by the data.
    ///
    /// Command replies and the greeting banner use this short form rather
    /// than the full handshake the sample stream uses.
    fn send_payload<P, S, C>(
        &mut self,
        port: &mut P,
        text: &str,
    ) -> Result<(), LinkError<P::Error, S, C>>
    where
        P: LinePort,
    {
        let mut header: String<32> = String::new();
        write!(header, "AT+CIPSEND=0,{}\r\n", text.len()).ok();
        port.write_all(header.as_bytes()).map_err(LinkError::Port)?;
        port.write_all(text.as_bytes()).map_err(LinkError::Port)?;
        Ok(())
    }

    /// Interpret one completed inbound application command.
    fn handle_command<P, S, C>(
        &mut self,
        cmd: &str,
        engine: &mut Acquisition<S, C>,
        port: &mut P,
    ) -> Result<(), LinkError<P::Error, S::Error, C::Error>>
    where
        P: LinePort,
        S: AfeSpi,
        C: ChipSelect,
    {
        let mut reply: String<96> = String::new();
        match classify_command(cmd) {
            CommandKind::Set { var: "debug", value } => {
                write!(reply, "DEBUG={value}\n\r").ok();
            }
            CommandKind::Set { var: "rr", value } => {
                let (reg, cs) = split_dec_pair(value);
                write!(reply, "Reg={reg:02X}\r\nCS={cs:02X}\r\n").ok();
                let data = engine
                    .read_register_raw(reg, CsMask::from_bits(cs))
                    .map_err(LinkError::Bus)?;
                write!(reply, "{data:02X}\r\n").ok();
            }
            CommandKind::Set { var: "wr", value } => {
                let (reg, rest) = split_dec_pair_str(value);
                let (val, cs) = split_dec_pair(rest);
                engine
                    .write_register_raw(reg, val, CsMask::from_bits(cs))
                    .map_err(LinkError::Bus)?;
                reply.push_str("Register Written\r\n").ok();
            }
            CommandKind::Query { var: "debug" } => {
                reply.push_str("DEBUG=ABCD\r\n").ok();
            }
            CommandKind::Execute { var: "start" } => {
                engine.start_conversions().map_err(LinkError::Bus)?;
            }
            CommandKind::Set { var, .. }
            | CommandKind::Query { var }
            | CommandKind::Execute { var } => {
                write!(reply, "ERROR:COMMAND NOT RECOGNIZED:{var}\r\n").ok();
            }
        }
        if !reply.is_empty() {
            self.send_payload(port, reply.as_str())?;
        }
        Ok(())
    }
}

/// Format one streamed record line: the first eight channels as 24-bit hex,
/// comma-separated, CRLF-terminated (57 bytes).
#[must_use]
pub fn format_stream_record(record: &SampleRecord) -> String<RECORD_LINE_LEN> {
    let mut out: String<RECORD_LINE_LEN> = String::new();
    for (i, value) in record.channels.iter().take(STREAM_CHANNELS).enumerate() {
        // Mask to the 24-bit wire width so negative codes keep the fixed
        // six-digit field.
        #[allow(clippy::cast_sign_loss)] // Safety: masked to 24 bits
        let wire = (*value as u32) & 0x00FF_FFFF;
        if i < STREAM_CHANNELS - 1 {
            write!(out, "{wire:06X},").ok();
        } else {
            write!(out, "{wire:06X}\r\n").ok();
        }
    }
    out
}

/// Split a decimal `a,b` pair, defaulting missing fields to zero.
fn split_dec_pair(value: &str) -> (u8, u8) {
    let (a, b) = match value.split_once(',') {
        Some((a, b)) => (a, b),
        None => (value, ""),
    };
    (
        a.trim().parse().unwrap_or(0),
        b.trim().parse().unwrap_or(0),
    )
}

/// Split off the first decimal field of an `a,b…` list, returning the rest.
fn split_dec_pair_str(value: &str) -> (u8, &str) {
    match value.split_once(',') {
        Some((a, rest)) => (a.trim().parse().unwrap_or(0), rest),
        None => (value.trim().parse().unwrap_or(0), ""),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests use unwrap() for readable assertions
#[allow(clippy::indexing_slicing)] // Tests index fixed-size fixtures
mod tests {
    use super::*;
    use afe::AfeBus;
    use platform::mocks::{RecordingChipSelect, ScriptedPort, ScriptedSpi};

    fn engine() -> Acquisition<ScriptedSpi, RecordingChipSelect> {
        Acquisition::new(AfeBus::new(ScriptedSpi::new(), RecordingChipSelect::new()))
    }

    #[test]
    fn bring_up_walks_the_happy_path() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();

        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::WaitInit);
        let tx = port.tx_string();
        assert!(tx.contains("AT+RST\r\n"));
        assert!(tx.contains("AT+CWMODE=1\r\n"));
        assert!(tx.contains("AT+CIPMUX=1\r\n"));

        link.on_line("OK");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Connect);

        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::WaitConnect);
        assert!(port
            .tx_string()
            .contains("AT+CWJAP=\"tetra32\",\"tetra32\"\r\n"));

        link.on_line("OK");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::StartServer);
        assert_eq!(link.connection_status() & STATUS_JOINED, STATUS_JOINED);

        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::WaitServer);
        assert!(port.tx_string().contains("AT+CIPSERVER=1,3000\r\n"));

        link.on_line("OK");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Idle);
    }

    #[test]
    fn wait_connect_failure_line_restarts_from_init() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();

        // Drive to WaitConnect.
        link.poll(&mut port, &mut engine).unwrap();
        link.on_line("OK");
        link.poll(&mut port, &mut engine).unwrap();
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::WaitConnect);

        // Plenty of timeout budget left; the FAIL line alone must restart.
        assert!(!timer.is_expired());
        link.on_line("FAIL");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Init);
    }

    #[test]
    fn wait_state_timeout_restarts_from_init() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();

        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::WaitInit);

        timer.cancel(); // countdown has run out
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Init);
    }

    fn bring_up(
        link: &mut WifiLink<'_>,
        port: &mut ScriptedPort,
        engine: &mut Acquisition<ScriptedSpi, RecordingChipSelect>,
    ) {
        link.poll(port, engine).unwrap();
        link.on_line("OK");
        link.poll(port, engine).unwrap();
        link.poll(port, engine).unwrap();
        link.on_line("OK");
        link.poll(port, engine).unwrap();
        link.poll(port, engine).unwrap();
        link.on_line("OK");
        link.poll(port, engine).unwrap();
        assert_eq!(link.state(), LinkState::Idle);
    }

    #[test]
    fn idle_sends_only_when_backlog_exists() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();
        bring_up(&mut link, &mut port, &mut engine);

        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Idle, "no data, no send");

        engine.push_simulated(SampleRecord::EMPTY);
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::SendRequest);
    }

    #[test]
    fn send_data_streams_a_full_chunk_then_awaits_send_ok() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();
        bring_up(&mut link, &mut port, &mut engine);

        for i in 0..SEND_CHUNK {
            let mut record = SampleRecord::EMPTY;
            record.channels[0] = i as i32;
            engine.push_simulated(record);
        }

        link.poll(&mut port, &mut engine).unwrap(); // Idle → SendRequest
        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap(); // issue AT+CIPSEND
        assert_eq!(link.state(), LinkState::SendData);
        assert!(port
            .tx_string()
            .contains(&format!("AT+CIPSEND=0,{}", SEND_CHUNK * RECORD_LINE_LEN)));

        port.clear_tx();
        link.on_line("OK");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Idle);
        let tx = port.tx_string();
        assert_eq!(tx.len(), SEND_CHUNK * RECORD_LINE_LEN);
        assert!(tx.starts_with("000000,"));
        assert!(engine.store().is_empty());

        // The link stays quiet until the modem confirms the transmission.
        engine.push_simulated(SampleRecord::EMPTY);
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::Idle);
        link.on_line("SEND OK");
        link.poll(&mut port, &mut engine).unwrap();
        assert_eq!(link.state(), LinkState::SendRequest);
    }

    #[test]
    fn stream_record_lines_are_fixed_width() {
        let mut record = SampleRecord::EMPTY;
        record.channels[0] = -1; // sign-extended code
        record.channels[7] = 0x123456;
        let line = format_stream_record(&record);
        assert_eq!(line.len(), RECORD_LINE_LEN);
        assert!(line.starts_with("FFFFFF,"));
        assert!(line.ends_with("123456\r\n"));
    }

    #[test]
    fn client_attach_triggers_the_banner_once() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();
        bring_up(&mut link, &mut port, &mut engine);

        port.clear_tx();
        link.on_line("0,CONNECT");
        link.poll(&mut port, &mut engine).unwrap();
        let tx = port.tx_string();
        assert!(tx.contains(DEVICE_NAME));
        assert!(tx.contains("Ready\r\n"));

        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap();
        assert!(port.tx_string().is_empty(), "banner must not repeat");
    }

    #[test]
    fn inbound_start_command_starts_conversions() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();
        bring_up(&mut link, &mut port, &mut engine);

        link.on_line("+IPD,0,6:start\r");
        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap();
        assert!(engine.converting());
        assert!(port.tx_string().contains("Ready\r\n"));
    }

    #[test]
    fn inbound_unknown_command_reports_an_error() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        let mut port = ScriptedPort::new();
        let mut engine = engine();
        bring_up(&mut link, &mut port, &mut engine);

        link.on_line("+IPD,0,5:bogus\r");
        port.clear_tx();
        link.poll(&mut port, &mut engine).unwrap();
        assert!(port
            .tx_string()
            .contains("ERROR:COMMAND NOT RECOGNIZED:bogus"));
    }

    #[test]
    fn disconnect_lines_update_the_status_mask() {
        let timer = Countdown::new();
        let mut link = WifiLink::new(&timer, LinkConfig::default());
        link.on_line("WIFI CONNECTED");
        assert_eq!(link.connection_status(), STATUS_JOINED);
        link.on_line("0,CONNECT");
        assert_eq!(link.connection_status(), STATUS_JOINED | STATUS_CLIENT);
        link.on_line("0,CLOSED");
        assert_eq!(link.connection_status(), STATUS_JOINED);
        link.on_line("WIFI DISCONNECT");
        assert_eq!(link.connection_status(), 0);
    }
}
