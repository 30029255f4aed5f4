//! Scripted vendor stack for integration tests.
//!
//! Records every vendor call so tests can assert on the exact call
//! sequence, and replays scripted results for the calls the binding
//! branches on. The call log is shared through an `Rc` so it stays
//! readable after the stack has been moved into (or dropped with) a
//! `TlsNetwork`.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use simplelink_iot::ports::{
    LinkStatus, RtcPort, RtcReading, SockOpt, SocketId, SocketKind, SocketStack, SystemClock,
    VendorError,
};
use simplelink_iot::sntp::calendar::DateTime;
use simplelink_iot::timer::Countdown;

// ── Call record ───────────────────────────────────────────────

/// Owned copy of a [`SockOpt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opt {
    NonBlocking(bool),
    CaFile(String),
    CertificateFile(String),
    PrivateKeyFile(String),
    DomainNameVerification(String),
    RecvTimeout(Duration),
}

/// Option kinds, for scripting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptKind {
    NonBlocking,
    CaFile,
    CertificateFile,
    PrivateKeyFile,
    DomainNameVerification,
    RecvTimeout,
}

impl Opt {
    fn from_sock_opt(opt: SockOpt<'_>) -> Self {
        match opt {
            SockOpt::NonBlocking(on) => Self::NonBlocking(on),
            SockOpt::CaFile(s) => Self::CaFile(s.to_owned()),
            SockOpt::CertificateFile(s) => Self::CertificateFile(s.to_owned()),
            SockOpt::PrivateKeyFile(s) => Self::PrivateKeyFile(s.to_owned()),
            SockOpt::DomainNameVerification(s) => Self::DomainNameVerification(s.to_owned()),
            SockOpt::RecvTimeout(t) => Self::RecvTimeout(t),
        }
    }

    pub fn kind(&self) -> OptKind {
        match self {
            Self::NonBlocking(_) => OptKind::NonBlocking,
            Self::CaFile(_) => OptKind::CaFile,
            Self::CertificateFile(_) => OptKind::CertificateFile,
            Self::PrivateKeyFile(_) => OptKind::PrivateKeyFile,
            Self::DomainNameVerification(_) => OptKind::DomainNameVerification,
            Self::RecvTimeout(_) => OptKind::RecvTimeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Socket(SocketKind),
    SetOption(SocketId, Opt),
    Resolve(String),
    Connect(SocketId, SocketAddrV4),
    Send(SocketId, usize),
    Recv(SocketId, usize),
    Bind(SocketId, u16),
    SendTo(SocketId, Vec<u8>, SocketAddrV4),
    RecvFrom(SocketId),
    Close(SocketId),
    SetDateTime(DateTime),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

// ── MockStack ─────────────────────────────────────────────────

pub const FIRST_SOCKET: SocketId = 3;
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);

pub struct MockStack {
    log: CallLog,
    next_socket: SocketId,
    pub socket_error: Option<VendorError>,
    pub option_errors: HashMap<OptKind, VendorError>,
    /// Per-host DNS results; unknown hosts resolve to [`DEFAULT_IP`].
    pub dns: HashMap<String, Result<Ipv4Addr, VendorError>>,
    pub connect_script: VecDeque<Result<(), VendorError>>,
    /// Used once `connect_script` runs dry.
    pub connect_default: Result<(), VendorError>,
    pub send_script: VecDeque<Result<usize, VendorError>>,
    /// Used once `send_script` runs dry; `None` accepts everything.
    pub send_default: Option<Result<usize, VendorError>>,
    /// Replies for `recv`; an empty queue reports `WouldBlock`.
    pub recv_script: VecDeque<Result<Vec<u8>, VendorError>>,
    pub bind_result: Result<(), VendorError>,
    pub send_to_script: VecDeque<Result<usize, VendorError>>,
    /// Replies for `recv_from`; an empty queue reports `WouldBlock`.
    pub recv_from_script: VecDeque<Result<Vec<u8>, VendorError>>,
    pub set_time_script: VecDeque<Result<(), VendorError>>,
    pub link_up: bool,
    pub device_time: Option<DateTime>,
}

#[allow(dead_code)]
impl MockStack {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            next_socket: FIRST_SOCKET,
            socket_error: None,
            option_errors: HashMap::new(),
            dns: HashMap::new(),
            connect_script: VecDeque::new(),
            connect_default: Ok(()),
            send_script: VecDeque::new(),
            send_default: None,
            recv_script: VecDeque::new(),
            bind_result: Ok(()),
            send_to_script: VecDeque::new(),
            recv_from_script: VecDeque::new(),
            set_time_script: VecDeque::new(),
            link_up: true,
            device_time: None,
        }
    }

    /// Handle on the call log that outlives the stack.
    pub fn log(&self) -> CallLog {
        Rc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn fail_option(&mut self, kind: OptKind, err: VendorError) {
        self.option_errors.insert(kind, err);
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Default for MockStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketStack for MockStack {
    fn socket(&mut self, kind: SocketKind) -> Result<SocketId, VendorError> {
        self.record(Call::Socket(kind));
        if let Some(e) = self.socket_error {
            return Err(e);
        }
        let id = self.next_socket;
        self.next_socket += 1;
        Ok(id)
    }

    fn set_option(&mut self, sock: SocketId, opt: SockOpt<'_>) -> Result<(), VendorError> {
        let opt = Opt::from_sock_opt(opt);
        let kind = opt.kind();
        self.record(Call::SetOption(sock, opt));
        match self.option_errors.get(&kind) {
            Some(e) => Err(*e),
            None => Ok(()),
        }
    }

    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, VendorError> {
        self.record(Call::Resolve(host.to_owned()));
        self.dns.get(host).copied().unwrap_or(Ok(DEFAULT_IP))
    }

    fn connect(&mut self, sock: SocketId, addr: SocketAddrV4) -> Result<(), VendorError> {
        self.record(Call::Connect(sock, addr));
        self.connect_script
            .pop_front()
            .unwrap_or(self.connect_default)
    }

    fn send(&mut self, sock: SocketId, data: &[u8]) -> Result<usize, VendorError> {
        self.record(Call::Send(sock, data.len()));
        self.send_script
            .pop_front()
            .or(self.send_default)
            .unwrap_or(Ok(data.len()))
    }

    fn recv(&mut self, sock: SocketId, buf: &mut [u8]) -> Result<usize, VendorError> {
        self.record(Call::Recv(sock, buf.len()));
        match self.recv_script.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Err(VendorError::WouldBlock),
        }
    }

    fn bind(&mut self, sock: SocketId, port: u16) -> Result<(), VendorError> {
        self.record(Call::Bind(sock, port));
        self.bind_result
    }

    fn send_to(
        &mut self,
        sock: SocketId,
        data: &[u8],
        addr: SocketAddrV4,
    ) -> Result<usize, VendorError> {
        self.record(Call::SendTo(sock, data.to_vec(), addr));
        self.send_to_script.pop_front().unwrap_or(Ok(data.len()))
    }

    fn recv_from(
        &mut self,
        sock: SocketId,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddrV4), VendorError> {
        self.record(Call::RecvFrom(sock));
        match self.recv_from_script.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok((n, SocketAddrV4::new(DEFAULT_IP, 123)))
            }
            Some(Err(e)) => Err(e),
            None => Err(VendorError::WouldBlock),
        }
    }

    fn close(&mut self, sock: SocketId) -> Result<(), VendorError> {
        self.record(Call::Close(sock));
        Ok(())
    }
}

impl LinkStatus for MockStack {
    fn is_link_up(&self) -> bool {
        self.link_up
    }
}

impl SystemClock for MockStack {
    fn set_date_time(&mut self, time: &DateTime) -> Result<(), VendorError> {
        self.record(Call::SetDateTime(*time));
        let result = self.set_time_script.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.device_time = Some(*time);
        }
        result
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Delay that returns immediately and totals the requested time.
#[derive(Clone, Default)]
pub struct CountingDelay {
    total_ms: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl CountingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that keeps reporting after the delay is moved away.
    pub fn total(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.total_ms)
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms
            .set(self.total_ms.get() + u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms.set(self.total_ms.get() + u64::from(ms));
    }
}

// ── Countdown / RTC ───────────────────────────────────────────

/// Countdown that always reports a fixed remaining time.
pub struct FixedCountdown {
    pub left: u32,
}

impl Countdown for FixedCountdown {
    fn countdown_ms(&mut self, ms: u32) {
        self.left = ms;
    }

    fn left_ms(&mut self) -> u32 {
        self.left
    }
}

/// RTC the test moves by hand.
#[derive(Default)]
pub struct ManualRtc {
    now: Cell<RtcReading>,
    in_use: Cell<bool>,
    pub sets: Cell<u32>,
}

#[allow(dead_code)]
impl ManualRtc {
    pub fn at(secs: u32, millis: u16) -> Self {
        let rtc = Self::default();
        rtc.now.set(RtcReading { secs, millis });
        rtc
    }

    pub fn claimed(self) -> Self {
        self.in_use.set(true);
        self
    }

    pub fn advance_ms(&self, ms: u32) {
        let now = self.now.get();
        let total = u64::from(now.secs) * 1000 + u64::from(now.millis) + u64::from(ms);
        self.now.set(RtcReading {
            secs: (total / 1000) as u32,
            millis: (total % 1000) as u16,
        });
    }

    pub fn jump_to(&self, secs: u32, millis: u16) {
        self.now.set(RtcReading { secs, millis });
    }
}

impl RtcPort for ManualRtc {
    fn now(&self) -> RtcReading {
        self.now.get()
    }

    fn in_use(&self) -> bool {
        self.in_use.get()
    }

    fn mark_in_use(&self) {
        self.in_use.set(true);
    }

    fn set(&self, reading: RtcReading) {
        self.sets.set(self.sets.get() + 1);
        self.now.set(reading);
    }
}
