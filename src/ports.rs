//! Port traits: the boundary between the binding logic and the vendor SDK.
//!
//! ```text
//!   TlsNetwork / SntpSession / Timer ──▶ port trait ──▶ adapter (SimpleLink FFI | host sim)
//! ```
//!
//! The traits mirror the handful of SimpleLink calls the binding needs and
//! nothing more. Return codes are already split into the cases the
//! binding branches on (`WouldBlock`, `InProgress`, anything else), so the
//! logic above never sees raw vendor integers.

use core::fmt;
use core::net::{Ipv4Addr, SocketAddrV4};
use core::time::Duration;

use crate::sntp::calendar::DateTime;

/// Vendor socket descriptor.
pub type SocketId = i16;

// ───────────────────────────────────────────────────────────────
// Vendor status
// ───────────────────────────────────────────────────────────────

/// A failed vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorError {
    /// Non-blocking operation has nothing to do yet (`SL_EAGAIN`).
    WouldBlock,
    /// Non-blocking connect still in progress (`SL_EALREADY`).
    InProgress,
    /// Any other negative status from the SDK.
    Code(i32),
}

impl fmt::Display for VendorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WouldBlock => write!(f, "would block"),
            Self::InProgress => write!(f, "in progress"),
            Self::Code(c) => write!(f, "status {c}"),
        }
    }
}

/// Kind of socket to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// TCP stream with the vendor's TLS engine attached.
    SecureStream,
    /// Plain UDP.
    Datagram,
}

/// Socket options the binding pushes through the vendor's option mechanism.
///
/// Certificate material is referenced by file name in the device's
/// serial-flash file system; the vendor loads it during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SockOpt<'a> {
    NonBlocking(bool),
    CaFile(&'a str),
    CertificateFile(&'a str),
    PrivateKeyFile(&'a str),
    DomainNameVerification(&'a str),
    RecvTimeout(Duration),
}

// ───────────────────────────────────────────────────────────────
// Socket stack port
// ───────────────────────────────────────────────────────────────

/// The vendor socket API.
///
/// Implementations are assumed non-reentrant; the binding never calls
/// into a stack from more than one place at a time.
pub trait SocketStack {
    fn socket(&mut self, kind: SocketKind) -> Result<SocketId, VendorError>;

    fn set_option(&mut self, sock: SocketId, opt: SockOpt<'_>) -> Result<(), VendorError>;

    /// DNS lookup of `host` (IPv4 only).
    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, VendorError>;

    /// Start or continue a connect. Non-blocking sockets report
    /// [`VendorError::InProgress`] until the handshake completes.
    fn connect(&mut self, sock: SocketId, addr: SocketAddrV4) -> Result<(), VendorError>;

    fn send(&mut self, sock: SocketId, data: &[u8]) -> Result<usize, VendorError>;

    /// Returns `Ok(0)` when the peer closed the connection.
    fn recv(&mut self, sock: SocketId, buf: &mut [u8]) -> Result<usize, VendorError>;

    /// Bind to a local port (`0` = any).
    fn bind(&mut self, sock: SocketId, port: u16) -> Result<(), VendorError>;

    fn send_to(
        &mut self,
        sock: SocketId,
        data: &[u8],
        addr: SocketAddrV4,
    ) -> Result<usize, VendorError>;

    fn recv_from(
        &mut self,
        sock: SocketId,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddrV4), VendorError>;

    fn close(&mut self, sock: SocketId) -> Result<(), VendorError>;
}

/// Link-layer connectivity (WLAN associated and IP acquired).
pub trait LinkStatus {
    fn is_link_up(&self) -> bool;
}

/// The device's own date/time register.
pub trait SystemClock {
    fn set_date_time(&mut self, time: &DateTime) -> Result<(), VendorError>;
}

// ───────────────────────────────────────────────────────────────
// RTC port
// ───────────────────────────────────────────────────────────────

/// A single RTC reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RtcReading {
    pub secs: u32,
    /// Sub-second part, 0..1000.
    pub millis: u16,
}

/// The always-on RTC peripheral.
///
/// Methods take `&self`: the peripheral is a set of registers reached
/// through free functions, and timers share it by reference.
pub trait RtcPort {
    fn now(&self) -> RtcReading;

    /// Whether some other component already claimed the RTC as its
    /// time reference.
    fn in_use(&self) -> bool;

    fn mark_in_use(&self);

    fn set(&self, reading: RtcReading);
}
