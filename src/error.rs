//! Unified error types for the SimpleLink binding.
//!
//! A single `Error` enum that both units convert into, so the demo binary
//! and any owning IoT client handle failures uniformly. All variants are
//! `Copy`; status codes travel by value, never by allocation.

use core::fmt;

use crate::ports::VendorError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The TLS network binding failed.
    Network(NetworkError),
    /// Time synchronisation failed.
    Sntp(SntpError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Sntp(e) => write!(f, "sntp: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Network binding status codes
// ---------------------------------------------------------------------------

/// Status codes returned by [`Network`](crate::network::Network) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// No live socket handle, the binding has been destroyed, or an empty
    /// buffer was passed to `read`/`write`.
    NullValue,
    /// The vendor refused to create a secure socket.
    SocketFailed,
    /// A secure-socket option (non-blocking, CA, certificate, key) was rejected.
    SslInit,
    /// Domain verification could not be configured, or DNS lookup failed.
    UnknownHost,
    /// Connect failed or did not complete within the socket timeout.
    ConnectFailed,
    /// Send failed or stayed blocked past the socket timeout.
    SslWrite,
    /// Receive failed hard (error, peer closed, timeout option rejected).
    SslRead,
    /// Nothing was available to read within the caller's time budget.
    NothingToRead,
}

impl NetworkError {
    /// `true` for outcomes a caller should simply retry later.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::NothingToRead)
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullValue => write!(f, "null value (no socket handle)"),
            Self::SocketFailed => write!(f, "secure socket creation failed"),
            Self::SslInit => write!(f, "secure socket configuration failed"),
            Self::UnknownHost => write!(f, "unknown host"),
            Self::ConnectFailed => write!(f, "connect failed or timed out"),
            Self::SslWrite => write!(f, "write failed"),
            Self::SslRead => write!(f, "read failed"),
            Self::NothingToRead => write!(f, "nothing to read"),
        }
    }
}

impl core::error::Error for NetworkError {}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// SNTP errors
// ---------------------------------------------------------------------------

/// Per-server and overall SNTP failures.
///
/// Everything except [`SntpError::Socket`] and
/// [`SntpError::AllServersFailed`] is handled inside the server loop by
/// moving on to the next server; those variants only surface in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    /// The UDP socket could not be created.
    Socket(VendorError),
    /// DNS lookup of the server failed.
    Resolve(VendorError),
    /// The receive timeout option was rejected.
    Timeout(VendorError),
    /// The request was not sent in full.
    Send,
    /// Nothing (or an error) came back from the server.
    Receive(VendorError),
    /// The response was shorter than an NTP header.
    ShortResponse(usize),
    /// The response mode field was not 4 (server).
    NotServerMode(u8),
    /// The transmit timestamp predates the 2013 reference epoch.
    BeforeEpoch(u32),
    /// The device refused the new date/time.
    SetTime(VendorError),
    /// Every configured server failed.
    AllServersFailed,
}

impl fmt::Display for SntpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "UDP socket creation failed ({e})"),
            Self::Resolve(e) => write!(f, "server lookup failed ({e})"),
            Self::Timeout(e) => write!(f, "receive timeout rejected ({e})"),
            Self::Send => write!(f, "request not sent"),
            Self::Receive(e) => write!(f, "no response ({e})"),
            Self::ShortResponse(n) => write!(f, "short response ({n} bytes)"),
            Self::NotServerMode(m) => write!(f, "unexpected mode {m}"),
            Self::BeforeEpoch(s) => write!(f, "timestamp {s} before 2013"),
            Self::SetTime(e) => write!(f, "device clock update failed ({e})"),
            Self::AllServersFailed => write!(f, "all servers failed"),
        }
    }
}

impl core::error::Error for SntpError {}

impl From<SntpError> for Error {
    fn from(e: SntpError) -> Self {
        Self::Sntp(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
