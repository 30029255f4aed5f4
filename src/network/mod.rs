//! TLS network binding.
//!
//! Binds the IoT client's [`Network`] interface to the vendor's secure
//! sockets. The TLS handshake, certificate loading and DNS all happen
//! inside the vendor stack; this module only pushes parameters into it,
//! drives the non-blocking calls with a bounded poll loop and translates
//! the results into [`NetworkError`] status codes.
//!
//! ## Connection model
//!
//! 1. [`TlsNetwork::init`] stores the parameters; no socket yet.
//! 2. [`Network::connect`] opens a secure socket, configures it, resolves
//!    the host and connects (poll every 100 ms, give up after 5 s). Any
//!    failure closes the socket and clears the handle.
//! 3. `read`/`write` use the stored handle.
//! 4. `disconnect` closes the handle; `destroy` retires the binding so
//!    every later call fails with [`NetworkError::NullValue`].
//!
//! [`Network::is_connected`] reports the vendor's link-layer flag, not
//! the state of the socket. The two can disagree.

pub mod poll;

use core::net::SocketAddrV4;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{PollConfig, TlsConnectParams};
use crate::error::NetworkError;
use crate::ports::{LinkStatus, SockOpt, SocketId, SocketKind, SocketStack, VendorError};
use crate::timer::Countdown;

use self::poll::{PollOutcome, poll_until};

// ───────────────────────────────────────────────────────────────
// Network interface
// ───────────────────────────────────────────────────────────────

/// The transport interface the IoT client drives.
pub trait Network {
    fn connect(&mut self) -> Result<(), NetworkError>;

    /// Read into `buf`, waiting at most as long as `timer` has left.
    fn read(&mut self, buf: &mut [u8], timer: &mut dyn Countdown) -> Result<usize, NetworkError>;

    fn write(&mut self, data: &[u8], timer: &mut dyn Countdown) -> Result<usize, NetworkError>;

    fn disconnect(&mut self) -> Result<(), NetworkError>;

    fn is_connected(&self) -> bool;

    fn destroy(&mut self) -> Result<(), NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// TlsNetwork
// ───────────────────────────────────────────────────────────────

/// Network over a vendor secure socket.
pub struct TlsNetwork<S, D>
where
    S: SocketStack + LinkStatus,
    D: DelayNs,
{
    params: TlsConnectParams,
    poll: PollConfig,
    stack: S,
    delay: D,
    socket: Option<SocketId>,
    destroyed: bool,
}

impl<S, D> TlsNetwork<S, D>
where
    S: SocketStack + LinkStatus,
    D: DelayNs,
{
    /// Prepare a binding with the default poll budget.
    pub fn init(params: TlsConnectParams, stack: S, delay: D) -> Self {
        Self::with_poll_config(params, PollConfig::default(), stack, delay)
    }

    pub fn with_poll_config(params: TlsConnectParams, poll: PollConfig, stack: S, delay: D) -> Self {
        Self {
            params,
            poll,
            stack,
            delay,
            socket: None,
            destroyed: false,
        }
    }

    pub fn params(&self) -> &TlsConnectParams {
        &self.params
    }

    /// The live socket handle, if connected.
    pub fn socket(&self) -> Option<SocketId> {
        self.socket
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    fn live_socket(&self) -> Result<SocketId, NetworkError> {
        if self.destroyed {
            return Err(NetworkError::NullValue);
        }
        self.socket.ok_or(NetworkError::NullValue)
    }

    fn close_quietly(&mut self, sock: SocketId) {
        if let Err(e) = self.stack.close(sock) {
            warn!("TLS: close of socket {} failed ({})", sock, e);
        }
    }

    /// Everything between socket creation and a completed connect.
    fn establish(&mut self, sock: SocketId) -> Result<(), NetworkError> {
        let p = &self.params;

        self.stack
            .set_option(sock, SockOpt::NonBlocking(true))
            .map_err(|e| config_failed("non-blocking", e))?;
        self.stack
            .set_option(sock, SockOpt::CaFile(&p.root_ca_file))
            .map_err(|e| config_failed("root CA", e))?;
        self.stack
            .set_option(sock, SockOpt::CertificateFile(&p.device_cert_file))
            .map_err(|e| config_failed("certificate", e))?;
        self.stack
            .set_option(sock, SockOpt::PrivateKeyFile(&p.device_key_file))
            .map_err(|e| config_failed("private key", e))?;

        if p.server_verification {
            self.stack
                .set_option(sock, SockOpt::DomainNameVerification(&p.host))
                .map_err(|e| {
                    warn!("TLS: domain name verification rejected ({})", e);
                    NetworkError::UnknownHost
                })?;
        }

        let ip = self.stack.resolve(&p.host).map_err(|e| {
            warn!("TLS: DNS lookup of {} failed ({})", p.host, e);
            NetworkError::UnknownHost
        })?;
        let addr = SocketAddrV4::new(ip, p.port);
        debug!("TLS: {} resolved to {}", p.host, addr);

        let stack = &mut self.stack;
        match poll_until(&mut self.delay, &self.poll, VendorError::InProgress, || {
            stack.connect(sock, addr)
        }) {
            PollOutcome::Done(()) => Ok(()),
            PollOutcome::Failed(e) => {
                warn!("TLS: connect to {} failed ({})", addr, e);
                Err(NetworkError::ConnectFailed)
            }
            PollOutcome::TimedOut => {
                warn!(
                    "TLS: connect to {} timed out after {} ms",
                    addr, self.poll.socket_timeout_ms
                );
                Err(NetworkError::ConnectFailed)
            }
        }
    }
}

fn config_failed(what: &str, e: VendorError) -> NetworkError {
    warn!("TLS: {} option rejected ({})", what, e);
    NetworkError::SslInit
}

impl<S, D> Network for TlsNetwork<S, D>
where
    S: SocketStack + LinkStatus,
    D: DelayNs,
{
    fn connect(&mut self) -> Result<(), NetworkError> {
        if self.destroyed {
            return Err(NetworkError::NullValue);
        }
        if let Some(old) = self.socket.take() {
            warn!("TLS: reconnect with socket {} still open; closing it", old);
            self.close_quietly(old);
        }

        let sock = self.stack.socket(SocketKind::SecureStream).map_err(|e| {
            warn!("TLS: secure socket creation failed ({})", e);
            NetworkError::SocketFailed
        })?;

        match self.establish(sock) {
            Ok(()) => {
                info!(
                    "TLS: connected to {}:{} (socket {})",
                    self.params.host, self.params.port, sock
                );
                self.socket = Some(sock);
                Ok(())
            }
            Err(e) => {
                self.close_quietly(sock);
                self.socket = None;
                Err(e)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8], timer: &mut dyn Countdown) -> Result<usize, NetworkError> {
        let sock = self.live_socket()?;
        if buf.is_empty() {
            return Err(NetworkError::NullValue);
        }

        // A zero receive timeout means "block forever" to the vendor;
        // an expired timer should only check once.
        let timeout_ms = timer.left_ms().max(1);

        let timeout = Duration::from_millis(u64::from(timeout_ms));
        if let Err(e) = self.stack.set_option(sock, SockOpt::RecvTimeout(timeout)) {
            warn!("TLS: receive timeout rejected ({})", e);
            return Err(NetworkError::SslRead);
        }

        match self.stack.recv(sock, buf) {
            Ok(n) if n > 0 => Ok(n),
            Ok(_) => {
                warn!("TLS: peer closed socket {}", sock);
                Err(NetworkError::SslRead)
            }
            Err(VendorError::WouldBlock) => Err(NetworkError::NothingToRead),
            Err(e) => {
                warn!("TLS: receive failed ({})", e);
                Err(NetworkError::SslRead)
            }
        }
    }

    fn write(&mut self, data: &[u8], _timer: &mut dyn Countdown) -> Result<usize, NetworkError> {
        let sock = self.live_socket()?;
        if data.is_empty() {
            return Err(NetworkError::NullValue);
        }

        let stack = &mut self.stack;
        match poll_until(&mut self.delay, &self.poll, VendorError::WouldBlock, || {
            stack.send(sock, data)
        }) {
            PollOutcome::Done(n) if n > 0 => Ok(n),
            PollOutcome::Done(_) => Err(NetworkError::SslWrite),
            PollOutcome::Failed(e) => {
                warn!("TLS: send failed ({})", e);
                Err(NetworkError::SslWrite)
            }
            PollOutcome::TimedOut => {
                warn!("TLS: send blocked for {} ms", self.poll.socket_timeout_ms);
                Err(NetworkError::SslWrite)
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        let sock = self.live_socket()?;
        self.socket = None;
        self.close_quietly(sock);
        info!("TLS: disconnected (socket {})", sock);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.destroyed && self.stack.is_link_up()
    }

    fn destroy(&mut self) -> Result<(), NetworkError> {
        if self.destroyed {
            return Err(NetworkError::NullValue);
        }
        self.destroyed = true;
        debug!("TLS: binding destroyed");
        Ok(())
    }
}

impl<S, D> Drop for TlsNetwork<S, D>
where
    S: SocketStack + LinkStatus,
    D: DelayNs,
{
    fn drop(&mut self) {
        if let Some(sock) = self.socket.take() {
            self.close_quietly(sock);
        }
    }
}
