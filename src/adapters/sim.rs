//! Host simulation adapters.
//!
//! Stand-ins for the vendor stack so the binding runs on a workstation:
//!
//! - [`SimStack`]: sockets over `std::net`. Secure sockets are plain TCP;
//!   certificate options are accepted and logged but no TLS is applied.
//! - [`HostRtc`]: RTC over `std::time::Instant`.
//! - [`StdDelay`]: `std::thread::sleep`.

use core::cell::Cell;
use core::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use core::time::Duration;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::ports::{
    LinkStatus, RtcPort, RtcReading, SockOpt, SocketId, SocketKind, SocketStack, SystemClock,
    VendorError,
};
use crate::sntp::calendar::DateTime;

/// Status reported for errors with no closer vendor equivalent.
const SIM_FAILURE: i32 = -1;

/// How long one `connect` attempt may block before reporting "in progress".
const CONNECT_SLICE: Duration = Duration::from_millis(100);

// ───────────────────────────────────────────────────────────────
// Socket stack
// ───────────────────────────────────────────────────────────────

enum SimSocket {
    Stream {
        stream: Option<TcpStream>,
        recv_timeout: Option<Duration>,
    },
    Datagram(UdpSocket),
}

/// `std::net`-backed socket stack.
pub struct SimStack {
    sockets: Vec<Option<SimSocket>>,
    link_up: bool,
    /// Last time pushed through [`SystemClock`].
    device_time: Option<DateTime>,
}

impl Default for SimStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SimStack {
    pub fn new() -> Self {
        Self {
            sockets: Vec::new(),
            link_up: true,
            device_time: None,
        }
    }

    /// Simulate the WLAN link dropping or coming back.
    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }

    pub fn device_time(&self) -> Option<DateTime> {
        self.device_time
    }

    pub fn open_sockets(&self) -> usize {
        self.sockets.iter().filter(|s| s.is_some()).count()
    }

    fn slot(&mut self, sock: SocketId) -> Result<&mut SimSocket, VendorError> {
        usize::try_from(sock)
            .ok()
            .and_then(|i| self.sockets.get_mut(i))
            .and_then(Option::as_mut)
            .ok_or(VendorError::Code(SIM_FAILURE))
    }
}

fn io_to_vendor(e: &io::Error) -> VendorError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => VendorError::WouldBlock,
        _ => VendorError::Code(e.raw_os_error().map_or(SIM_FAILURE, |c| -c.abs())),
    }
}

fn as_v4(addr: SocketAddr) -> Option<SocketAddrV4> {
    match addr {
        SocketAddr::V4(v4) => Some(v4),
        SocketAddr::V6(_) => None,
    }
}

impl SocketStack for SimStack {
    fn socket(&mut self, kind: SocketKind) -> Result<SocketId, VendorError> {
        let sock = match kind {
            SocketKind::SecureStream => SimSocket::Stream {
                stream: None,
                recv_timeout: None,
            },
            SocketKind::Datagram => {
                let udp = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
                    .map_err(|e| io_to_vendor(&e))?;
                SimSocket::Datagram(udp)
            }
        };
        let idx = match self.sockets.iter().position(Option::is_none) {
            Some(free) => {
                self.sockets[free] = Some(sock);
                free
            }
            None => {
                self.sockets.push(Some(sock));
                self.sockets.len() - 1
            }
        };
        SocketId::try_from(idx).map_err(|_| VendorError::Code(SIM_FAILURE))
    }

    fn set_option(&mut self, sock: SocketId, opt: SockOpt<'_>) -> Result<(), VendorError> {
        let slot = self.slot(sock)?;
        match (slot, opt) {
            (SimSocket::Stream { recv_timeout, stream }, SockOpt::RecvTimeout(t)) => {
                *recv_timeout = Some(t);
                if let Some(s) = stream {
                    s.set_read_timeout(Some(t)).map_err(|e| io_to_vendor(&e))?;
                }
            }
            (SimSocket::Datagram(udp), SockOpt::RecvTimeout(t)) => {
                udp.set_read_timeout(Some(t)).map_err(|e| io_to_vendor(&e))?;
            }
            (_, SockOpt::NonBlocking(_)) => {}
            (SimSocket::Stream { .. }, other) => {
                debug!("SIM: socket {} ignoring {:?} (plaintext)", sock, other);
            }
            (SimSocket::Datagram(_), _) => return Err(VendorError::Code(SIM_FAILURE)),
        }
        Ok(())
    }

    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, VendorError> {
        (host, 0)
            .to_socket_addrs()
            .map_err(|e| io_to_vendor(&e))?
            .find_map(as_v4)
            .map(|a| *a.ip())
            .ok_or(VendorError::Code(SIM_FAILURE))
    }

    fn connect(&mut self, sock: SocketId, addr: SocketAddrV4) -> Result<(), VendorError> {
        let SimSocket::Stream {
            stream,
            recv_timeout,
        } = self.slot(sock)?
        else {
            return Err(VendorError::Code(SIM_FAILURE));
        };
        if stream.is_some() {
            return Ok(());
        }
        match TcpStream::connect_timeout(&SocketAddr::V4(addr), CONNECT_SLICE) {
            Ok(s) => {
                s.set_read_timeout(*recv_timeout)
                    .map_err(|e| io_to_vendor(&e))?;
                info!("SIM: socket {} connected to {} (plaintext)", sock, addr);
                *stream = Some(s);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(VendorError::InProgress),
            Err(e) => Err(io_to_vendor(&e)),
        }
    }

    fn send(&mut self, sock: SocketId, data: &[u8]) -> Result<usize, VendorError> {
        match self.slot(sock)? {
            SimSocket::Stream {
                stream: Some(s), ..
            } => s.write(data).map_err(|e| io_to_vendor(&e)),
            _ => Err(VendorError::Code(SIM_FAILURE)),
        }
    }

    fn recv(&mut self, sock: SocketId, buf: &mut [u8]) -> Result<usize, VendorError> {
        match self.slot(sock)? {
            SimSocket::Stream {
                stream: Some(s), ..
            } => s.read(buf).map_err(|e| io_to_vendor(&e)),
            _ => Err(VendorError::Code(SIM_FAILURE)),
        }
    }

    fn bind(&mut self, sock: SocketId, port: u16) -> Result<(), VendorError> {
        let SimSocket::Datagram(udp) = self.slot(sock)? else {
            return Err(VendorError::Code(SIM_FAILURE));
        };
        // Datagram sockets already sit on an ephemeral port.
        if port == 0 {
            return Ok(());
        }
        let timeout = udp.read_timeout().map_err(|e| io_to_vendor(&e))?;
        let rebound =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(|e| io_to_vendor(&e))?;
        rebound
            .set_read_timeout(timeout)
            .map_err(|e| io_to_vendor(&e))?;
        *udp = rebound;
        Ok(())
    }

    fn send_to(
        &mut self,
        sock: SocketId,
        data: &[u8],
        addr: SocketAddrV4,
    ) -> Result<usize, VendorError> {
        match self.slot(sock)? {
            SimSocket::Datagram(udp) => udp.send_to(data, addr).map_err(|e| io_to_vendor(&e)),
            SimSocket::Stream { .. } => Err(VendorError::Code(SIM_FAILURE)),
        }
    }

    fn recv_from(
        &mut self,
        sock: SocketId,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddrV4), VendorError> {
        let SimSocket::Datagram(udp) = self.slot(sock)? else {
            return Err(VendorError::Code(SIM_FAILURE));
        };
        let (n, from) = udp.recv_from(buf).map_err(|e| io_to_vendor(&e))?;
        let from = as_v4(from).ok_or(VendorError::Code(SIM_FAILURE))?;
        Ok((n, from))
    }

    fn close(&mut self, sock: SocketId) -> Result<(), VendorError> {
        let idx = usize::try_from(sock).map_err(|_| VendorError::Code(SIM_FAILURE))?;
        match self.sockets.get_mut(idx).and_then(Option::take) {
            Some(_) => Ok(()),
            None => Err(VendorError::Code(SIM_FAILURE)),
        }
    }
}

impl LinkStatus for SimStack {
    fn is_link_up(&self) -> bool {
        self.link_up
    }
}

impl SystemClock for SimStack {
    fn set_date_time(&mut self, time: &DateTime) -> Result<(), VendorError> {
        info!("SIM: device clock set to {}", time);
        self.device_time = Some(*time);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// RTC
// ───────────────────────────────────────────────────────────────

/// RTC over the host's monotonic clock.
pub struct HostRtc {
    origin: Cell<Instant>,
    offset_ms: Cell<u64>,
    in_use: Cell<bool>,
}

impl Default for HostRtc {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRtc {
    pub fn new() -> Self {
        Self {
            origin: Cell::new(Instant::now()),
            offset_ms: Cell::new(0),
            in_use: Cell::new(false),
        }
    }
}

impl RtcPort for HostRtc {
    fn now(&self) -> RtcReading {
        let ms = self.offset_ms.get() + self.origin.get().elapsed().as_millis() as u64;
        RtcReading {
            secs: (ms / 1000) as u32,
            millis: (ms % 1000) as u16,
        }
    }

    fn in_use(&self) -> bool {
        self.in_use.get()
    }

    fn mark_in_use(&self) {
        self.in_use.set(true);
    }

    fn set(&self, reading: RtcReading) {
        self.origin.set(Instant::now());
        self.offset_ms
            .set(u64::from(reading.secs) * 1000 + u64::from(reading.millis));
    }
}

// ───────────────────────────────────────────────────────────────
// Delay
// ───────────────────────────────────────────────────────────────

/// Blocking sleep on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
