//! SimpleLink adapters (feature `simplelink`).
//!
//! - [`SlStack`]: secure and UDP sockets, DNS, link status and device
//!   date/time through the host driver.
//! - [`PrcmRtc`]: the PRCM always-on RTC.
//! - [`OsiDelay`]: `osi_Sleep`, yielding to the RTOS.
//!
//! The host driver and the RTOS must be running before any of these are
//! used; the adapters do not start them.

pub(crate) mod ffi;

use core::ffi::c_void;
use core::net::{Ipv4Addr, SocketAddrV4};
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::ports::{
    LinkStatus, RtcPort, RtcReading, SockOpt, SocketId, SocketKind, SocketStack, SystemClock,
    VendorError,
};
use crate::sntp::calendar::DateTime;

/// Map a negative host-driver status.
fn status(rc: i32) -> VendorError {
    match rc {
        ffi::SL_EAGAIN => VendorError::WouldBlock,
        ffi::SL_EALREADY => VendorError::InProgress,
        other => VendorError::Code(other),
    }
}

fn check(rc: i16) -> Result<i16, VendorError> {
    if rc < 0 { Err(status(i32::from(rc))) } else { Ok(rc) }
}

/// Host drivers take `_i16` lengths; longer buffers are clamped.
fn clamp_len(len: usize) -> i16 {
    len.min(i16::MAX as usize) as i16
}

fn to_sockaddr(addr: SocketAddrV4) -> ffi::SlSockAddrIn_t {
    ffi::SlSockAddrIn_t {
        sin_family: ffi::SL_AF_INET as u16,
        sin_port: addr.port().to_be(),
        sin_addr: ffi::SlInAddr_t {
            s_addr: u32::from(*addr.ip()).to_be(),
        },
        sin_zero: [0; 8],
    }
}

fn from_sockaddr(addr: &ffi::SlSockAddrIn_t) -> SocketAddrV4 {
    SocketAddrV4::new(
        Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)),
        u16::from_be(addr.sin_port),
    )
}

// ───────────────────────────────────────────────────────────────
// Socket stack
// ───────────────────────────────────────────────────────────────

/// The SimpleLink host driver.
#[derive(Debug, Default)]
pub struct SlStack;

impl SlStack {
    pub fn new() -> Self {
        Self
    }

    fn set_raw<T>(sock: SocketId, name: i16, value: &T) -> Result<(), VendorError> {
        // SAFETY: `value` is a live, properly sized option structure for
        // the duration of the call; the driver copies it.
        let rc = unsafe {
            ffi::sl_SetSockOpt(
                sock,
                ffi::SL_SOL_SOCKET,
                name,
                core::ptr::from_ref(value).cast::<c_void>(),
                core::mem::size_of::<T>() as ffi::SlSocklen_t,
            )
        };
        check(rc).map(|_| ())
    }

    fn set_str(sock: SocketId, name: i16, value: &str) -> Result<(), VendorError> {
        // SAFETY: the driver reads exactly `len` bytes from `value`.
        let rc = unsafe {
            ffi::sl_SetSockOpt(
                sock,
                ffi::SL_SOL_SOCKET,
                name,
                value.as_ptr().cast::<c_void>(),
                value.len() as ffi::SlSocklen_t,
            )
        };
        check(rc).map(|_| ())
    }
}

impl SocketStack for SlStack {
    fn socket(&mut self, kind: SocketKind) -> Result<SocketId, VendorError> {
        let (ty, proto) = match kind {
            SocketKind::SecureStream => (ffi::SL_SOCK_STREAM, ffi::SL_SEC_SOCKET),
            SocketKind::Datagram => (ffi::SL_SOCK_DGRAM, ffi::SL_IPPROTO_UDP),
        };
        // SAFETY: plain integer arguments.
        check(unsafe { ffi::sl_Socket(ffi::SL_AF_INET, ty, proto) })
    }

    fn set_option(&mut self, sock: SocketId, opt: SockOpt<'_>) -> Result<(), VendorError> {
        match opt {
            SockOpt::NonBlocking(on) => {
                let v = ffi::SlSockNonblocking_t {
                    non_blocking_enabled: u32::from(on),
                };
                Self::set_raw(sock, ffi::SL_SO_NONBLOCKING, &v)
            }
            SockOpt::CaFile(name) => Self::set_str(sock, ffi::SL_SO_SECURE_FILES_CA_FILE_NAME, name),
            SockOpt::CertificateFile(name) => {
                Self::set_str(sock, ffi::SL_SO_SECURE_FILES_CERTIFICATE_FILE_NAME, name)
            }
            SockOpt::PrivateKeyFile(name) => {
                Self::set_str(sock, ffi::SL_SO_SECURE_FILES_PRIVATE_KEY_FILE_NAME, name)
            }
            SockOpt::DomainNameVerification(host) => {
                Self::set_str(sock, ffi::SO_SECURE_DOMAIN_NAME_VERIFICATION, host)
            }
            SockOpt::RecvTimeout(t) => Self::set_raw(sock, ffi::SL_SO_RCVTIMEO, &timeval(t)),
        }
    }

    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, VendorError> {
        let mut ip = 0u32;
        // SAFETY: the driver reads `len` bytes of `host` and writes one u32.
        let rc = unsafe {
            ffi::sl_NetAppDnsGetHostByName(
                host.as_ptr().cast(),
                host.len() as u16,
                &raw mut ip,
                ffi::SL_AF_INET as u8,
            )
        };
        check(rc)?;
        Ok(Ipv4Addr::from(ip))
    }

    fn connect(&mut self, sock: SocketId, addr: SocketAddrV4) -> Result<(), VendorError> {
        let sa = to_sockaddr(addr);
        // SAFETY: `sa` outlives the call and has the size passed.
        let rc = unsafe {
            ffi::sl_Connect(
                sock,
                core::ptr::from_ref(&sa).cast(),
                core::mem::size_of::<ffi::SlSockAddrIn_t>() as i16,
            )
        };
        check(rc).map(|_| ())
    }

    fn send(&mut self, sock: SocketId, data: &[u8]) -> Result<usize, VendorError> {
        // SAFETY: the driver reads at most `len` bytes of `data`.
        let rc = unsafe {
            ffi::sl_Send(sock, data.as_ptr().cast(), clamp_len(data.len()), 0)
        };
        check(rc).map(|n| n as usize)
    }

    fn recv(&mut self, sock: SocketId, buf: &mut [u8]) -> Result<usize, VendorError> {
        // SAFETY: the driver writes at most `len` bytes into `buf`.
        let rc = unsafe {
            ffi::sl_Recv(sock, buf.as_mut_ptr().cast(), clamp_len(buf.len()), 0)
        };
        check(rc).map(|n| n as usize)
    }

    fn bind(&mut self, sock: SocketId, port: u16) -> Result<(), VendorError> {
        let sa = to_sockaddr(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        // SAFETY: `sa` outlives the call and has the size passed.
        let rc = unsafe {
            ffi::sl_Bind(
                sock,
                core::ptr::from_ref(&sa).cast(),
                core::mem::size_of::<ffi::SlSockAddrIn_t>() as i16,
            )
        };
        check(rc).map(|_| ())
    }

    fn send_to(
        &mut self,
        sock: SocketId,
        data: &[u8],
        addr: SocketAddrV4,
    ) -> Result<usize, VendorError> {
        let sa = to_sockaddr(addr);
        // SAFETY: `data` and `sa` outlive the call; sizes match.
        let rc = unsafe {
            ffi::sl_SendTo(
                sock,
                data.as_ptr().cast(),
                clamp_len(data.len()),
                0,
                core::ptr::from_ref(&sa).cast(),
                core::mem::size_of::<ffi::SlSockAddrIn_t>() as ffi::SlSocklen_t,
            )
        };
        check(rc).map(|n| n as usize)
    }

    fn recv_from(
        &mut self,
        sock: SocketId,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddrV4), VendorError> {
        let mut sa = ffi::SlSockAddrIn_t::default();
        let mut sa_len = core::mem::size_of::<ffi::SlSockAddrIn_t>() as ffi::SlSocklen_t;
        // SAFETY: `buf` and `sa` are writable for the sizes passed.
        let rc = unsafe {
            ffi::sl_RecvFrom(
                sock,
                buf.as_mut_ptr().cast(),
                clamp_len(buf.len()),
                0,
                core::ptr::from_mut(&mut sa).cast(),
                &raw mut sa_len,
            )
        };
        let n = check(rc)?;
        Ok((n as usize, from_sockaddr(&sa)))
    }

    fn close(&mut self, sock: SocketId) -> Result<(), VendorError> {
        // SAFETY: closing an unknown descriptor only returns an error.
        check(unsafe { ffi::sl_Close(sock) }).map(|_| ())
    }
}

fn timeval(t: Duration) -> ffi::SlTimeval_t {
    ffi::SlTimeval_t {
        tv_sec: t.as_secs().min(i32::MAX as u64) as i32,
        tv_usec: t.subsec_micros() as i32,
    }
}

impl LinkStatus for SlStack {
    fn is_link_up(&self) -> bool {
        // SAFETY: reads a status flag maintained by the WLAN event handler.
        unsafe { ffi::NetWiFi_isConnected() != 0 }
    }
}

impl SystemClock for SlStack {
    fn set_date_time(&mut self, time: &DateTime) -> Result<(), VendorError> {
        let dt = ffi::SlDateTime_t {
            sl_tm_sec: u32::from(time.second),
            sl_tm_min: u32::from(time.minute),
            sl_tm_hour: u32::from(time.hour),
            sl_tm_day: u32::from(time.day),
            sl_tm_mon: u32::from(time.month),
            sl_tm_year: u32::from(time.year),
            sl_tm_week_day: 0,
            sl_tm_year_day: 0,
            reserved: [0; 3],
        };
        // SAFETY: `dt` outlives the call and has the size passed.
        let rc = unsafe {
            ffi::sl_DevSet(
                ffi::SL_DEVICE_GENERAL_CONFIGURATION,
                ffi::SL_DEVICE_GENERAL_CONFIGURATION_DATE_TIME,
                core::mem::size_of::<ffi::SlDateTime_t>() as u8,
                core::ptr::from_ref(&dt).cast(),
            )
        };
        if rc < 0 {
            return Err(status(rc));
        }
        debug!("SL: device date/time set");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// RTC
// ───────────────────────────────────────────────────────────────

/// The PRCM always-on RTC.
#[derive(Debug, Default)]
pub struct PrcmRtc;

impl RtcPort for PrcmRtc {
    fn now(&self) -> RtcReading {
        let mut secs = 0u32;
        let mut millis = 0u16;
        // SAFETY: both out-pointers are valid for one write each.
        unsafe { ffi::PRCMRTCGet(&raw mut secs, &raw mut millis) };
        RtcReading { secs, millis }
    }

    fn in_use(&self) -> bool {
        // SAFETY: register read.
        unsafe { ffi::PRCMRTCInUseGet() != 0 }
    }

    fn mark_in_use(&self) {
        // SAFETY: register write.
        unsafe { ffi::PRCMRTCInUseSet() }
    }

    fn set(&self, reading: RtcReading) {
        // SAFETY: register write.
        unsafe { ffi::PRCMRTCSet(reading.secs, reading.millis) }
    }
}

// ───────────────────────────────────────────────────────────────
// Delay
// ───────────────────────────────────────────────────────────────

/// Task sleep through the OSI layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsiDelay;

impl DelayNs for OsiDelay {
    fn delay_ns(&mut self, ns: u32) {
        // The OSI tick is 1 ms; round up so short waits still yield.
        // SAFETY: plain integer argument.
        unsafe { ffi::osi_Sleep(ns.div_ceil(1_000_000)) }
    }

    fn delay_ms(&mut self, ms: u32) {
        // SAFETY: plain integer argument.
        unsafe { ffi::osi_Sleep(ms) }
    }
}

/// Write a log line to the console UART.
pub(crate) fn console_write(bytes: &[u8]) {
    for &b in bytes {
        // SAFETY: blocking byte write to the console UART.
        unsafe { ffi::UARTCharPut(ffi::CONSOLE_UART_BASE, b) }
    }
}
