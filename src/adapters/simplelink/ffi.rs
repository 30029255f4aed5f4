//! Raw bindings to the SimpleLink host driver, the OSI layer and the
//! driverlib PRCM/UART routines.
//!
//! Only the symbols the adapters call are declared. Types follow the
//! host driver's `_i16`/`_u16`/`_u32` conventions.

#![allow(non_camel_case_types, non_snake_case)]

use core::ffi::{c_char, c_void};

// ── Socket constants ─────────────────────────────────────────────

pub const SL_AF_INET: i16 = 2;
pub const SL_SOCK_STREAM: i16 = 1;
pub const SL_SOCK_DGRAM: i16 = 2;
pub const SL_SEC_SOCKET: i16 = 100;
pub const SL_IPPROTO_UDP: i16 = 17;

pub const SL_SOL_SOCKET: i16 = 1;
pub const SL_SO_RCVTIMEO: i16 = 20;
pub const SL_SO_NONBLOCKING: i16 = 24;
pub const SL_SO_SECURE_FILES_PRIVATE_KEY_FILE_NAME: i16 = 30;
pub const SL_SO_SECURE_FILES_CERTIFICATE_FILE_NAME: i16 = 31;
pub const SL_SO_SECURE_FILES_CA_FILE_NAME: i16 = 32;
pub const SO_SECURE_DOMAIN_NAME_VERIFICATION: i16 = 35;

pub const SL_EAGAIN: i32 = -11;
pub const SL_EALREADY: i32 = -114;

// ── Device configuration ─────────────────────────────────────────

pub const SL_DEVICE_GENERAL_CONFIGURATION: u8 = 1;
pub const SL_DEVICE_GENERAL_CONFIGURATION_DATE_TIME: u8 = 11;

/// Console UART (UARTA0).
pub const CONSOLE_UART_BASE: u32 = 0x4000_C000;

// ── Structures ───────────────────────────────────────────────────

pub type SlSocklen_t = u16;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlInAddr_t {
    pub s_addr: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlSockAddrIn_t {
    pub sin_family: u16,
    pub sin_port: u16,
    pub sin_addr: SlInAddr_t,
    pub sin_zero: [i8; 8],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlSockAddr_t {
    pub sa_family: u16,
    pub sa_data: [u8; 14],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlTimeval_t {
    pub tv_sec: i32,
    pub tv_usec: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlSockNonblocking_t {
    pub non_blocking_enabled: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SlDateTime_t {
    pub sl_tm_sec: u32,
    pub sl_tm_min: u32,
    pub sl_tm_hour: u32,
    /// 1-31
    pub sl_tm_day: u32,
    /// 1-12
    pub sl_tm_mon: u32,
    pub sl_tm_year: u32,
    pub sl_tm_week_day: u32,
    pub sl_tm_year_day: u32,
    pub reserved: [u32; 3],
}

// ── Functions ────────────────────────────────────────────────────

unsafe extern "C" {
    pub fn sl_Socket(domain: i16, ty: i16, protocol: i16) -> i16;
    pub fn sl_SetSockOpt(
        sd: i16,
        level: i16,
        optname: i16,
        optval: *const c_void,
        optlen: SlSocklen_t,
    ) -> i16;
    pub fn sl_NetAppDnsGetHostByName(
        hostname: *const c_char,
        name_len: u16,
        out_ip_addr: *mut u32,
        family: u8,
    ) -> i16;
    pub fn sl_Connect(sd: i16, addr: *const SlSockAddr_t, addrlen: i16) -> i16;
    pub fn sl_Bind(sd: i16, addr: *const SlSockAddr_t, addrlen: i16) -> i16;
    pub fn sl_Send(sd: i16, buf: *const c_void, len: i16, flags: i16) -> i16;
    pub fn sl_Recv(sd: i16, buf: *mut c_void, len: i16, flags: i16) -> i16;
    pub fn sl_SendTo(
        sd: i16,
        buf: *const c_void,
        len: i16,
        flags: i16,
        to: *const SlSockAddr_t,
        tolen: SlSocklen_t,
    ) -> i16;
    pub fn sl_RecvFrom(
        sd: i16,
        buf: *mut c_void,
        len: i16,
        flags: i16,
        from: *mut SlSockAddr_t,
        fromlen: *mut SlSocklen_t,
    ) -> i16;
    pub fn sl_Close(sd: i16) -> i16;
    pub fn sl_DevSet(device_set_id: u8, option: u8, config_len: u8, values: *const u8) -> i32;

    /// Provided by the application's WLAN glue: non-zero once associated
    /// and an IP address has been acquired.
    pub fn NetWiFi_isConnected() -> u32;

    pub fn osi_Sleep(ms: u32);

    pub fn PRCMRTCGet(secs: *mut u32, msecs: *mut u16);
    pub fn PRCMRTCSet(secs: u32, msecs: u16);
    pub fn PRCMRTCInUseGet() -> u8;
    pub fn PRCMRTCInUseSet();

    pub fn UARTCharPut(base: u32, ch: u8);
}
