//! Configuration parameters
//!
//! Everything the binding needs at start-up: where the certificate
//! material lives on the device file system, where to connect, how long
//! the non-blocking socket loops may spin and which time servers to ask.
//! Values are fixed once the binding is initialised.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capacity of a serial-flash file name.
pub const MAX_FILE_NAME: usize = 64;

/// Capacity of a host name.
pub const MAX_HOST_NAME: usize = 128;

/// Capacity of an NTP server name.
pub const MAX_SERVER_NAME: usize = 32;

/// Number of NTP servers tried in order.
pub const NUM_NTP_SERVERS: usize = 4;

/// Timeout while waiting for non-blocking socket APIs.
pub const SOCKET_TIMEOUT_MS: u32 = 5000;

/// Polling interval for non-blocking socket APIs.
pub const SOCKET_POLL_INTERVAL_MS: u32 = 100;

// ───────────────────────────────────────────────────────────────
// TLS
// ───────────────────────────────────────────────────────────────

/// Secure-socket connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConnectParams {
    /// Root CA file used to verify the server.
    pub root_ca_file: String<MAX_FILE_NAME>,
    /// Device certificate file.
    pub device_cert_file: String<MAX_FILE_NAME>,
    /// Device private key file.
    pub device_key_file: String<MAX_FILE_NAME>,
    /// Destination host name.
    pub host: String<MAX_HOST_NAME>,
    pub port: u16,
    /// Command timeout handed to the owning client (milliseconds).
    pub timeout_ms: u32,
    /// Push the host name into the vendor's domain-name verification.
    pub server_verification: bool,
}

impl TlsConnectParams {
    /// Build parameters from plain strings.
    ///
    /// Fails if any string exceeds its fixed capacity.
    pub fn new(
        root_ca_file: &str,
        device_cert_file: &str,
        device_key_file: &str,
        host: &str,
        port: u16,
        timeout_ms: u32,
        server_verification: bool,
    ) -> Result<Self> {
        Ok(Self {
            root_ca_file: bounded(root_ca_file, "root CA file name too long")?,
            device_cert_file: bounded(device_cert_file, "certificate file name too long")?,
            device_key_file: bounded(device_key_file, "private key file name too long")?,
            host: bounded(host, "host name too long")?,
            port,
            timeout_ms,
            server_verification,
        })
    }
}

impl Default for TlsConnectParams {
    fn default() -> Self {
        Self {
            root_ca_file: String::try_from("/cert/rootCA.der").unwrap_or_default(),
            device_cert_file: String::try_from("/cert/client.der").unwrap_or_default(),
            device_key_file: String::try_from("/cert/private.der").unwrap_or_default(),
            host: String::new(),
            port: 8883,
            timeout_ms: 20_000,
            server_verification: true,
        }
    }
}

fn bounded<const N: usize>(s: &str, msg: &'static str) -> Result<String<N>> {
    String::try_from(s).map_err(|_| Error::Config(msg))
}

// ───────────────────────────────────────────────────────────────
// Polling
// ───────────────────────────────────────────────────────────────

/// Budget for the busy-poll loops around non-blocking socket calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Total time a connect or send may keep reporting "not yet".
    pub socket_timeout_ms: u32,
    /// Sleep between attempts.
    pub poll_interval_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            socket_timeout_ms: SOCKET_TIMEOUT_MS,
            poll_interval_ms: SOCKET_POLL_INTERVAL_MS,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SNTP
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SntpConfig {
    /// Servers tried in order; the first that answers wins.
    pub servers: Vec<String<MAX_SERVER_NAME>, NUM_NTP_SERVERS>,
    /// Timezone correction, hours east of GMT.
    pub gmt_diff_hours: u8,
    /// Timezone correction, extra minutes.
    pub gmt_diff_mins: u8,
    /// How long to wait for each server's reply.
    pub response_timeout_secs: u32,
    pub port: u16,
}

impl Default for SntpConfig {
    fn default() -> Self {
        let mut servers = Vec::new();
        for name in [
            "0.pool.ntp.org",
            "1.pool.ntp.org",
            "0.us.pool.ntp.org",
            "1.us.pool.ntp.org",
        ] {
            if let Ok(s) = String::try_from(name) {
                let _ = servers.push(s);
            }
        }
        Self {
            servers,
            gmt_diff_hours: 0,
            gmt_diff_mins: 0,
            response_timeout_secs: 5,
            port: 123,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Whole application
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub tls: TlsConnectParams,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub sntp: SntpConfig,
}

impl AppConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the binding cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.tls.host.is_empty() {
            return Err(Error::Config("destination host is empty"));
        }
        if self.tls.root_ca_file.is_empty()
            || self.tls.device_cert_file.is_empty()
            || self.tls.device_key_file.is_empty()
        {
            return Err(Error::Config("certificate file name is empty"));
        }
        if self.poll.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be non-zero"));
        }
        if self.poll.poll_interval_ms > self.poll.socket_timeout_ms {
            return Err(Error::Config("poll interval exceeds socket timeout"));
        }
        if self.sntp.servers.is_empty() {
            return Err(Error::Config("no NTP servers configured"));
        }
        if self.sntp.response_timeout_secs == 0 {
            return Err(Error::Config("NTP response timeout must be non-zero"));
        }
        Ok(())
    }
}
