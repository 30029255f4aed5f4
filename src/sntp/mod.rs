//! One-shot SNTP clock synchronisation.
//!
//! Asks each configured server in turn for the time over a single UDP
//! socket. The first server that answers with a valid reply sets the
//! device clock; if every server fails the call fails. There is no retry
//! beyond the server list.

pub mod calendar;
pub mod packet;

use core::net::{Ipv4Addr, SocketAddrV4};
use core::time::Duration;

use log::{info, warn};

use crate::config::SntpConfig;
use crate::error::SntpError;
use crate::ports::{SockOpt, SocketId, SocketKind, SocketStack, SystemClock};

use self::calendar::DateTime;
use self::packet::NTP_PACKET_LEN;

/// State of one synchronisation run.
#[derive(Debug, Clone, Default)]
pub struct SntpSession {
    /// Address of the server currently being asked.
    pub destination: Option<Ipv4Addr>,
    pub socket: Option<SocketId>,
    /// Seconds since 2013 (timezone applied) from the last good reply.
    pub elapsed_secs: u32,
    /// Last decoded time.
    pub time: Option<DateTime>,
    /// The local port is bound after the first request goes out.
    bound: bool,
}

impl SntpSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query every server until one sets the device clock.
    pub fn update_system_time<S>(
        &mut self,
        stack: &mut S,
        config: &SntpConfig,
    ) -> Result<DateTime, SntpError>
    where
        S: SocketStack + SystemClock,
    {
        let sock = stack.socket(SocketKind::Datagram).map_err(|e| {
            warn!("SNTP: UDP socket creation failed ({})", e);
            SntpError::Socket(e)
        })?;
        self.socket = Some(sock);
        self.bound = false;

        let result = self.try_servers(stack, sock, config);

        if let Err(e) = stack.close(sock) {
            warn!("SNTP: close of socket {} failed ({})", sock, e);
        }
        self.socket = None;
        result
    }

    fn try_servers<S>(
        &mut self,
        stack: &mut S,
        sock: SocketId,
        config: &SntpConfig,
    ) -> Result<DateTime, SntpError>
    where
        S: SocketStack + SystemClock,
    {
        for server in &config.servers {
            info!("SNTP: fetching time from `{}` ...", server);
            match self.query(stack, sock, server, config) {
                Ok(time) => {
                    info!("SNTP: {}", time);
                    match stack.set_date_time(&time) {
                        Ok(()) => return Ok(time),
                        Err(e) => warn!("SNTP: {}", SntpError::SetTime(e)),
                    }
                }
                Err(e) => warn!("SNTP: `{}`: {}", server, e),
            }
        }
        warn!("SNTP: {}", SntpError::AllServersFailed);
        Err(SntpError::AllServersFailed)
    }

    /// One request/response exchange with `server`.
    fn query<S>(
        &mut self,
        stack: &mut S,
        sock: SocketId,
        server: &str,
        config: &SntpConfig,
    ) -> Result<DateTime, SntpError>
    where
        S: SocketStack,
    {
        let ip = stack.resolve(server).map_err(SntpError::Resolve)?;
        self.destination = Some(ip);

        // A zero receive timeout blocks forever on the device.
        let timeout = Duration::from_secs(u64::from(config.response_timeout_secs.max(1)));
        stack
            .set_option(sock, SockOpt::RecvTimeout(timeout))
            .map_err(SntpError::Timeout)?;

        let request = packet::request();
        let dest = SocketAddrV4::new(ip, config.port);
        match stack.send_to(sock, &request, dest) {
            Ok(n) if n == NTP_PACKET_LEN => {}
            _ => return Err(SntpError::Send),
        }

        if !self.bound {
            if let Err(e) = stack.bind(sock, 0) {
                warn!("SNTP: bind failed ({}), receiving anyway", e);
            }
            self.bound = true;
        }

        let mut reply = [0u8; NTP_PACKET_LEN];
        let (n, _from) = stack.recv_from(sock, &mut reply).map_err(SntpError::Receive)?;
        let ntp_secs = packet::transmit_secs(&reply[..n.min(NTP_PACKET_LEN)])?;

        let elapsed =
            calendar::secs_since_2013(ntp_secs, config.gmt_diff_hours, config.gmt_diff_mins)
                .ok_or(SntpError::BeforeEpoch(ntp_secs))?;
        let time = DateTime::from_secs_since_2013(elapsed);

        self.elapsed_secs = elapsed;
        self.time = Some(time);
        Ok(time)
    }
}

/// Run a fresh [`SntpSession`] against `stack`.
pub fn update_system_time<S>(stack: &mut S, config: &SntpConfig) -> Result<DateTime, SntpError>
where
    S: SocketStack + SystemClock,
{
    SntpSession::new().update_system_time(stack, config)
}
