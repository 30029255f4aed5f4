//! SimpleLink IoT demo: client start-up sequence.
//!
//! ```text
//!   config ──▶ SNTP time sync ──▶ TLS connect ──▶ write probe
//!                                                    │
//!            destroy ◀── disconnect ◀── timed read ◀─┘
//! ```
//!
//! Usage: `simplelink-iot [config.json]`. Without an argument the
//! defaults are used with `localhost` as the destination.
//!
//! On the host every vendor call goes through the `std::net` simulation;
//! with the `simplelink` feature the SimpleLink adapters are used instead.

#![deny(unused_must_use)]

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, info, warn};

use simplelink_iot::adapters::console_log::ConsoleLogger;
use simplelink_iot::config::AppConfig;
use simplelink_iot::network::{Network, TlsNetwork};
use simplelink_iot::ports::{LinkStatus, RtcPort, SocketStack, SystemClock};
use simplelink_iot::sntp;
use simplelink_iot::timer::{Countdown, TimeBase};
use simplelink_iot::NetworkError;

use embedded_hal::delay::DelayNs;

const DEMO_HOST: &str = "localhost";

/// Bytes the demo sends once connected (an MQTT PINGREQ).
const PROBE: &[u8] = &[0xC0, 0x00];

/// How long to wait for the probe's answer.
const READ_WAIT_MS: u32 = 2000;

fn load_config() -> Result<AppConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            AppConfig::from_json(&bytes).with_context(|| format!("loading {path}"))
        }
        None => {
            let mut config = AppConfig::default();
            config.tls.host = heapless::String::try_from(DEMO_HOST)
                .map_err(|()| anyhow!("demo host name too long"))?;
            config.validate()?;
            Ok(config)
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    ConsoleLogger::init(LevelFilter::Debug).map_err(|e| anyhow!("logger: {e}"))?;

    info!("SimpleLink IoT demo v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        "Destination {}:{}, {} NTP server(s)",
        config.tls.host,
        config.tls.port,
        config.sntp.servers.len()
    );

    run_on_target(&config)
}

#[cfg(not(feature = "simplelink"))]
fn run_on_target(config: &AppConfig) -> Result<()> {
    use simplelink_iot::adapters::sim::{HostRtc, SimStack, StdDelay};
    run(config, SimStack::new(), HostRtc::new(), StdDelay)
}

#[cfg(feature = "simplelink")]
fn run_on_target(config: &AppConfig) -> Result<()> {
    use simplelink_iot::adapters::simplelink::{OsiDelay, PrcmRtc, SlStack};
    run(config, SlStack::new(), PrcmRtc, OsiDelay)
}

fn run<S, R, D>(config: &AppConfig, mut stack: S, rtc: R, delay: D) -> Result<()>
where
    S: SocketStack + LinkStatus + SystemClock,
    R: RtcPort,
    D: DelayNs,
{
    // ── 1. Time sync ──────────────────────────────────────────
    // The TLS handshake checks certificate dates against the device clock.
    match sntp::update_system_time(&mut stack, &config.sntp) {
        Ok(now) => info!("Device clock: {}", now),
        Err(e) => warn!("Time sync failed ({}), continuing with device clock as is", e),
    }

    // ── 2. Connect ────────────────────────────────────────────
    let base = TimeBase::new(rtc);
    let mut net = TlsNetwork::with_poll_config(config.tls.clone(), config.poll, stack, delay);

    if !net.is_connected() {
        warn!("Link layer reports no connectivity");
    }
    net.connect()
        .with_context(|| format!("connecting to {}:{}", config.tls.host, config.tls.port))?;

    // ── 3. Probe ──────────────────────────────────────────────
    let mut timer = base.timer();
    timer.countdown_ms(config.tls.timeout_ms);
    let sent = net.write(PROBE, &mut timer).context("write")?;
    info!("Sent {} byte probe", sent);

    timer.countdown_ms(READ_WAIT_MS);
    let mut buf = [0u8; 64];
    while !timer.has_expired() {
        match net.read(&mut buf, &mut timer) {
            Ok(n) => {
                info!("Received {} byte(s): {:02X?}", n, &buf[..n]);
                break;
            }
            Err(NetworkError::NothingToRead) => continue,
            Err(e) => {
                warn!("Read failed ({})", e);
                break;
            }
        }
    }

    // ── 4. Tear down ──────────────────────────────────────────
    net.disconnect().context("disconnect")?;
    net.destroy().context("destroy")?;
    info!("Done");
    Ok(())
}
