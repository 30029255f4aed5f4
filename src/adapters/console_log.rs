//! Console logger.
//!
//! A minimal [`log::Log`] backend. Lines go to the console UART when the
//! `simplelink` feature is on and to stderr otherwise, formatted as
//!
//! ```text
//! I (   1234) simplelink_iot::sntp: SNTP: fetching time from `pool.ntp.org` ...
//! ```
//!
//! The millisecond stamp is taken from process start on the host and is
//! zero on the device, where the RTC belongs to the timer module.

use core::fmt::{self, Write as _};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Logger writing one line per record to the console.
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Install as the global logger. Only the first call succeeds.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger: &'static ConsoleLogger = Box::leak(Box::new(Self::new(level)));
        log::set_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

fn level_char(level: Level) -> char {
    match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'V',
    }
}

/// Render a record into `out` without the trailing newline.
pub fn format_record<W: fmt::Write>(out: &mut W, stamp_ms: u64, record: &Record<'_>) -> fmt::Result {
    write!(
        out,
        "{} ({:>7}) {}: {}",
        level_char(record.level()),
        stamp_ms,
        record.target(),
        record.args()
    )
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut sink = Sink;
        // A failed console write has nowhere to be reported.
        let _ = format_record(&mut sink, stamp_ms(), record);
        let _ = sink.write_str("\r\n");
    }

    fn flush(&self) {}
}

// ── Output ───────────────────────────────────────────────────────

struct Sink;

#[cfg(feature = "simplelink")]
impl fmt::Write for Sink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        super::simplelink::console_write(s.as_bytes());
        Ok(())
    }
}

#[cfg(not(feature = "simplelink"))]
impl fmt::Write for Sink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        use std::io::Write as _;
        std::io::stderr().write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(feature = "simplelink")]
fn stamp_ms() -> u64 {
    0
}

#[cfg(not(feature = "simplelink"))]
fn stamp_ms() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
