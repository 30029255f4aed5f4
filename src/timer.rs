//! Countdown timers over the RTC peripheral.
//!
//! All timers created from one [`TimeBase`] share its absolute time
//! reference. The RTC is claimed and zeroed at most once per time base
//! (and not at all if another component already claimed it).
//!
//! A timer latches at zero: once expiry has been observed its length is
//! cleared, so later queries keep returning zero even if the RTC is moved.

use core::cell::Cell;

use log::debug;

use crate::ports::{RtcPort, RtcReading};

/// Anything that can be armed and asked how much time is left.
///
/// [`Network::read`](crate::network::Network::read) takes its receive
/// timeout from this.
pub trait Countdown {
    fn countdown_ms(&mut self, ms: u32);

    fn countdown_sec(&mut self, secs: u32) {
        self.countdown_ms(secs.saturating_mul(1000));
    }

    /// Milliseconds remaining; `0` once expired.
    fn left_ms(&mut self) -> u32;

    fn has_expired(&mut self) -> bool {
        self.left_ms() == 0
    }
}

// ───────────────────────────────────────────────────────────────
// Time base
// ───────────────────────────────────────────────────────────────

/// Shared RTC reference for a family of timers.
pub struct TimeBase<R: RtcPort> {
    rtc: R,
    initialized: Cell<bool>,
}

impl<R: RtcPort> TimeBase<R> {
    pub fn new(rtc: R) -> Self {
        Self {
            rtc,
            initialized: Cell::new(false),
        }
    }

    /// Claim the RTC as the time reference if nobody has yet.
    ///
    /// Idempotent; later calls do nothing.
    pub fn init(&self) {
        if self.initialized.get() {
            return;
        }
        if !self.rtc.in_use() {
            self.rtc.mark_in_use();
            self.rtc.set(RtcReading::default());
            debug!("TIMER: RTC claimed, reference reset to zero");
        }
        self.initialized.set(true);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// A fresh, unarmed timer. Initialises the time base on first use.
    pub fn timer(&self) -> Timer<'_, R> {
        self.init();
        Timer {
            base: self,
            start_s: 0,
            start_ms: 0,
            length_ms: 0,
        }
    }

    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    fn now(&self) -> RtcReading {
        self.rtc.now()
    }
}

// ───────────────────────────────────────────────────────────────
// Timer
// ───────────────────────────────────────────────────────────────

/// Countdown relative to the RTC.
pub struct Timer<'a, R: RtcPort> {
    base: &'a TimeBase<R>,
    start_s: u32,
    start_ms: u16,
    length_ms: u32,
}

impl<R: RtcPort> Timer<'_, R> {
    /// Armed duration; zero when unarmed or latched after expiry.
    pub fn length_ms(&self) -> u32 {
        self.length_ms
    }

    fn elapsed_ms(&self, now: RtcReading) -> u64 {
        let start = i64::from(self.start_s) * 1000 + i64::from(self.start_ms);
        let now = i64::from(now.secs) * 1000 + i64::from(now.millis);
        // An RTC moved backwards counts as no time passed.
        now.saturating_sub(start).max(0) as u64
    }
}

impl<R: RtcPort> Countdown for Timer<'_, R> {
    fn countdown_ms(&mut self, ms: u32) {
        let now = self.base.now();
        self.length_ms = ms;
        self.start_s = now.secs;
        self.start_ms = now.millis;
    }

    fn left_ms(&mut self) -> u32 {
        if self.length_ms == 0 {
            return 0;
        }
        let elapsed = self.elapsed_ms(self.base.now());
        if elapsed >= u64::from(self.length_ms) {
            self.length_ms = 0;
            return 0;
        }
        self.length_ms - elapsed as u32
    }
}
