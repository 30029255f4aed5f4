//! Bounded busy-poll around non-blocking vendor calls.
//!
//! The call is retried while it reports the given "not yet" status,
//! sleeping one poll interval between attempts and charging it against
//! the timeout budget. Once the budget is spent the loop gives up.

use embedded_hal::delay::DelayNs;

use crate::config::PollConfig;
use crate::ports::VendorError;

/// How a polled call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Done(T),
    Failed(VendorError),
    TimedOut,
}

/// Run `op` until it stops returning `retry_on` or the budget runs out.
pub fn poll_until<T, D, F>(
    delay: &mut D,
    cfg: &PollConfig,
    retry_on: VendorError,
    mut op: F,
) -> PollOutcome<T>
where
    D: DelayNs,
    F: FnMut() -> Result<T, VendorError>,
{
    // A zero interval would never charge the budget.
    let interval = cfg.poll_interval_ms.max(1);
    let mut budget = i64::from(cfg.socket_timeout_ms);
    loop {
        match op() {
            Ok(v) => return PollOutcome::Done(v),
            Err(e) if e == retry_on => {}
            Err(e) => return PollOutcome::Failed(e),
        }

        delay.delay_ms(interval);

        budget -= i64::from(interval);
        if budget <= 0 {
            return PollOutcome::TimedOut;
        }
    }
}
