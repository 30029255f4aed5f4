//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements                           | Connects to                 |
//! |---------------|--------------------------------------|-----------------------------|
//! | `console_log` | `log::Log`                           | stderr / console UART       |
//! | `sim`         | SocketStack, LinkStatus, SystemClock | `std::net` sockets          |
//! |               | RtcPort                              | `std::time::Instant`        |
//! |               | DelayNs                              | `std::thread::sleep`        |
//! | `simplelink`  | SocketStack, LinkStatus, SystemClock | SimpleLink host driver      |
//! |               | RtcPort                              | PRCM always-on RTC          |
//! |               | DelayNs                              | `osi_Sleep`                 |

pub mod console_log;
pub mod sim;
#[cfg(feature = "simplelink")]
pub mod simplelink;
