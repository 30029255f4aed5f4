//! SimpleLink IoT binding library.
//!
//! Binds an IoT client's network and timer interfaces to a SimpleLink
//! style Wi-Fi SoC: TLS sockets with certificate material held by the
//! vendor stack, countdown timers over the always-on RTC, and a one-shot
//! SNTP client that sets the device clock.
//!
//! Vendor calls sit behind the traits in [`ports`]. The host simulation
//! in [`adapters::sim`] lets everything run and be tested off-target;
//! the `simplelink` feature adds the FFI adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod network;
pub mod ports;
pub mod sntp;
pub mod timer;

pub use error::{Error, NetworkError, Result, SntpError};
