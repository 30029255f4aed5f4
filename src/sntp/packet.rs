//! SNTP wire format.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |LI | VN  |Mode |    Stratum    |     Poll      |   Precision   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       Root Delay / Root Dispersion / Reference ID (12)        |
//! |       Reference / Originate / Receive Timestamp (3 x 8)       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |              Transmit Timestamp seconds (bytes 40..44)        |
//! |              Transmit Timestamp fraction (bytes 44..48)       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Only the mode bits and the transmit-timestamp seconds are consumed.

use crate::error::SntpError;

pub const NTP_PACKET_LEN: usize = 48;

/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_REQUEST_HEADER: u8 = 0x1B;

const MODE_MASK: u8 = 0x07;
const MODE_SERVER: u8 = 4;

const TRANSMIT_SECS_OFFSET: usize = 40;

/// A zeroed client request.
pub fn request() -> [u8; NTP_PACKET_LEN] {
    let mut pkt = [0u8; NTP_PACKET_LEN];
    pkt[0] = CLIENT_REQUEST_HEADER;
    pkt
}

/// Validate a server reply and return its transmit-timestamp seconds
/// (NTP era, seconds since 1900).
pub fn transmit_secs(reply: &[u8]) -> Result<u32, SntpError> {
    if reply.len() < NTP_PACKET_LEN {
        return Err(SntpError::ShortResponse(reply.len()));
    }
    let mode = reply[0] & MODE_MASK;
    if mode != MODE_SERVER {
        return Err(SntpError::NotServerMode(mode));
    }
    let mut secs = [0u8; 4];
    secs.copy_from_slice(&reply[TRANSMIT_SECS_OFFSET..TRANSMIT_SECS_OFFSET + 4]);
    Ok(u32::from_be_bytes(secs))
}
