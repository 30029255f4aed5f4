//! Calendar decomposition relative to 1 January 2013.
//!
//! Uses a flat 365-day year: leap days are ignored, so dates drift by one
//! day per leap year passed since 2013. Good enough for certificate
//! validity checks, which is all the device clock is used for.
//!
//! The [`Display`](fmt::Display) form uses a 1-based day and zero-padded
//! time fields, matching the values pushed to the device clock.

use core::fmt;

/// Seconds from the NTP epoch (1900-01-01) to 2013-01-01.
pub const TIME_2013: u32 = 3_565_987_200;

pub const YEAR_2013: u16 = 2013;

pub const SEC_IN_MIN: u32 = 60;
pub const SEC_IN_HOUR: u32 = 3600;
pub const SEC_IN_DAY: u32 = 86_400;

const DAYS_PER_YEAR: u32 = 365;

/// 1 January 2013 was a Tuesday.
const DAYS_OF_WEEK_2013: [&str; 7] = ["Tue", "Wed", "Thu", "Fri", "Sat", "Sun", "Mon"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DAYS_PER_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Rebase an NTP-era timestamp to 2013 and add the timezone offset.
pub fn secs_since_2013(ntp_secs: u32, gmt_diff_hours: u8, gmt_diff_mins: u8) -> Option<u32> {
    let elapsed = ntp_secs.checked_sub(TIME_2013)?;
    let offset = u32::from(gmt_diff_hours) * SEC_IN_HOUR + u32::from(gmt_diff_mins) * SEC_IN_MIN;
    Some(elapsed.wrapping_add(offset))
}

/// Broken-down date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Days since 1 January of `year`, 0-based.
    pub year_day: u16,
    /// Index into the 2013 weekday table (0 = Tuesday).
    pub weekday: u8,
}

impl DateTime {
    /// Decompose seconds elapsed since 2013-01-01 00:00:00.
    pub fn from_secs_since_2013(elapsed: u32) -> Self {
        let days = elapsed / SEC_IN_DAY;
        let year = YEAR_2013 + (days / DAYS_PER_YEAR) as u16;
        let year_day = (days % DAYS_PER_YEAR) as u16;

        let mut month = 0usize;
        let mut day_of_month = year_day;
        for (i, &len) in DAYS_PER_MONTH.iter().enumerate() {
            month = i;
            if day_of_month < u16::from(len) {
                break;
            }
            day_of_month -= u16::from(len);
        }

        let secs_today = elapsed % SEC_IN_DAY;

        Self {
            year,
            month: month as u8 + 1,
            day: day_of_month as u8 + 1,
            hour: (secs_today / SEC_IN_HOUR) as u8,
            minute: ((secs_today % SEC_IN_HOUR) / SEC_IN_MIN) as u8,
            second: (secs_today % SEC_IN_MIN) as u8,
            year_day,
            weekday: (days % 7) as u8,
        }
    }

    /// Decompose an NTP-era transmit timestamp (seconds since 1900),
    /// shifted by a timezone offset. `None` if it predates 2013.
    pub fn from_ntp_secs(ntp_secs: u32, gmt_diff_hours: u8, gmt_diff_mins: u8) -> Option<Self> {
        secs_since_2013(ntp_secs, gmt_diff_hours, gmt_diff_mins).map(Self::from_secs_since_2013)
    }

    pub fn weekday_name(&self) -> &'static str {
        DAYS_OF_WEEK_2013[usize::from(self.weekday) % 7]
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[usize::from(self.month.clamp(1, 12)) - 1]
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {:02}:{:02}:{:02} UTC {}",
            self.weekday_name(),
            self.month_name(),
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.year
        )
    }
}
