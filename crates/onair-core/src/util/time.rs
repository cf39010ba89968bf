//! Calendar and clock helpers for schedule data.
//!
//! ## Summary
//! Dates travel as zero-padded `YYYY-MM-DD` strings in the source documents
//! and as [`NaiveDate`] everywhere else, so ordering stays chronological.
//! Local wall-clock values are always resolved against an explicit [`Tz`],
//! never against the host zone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::error::CoreError;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated wall-clock time with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourMinute {
    hour: u8,
    minute: u8,
}

impl HourMinute {
    /// Returns `None` unless `hour` is in `0..=23` and `minute` in `0..=59`.
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since local midnight.
    #[must_use]
    pub const fn total_minutes(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    #[must_use]
    pub fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for HourMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A daily time window. `end <= start` means the window runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: HourMinute,
    pub end: HourMinute,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: HourMinute, end: HourMinute) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn crosses_midnight(&self) -> bool {
        self.end.total_minutes() <= self.start.total_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_window(s).ok_or_else(|| CoreError::InvalidInput(format!("time window {s:?}")))
    }
}

fn is_clock_field(s: &str) -> bool {
    (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// ## Summary
/// Parses `HH:MM` (24-hour, surrounding whitespace ignored).
///
/// Returns `None` for non-numeric fields, extra fields, an hour outside
/// `0..=23` or a minute outside `0..=59`.
#[must_use]
pub fn parse_hm(hm: &str) -> Option<HourMinute> {
    let (h, m) = hm.trim().split_once(':')?;
    if !is_clock_field(h) || !is_clock_field(m) {
        return None;
    }
    HourMinute::new(h.parse().ok()?, m.parse().ok()?)
}

/// ## Summary
/// Builds a window from separate `start` and `end` bounds.
#[must_use]
pub fn normalize_time_window(start: &str, end: &str) -> Option<TimeWindow> {
    Some(TimeWindow::new(parse_hm(start)?, parse_hm(end)?))
}

/// ## Summary
/// Builds a window from a single `"HH:MM-HH:MM"` string.
///
/// The string must split into exactly two parts on `-`.
#[must_use]
pub fn parse_time_window(joined: &str) -> Option<TimeWindow> {
    let mut parts = joined.split('-');
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    normalize_time_window(start, end)
}

/// ## Summary
/// Parses a strict, zero-padded `YYYY-MM-DD` date.
#[must_use]
pub fn parse_iso_date(iso: &str) -> Option<NaiveDate> {
    let iso = iso.trim();
    let bytes = iso.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(iso, ISO_DATE_FORMAT).ok()
}

/// Calendar date of `dt` in its own zone, as `YYYY-MM-DD`.
#[must_use]
pub fn to_iso_date<Z: TimeZone>(dt: &DateTime<Z>) -> String {
    dt.date_naive().format(ISO_DATE_FORMAT).to_string()
}

/// ## Summary
/// Resolves a local wall-clock value in `tz`.
///
/// A value inside a DST gap is shifted forward one hour; a value inside a
/// DST fold resolves to the earlier instant.
#[must_use]
pub fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt;
    }
    let shifted = local + TimeDelta::hours(1);
    tz.from_local_datetime(&shifted)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&local))
}

/// Local midnight of `date` in `tz`.
#[must_use]
pub fn iso_to_local_date(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    resolve_local(tz, date.and_time(NaiveTime::MIN))
}

/// ## Summary
/// Calendar-correct day arithmetic. `None` only when the result leaves
/// chrono's representable range.
#[must_use]
pub fn add_days(date: NaiveDate, delta: i64) -> Option<NaiveDate> {
    date.checked_add_signed(TimeDelta::try_days(delta)?)
}

/// String form of [`add_days`]: `None` if `iso` is not a valid date.
#[must_use]
pub fn iso_add_days(iso: &str, delta: i64) -> Option<String> {
    add_days(parse_iso_date(iso)?, delta).map(|d| d.format(ISO_DATE_FORMAT).to_string())
}

/// ## Summary
/// Formats a millisecond span as `HH:MM:SS`.
///
/// Negative spans clamp to zero and partial seconds are dropped. The hour
/// field grows past 24 instead of wrapping.
#[must_use]
pub fn ms_to_hms(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    let hh = total / 3600;
    let mm = (total % 3600) / 60;
    let ss = total % 60;
    format!("{hh:02}:{mm:02}:{ss:02}")
}

/// Short weekday, month and day in `locale`, then 24-hour time.
#[must_use]
pub fn format_dt(dt: &DateTime<Tz>, locale: Locale) -> String {
    format!(
        "{} · {}",
        dt.format_localized("%a, %b %-d", locale),
        dt.format("%H:%M")
    )
}

/// Wall clock as `HH:MM:SS`.
#[must_use]
pub fn format_clock(dt: &DateTime<Tz>) -> String {
    dt.format("%H:%M:%S").to_string()
}
