//! Occurrence selection and countdown text for the player page.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use onair_core::util::time::{add_days, ms_to_hms, parse_iso_date};

use crate::error::ScheduleError;
use crate::expand::event_occurrences;
use crate::model::Event;
use crate::occurrence::Occurrence;
use crate::status::OccurrenceStatus;

/// Days either side of a linked occurrence's date that are searched.
const LINK_SEARCH_DAYS: i64 = 2;
/// Look-back when no occurrence is linked.
const DEFAULT_LOOKBACK_DAYS: i64 = 2;
/// Look-ahead when no occurrence is linked.
const DEFAULT_LOOKAHEAD_DAYS: i64 = 14;

/// The date part of an `occ_key` link parameter, e.g. `2025-06-01T22:00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccKey {
    pub key: String,
    pub date: NaiveDate,
}

impl FromStr for OccKey {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        let date_part = key.split('T').next().unwrap_or_default();
        let date = parse_iso_date(date_part)
            .ok_or_else(|| ScheduleError::InvalidDate(format!("occurrence key {key:?}")))?;
        Ok(Self {
            key: key.to_string(),
            date,
        })
    }
}

fn soonest_upcoming(occs: &[Occurrence], now: &DateTime<Utc>) -> Option<Occurrence> {
    occs.iter()
        .filter(|occ| occ.start_dt > *now)
        .min_by_key(|occ| occ.start_dt)
        .cloned()
}

fn first_live(occs: &[Occurrence], now: &DateTime<Utc>) -> Option<Occurrence> {
    occs.iter()
        .find(|occ| occ.status(now) == OccurrenceStatus::Live)
        .cloned()
}

/// ## Summary
/// Chooses the occurrence the player should show.
///
/// With a linked `occ_key`, the two days either side of its date are
/// expanded and the exact match wins; otherwise the soonest upcoming
/// occurrence, then the first live one. Without a link, the first live
/// occurrence from two days back to fourteen ahead wins, then the soonest
/// upcoming one.
#[must_use]
pub fn pick_occurrence(
    event: &Event,
    occ_key: Option<&str>,
    now: &DateTime<Utc>,
    tz: Tz,
) -> Option<Occurrence> {
    if let Some(raw_key) = occ_key {
        let link = match raw_key.parse::<OccKey>() {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(event_id = %event.event_id, error = %e, "Ignoring unusable occurrence link");
                return None;
            }
        };
        let from = add_days(link.date, -LINK_SEARCH_DAYS)?;
        let to = add_days(link.date, LINK_SEARCH_DAYS)?;
        let occs = event_occurrences(event, from, to, tz);

        if let Some(found) = occs.iter().find(|occ| occ.occ_key == link.key) {
            return Some(found.clone());
        }
        tracing::debug!(event_id = %event.event_id, occ_key = %link.key, "Linked occurrence not found, falling back");
        return soonest_upcoming(&occs, now).or_else(|| first_live(&occs, now));
    }

    let today = now.with_timezone(&tz).date_naive();
    let from = add_days(today, -DEFAULT_LOOKBACK_DAYS)?;
    let to = add_days(today, DEFAULT_LOOKAHEAD_DAYS)?;
    let occs = event_occurrences(event, from, to, tz);

    first_live(&occs, now).or_else(|| soonest_upcoming(&occs, now))
}

/// Countdown shown next to an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Countdown {
    StartsIn(String),
    EndsIn(String),
    Finished,
}

impl Countdown {
    #[must_use]
    pub fn for_occurrence(occ: &Occurrence, now: &DateTime<Utc>) -> Self {
        match occ.status(now) {
            OccurrenceStatus::Upcoming => {
                Self::StartsIn(ms_to_hms((occ.start_dt.with_timezone(&Utc) - *now).num_milliseconds()))
            }
            OccurrenceStatus::Live => {
                Self::EndsIn(ms_to_hms((occ.end_dt.with_timezone(&Utc) - *now).num_milliseconds()))
            }
            OccurrenceStatus::Ended | OccurrenceStatus::Invalid => Self::Finished,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartsIn(hms) => write!(f, "Starts in {hms}"),
            Self::EndsIn(hms) => write!(f, "Ends in {hms}"),
            Self::Finished => f.write_str("Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use onair_core::util::time::parse_time_window;

    fn date(iso: &str) -> NaiveDate {
        parse_iso_date(iso).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, h, m, 0).unwrap()
    }

    fn event() -> Event {
        Event::new("show", "Show")
            .with_specific_dates([date("2025-06-01"), date("2025-06-03"), date("2025-07-20")])
            .with_time(parse_time_window("20:00-22:00").unwrap())
    }

    const TZ: Tz = chrono_tz::UTC;

    #[test]
    fn test_occ_key_parse() {
        let link: OccKey = "2025-06-01T20:00".parse().unwrap();
        assert_eq!(link.date, date("2025-06-01"));
        assert!(matches!("garbage".parse::<OccKey>(), Err(ScheduleError::InvalidDate(_))));
    }

    #[test]
    fn test_pick_exact_link() {
        let occ = pick_occurrence(&event(), Some("2025-06-03T20:00"), &at(1, 12, 0), TZ).unwrap();
        assert_eq!(occ.occ_key, "2025-06-03T20:00");
    }

    #[test]
    fn test_pick_link_far_in_future() {
        let occ = pick_occurrence(&event(), Some("2025-07-20T20:00"), &at(1, 12, 0), TZ).unwrap();
        assert_eq!(occ.iso_date, date("2025-07-20"));
    }

    #[test]
    fn test_pick_stale_link_falls_back_to_upcoming() {
        let occ = pick_occurrence(&event(), Some("2025-06-02T09:00"), &at(1, 12, 0), TZ).unwrap();
        assert_eq!(occ.occ_key, "2025-06-01T20:00");
    }

    #[test]
    fn test_pick_stale_link_falls_back_to_live() {
        let event = Event::new("show", "Show")
            .with_specific_dates([date("2025-06-01")])
            .with_time(parse_time_window("20:00-22:00").unwrap());
        let occ = pick_occurrence(&event, Some("2025-06-01T08:00"), &at(1, 21, 0), TZ).unwrap();
        assert_eq!(occ.occ_key, "2025-06-01T20:00");
    }

    #[test_log::test]
    fn test_pick_bad_link() {
        assert!(pick_occurrence(&event(), Some("soon"), &at(1, 12, 0), TZ).is_none());
    }

    #[test]
    fn test_pick_without_link_prefers_live() {
        let occ = pick_occurrence(&event(), None, &at(3, 21, 0), TZ).unwrap();
        assert_eq!(occ.occ_key, "2025-06-03T20:00");

        let occ = pick_occurrence(&event(), None, &at(2, 9, 0), TZ).unwrap();
        assert_eq!(occ.occ_key, "2025-06-03T20:00");
    }

    #[test]
    fn test_pick_without_link_nothing_in_window() {
        assert!(pick_occurrence(&event(), None, &at(4, 12, 0), TZ).is_none());
    }

    #[test]
    fn test_countdown() {
        let occ = pick_occurrence(&event(), Some("2025-06-01T20:00"), &at(1, 12, 0), TZ).unwrap();

        assert_eq!(
            Countdown::for_occurrence(&occ, &at(1, 18, 58)).to_string(),
            "Starts in 01:02:00"
        );
        assert_eq!(
            Countdown::for_occurrence(&occ, &at(1, 21, 30)).to_string(),
            "Ends in 00:30:00"
        );
        assert_eq!(Countdown::for_occurrence(&occ, &at(1, 23, 0)), Countdown::Finished);
    }
}
