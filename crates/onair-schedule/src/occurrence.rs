//! Concrete occurrences: an event placed on a date in a time zone.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use onair_core::constants::OCCURRENCE_ID_SEPARATOR;
use onair_core::util::time::{ISO_DATE_FORMAT, TimeWindow, resolve_local};

use crate::model::Event;
use crate::status::OccurrenceStatus;

/// Which rule produced an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceSource {
    Base,
    Override,
    Extra,
}

impl OccurrenceSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Override => "override",
            Self::Extra => "extra",
        }
    }
}

impl fmt::Display for OccurrenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the per-event key `YYYY-MM-DDTHH:MM` from a date and start time.
#[must_use]
pub fn occ_key(date: NaiveDate, window: &TimeWindow) -> String {
    format!("{}T{}", date.format(ISO_DATE_FORMAT), window.start)
}

/// ## Summary
/// One concrete, timed instance of an event.
///
/// Occurrences are derived on every query and never mutated. `end_dt` is
/// always after `start_dt`; a window whose end is not after its start on the
/// clock ends on the following calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub occurrence_id: String,
    pub occ_key: String,
    pub source: OccurrenceSource,
    pub event_id: String,
    pub event_name: String,
    pub poster: String,
    pub channels: Vec<String>,
    pub iso_date: NaiveDate,
    pub time: TimeWindow,
    pub start_dt: DateTime<Tz>,
    pub end_dt: DateTime<Tz>,
    pub crosses_midnight: bool,
}

impl Occurrence {
    /// ## Summary
    /// Places `window` on `date` in `tz`.
    ///
    /// Returns `None` when the end date is unrepresentable or when DST
    /// resolution would put the end at or before the start.
    #[must_use]
    pub fn build(
        event: &Event,
        date: NaiveDate,
        window: TimeWindow,
        source: OccurrenceSource,
        tz: Tz,
    ) -> Option<Self> {
        let crosses_midnight = window.crosses_midnight();
        let end_date = if crosses_midnight {
            date.checked_add_days(Days::new(1))?
        } else {
            date
        };

        let start_dt = resolve_local(tz, date.and_time(window.start.as_naive_time()));
        let end_dt = resolve_local(tz, end_date.and_time(window.end.as_naive_time()));
        if end_dt <= start_dt {
            tracing::debug!(
                event_id = %event.event_id,
                date = %date,
                window = %window,
                "Dropping occurrence collapsed by DST transition"
            );
            return None;
        }

        let occ_key = occ_key(date, &window);
        Some(Self {
            occurrence_id: format!("{}{OCCURRENCE_ID_SEPARATOR}{occ_key}", event.event_id),
            occ_key,
            source,
            event_id: event.event_id.clone(),
            event_name: event.event_name.clone(),
            poster: event.poster.clone(),
            channels: event.channels.clone(),
            iso_date: date,
            time: window,
            start_dt,
            end_dt,
            crosses_midnight,
        })
    }

    #[must_use]
    pub fn status(&self, now: &DateTime<Utc>) -> OccurrenceStatus {
        OccurrenceStatus::of(Some(self), now)
    }
}
