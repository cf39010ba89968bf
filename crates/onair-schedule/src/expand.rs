//! Occurrence expansion for event definitions.
//!
//! ## Summary
//! Turns one [`Event`] into the concrete occurrences that fall inside an
//! inclusive date window. Base dates come from the event's recurrence; a
//! per-date override replaces the default window for that date; extra
//! occurrences are added independently. Results are deduplicated by
//! `occ_key` in emission order (base and override before extra) and sorted
//! by start instant.

use std::collections::HashSet;

use chrono::NaiveDate;
use chrono_tz::Tz;
use onair_core::util::time::TimeWindow;

use crate::model::{Event, Recurrence};
use crate::occurrence::{Occurrence, OccurrenceSource};

/// Collects occurrences for one event, keeping the first per `occ_key`.
struct Emitter<'a> {
    event: &'a Event,
    tz: Tz,
    seen: HashSet<String>,
    out: Vec<Occurrence>,
}

impl<'a> Emitter<'a> {
    fn new(event: &'a Event, tz: Tz) -> Self {
        Self {
            event,
            tz,
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn push(&mut self, date: NaiveDate, window: TimeWindow, source: OccurrenceSource) {
        let Some(occ) = Occurrence::build(self.event, date, window, source, self.tz) else {
            return;
        };
        if !self.seen.insert(occ.occ_key.clone()) {
            tracing::trace!(
                event_id = %self.event.event_id,
                occ_key = %occ.occ_key,
                source = %source,
                "Dropping duplicate occurrence"
            );
            return;
        }
        tracing::trace!(occurrence_id = %occ.occurrence_id, source = %source, "Emitting occurrence");
        self.out.push(occ);
    }

    fn finish(mut self) -> Vec<Occurrence> {
        self.out.sort_by(|a, b| a.start_dt.cmp(&b.start_dt));
        self.out
    }
}

/// ## Summary
/// Base-schedule dates of `event` inside `[from, to]`.
///
/// Specific dates keep their listed order. Range dates are walked one day at
/// a time from `max(start, from)` to `min(end, to)`.
#[must_use]
pub fn base_dates(event: &Event, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    match &event.recurrence {
        Recurrence::SpecificDates(dates) => dates
            .iter()
            .copied()
            .filter(|d| from <= *d && *d <= to)
            .collect(),
        Recurrence::DateRange { start, end } => {
            let first = (*start).max(from);
            let last = (*end).min(to);
            first
                .iter_days()
                .take_while(|d| *d <= last)
                .filter(|d| event.recurrence.contains(*d))
                .collect()
        }
        Recurrence::Unscheduled => Vec::new(),
    }
}

/// ## Summary
/// Expands `event` into its occurrences on dates in `[from, to]`.
///
/// Never fails on bad data: dates without a usable window and malformed
/// entries contribute nothing. The result is sorted by `start_dt`.
#[must_use]
pub fn event_occurrences(event: &Event, from: NaiveDate, to: NaiveDate, tz: Tz) -> Vec<Occurrence> {
    let mut emitter = Emitter::new(event, tz);

    for date in base_dates(event, from, to) {
        if let Some(windows) = event.overrides.get(&date) {
            for window in windows {
                emitter.push(date, *window, OccurrenceSource::Override);
            }
        } else if let Some(window) = event.time {
            emitter.push(date, window, OccurrenceSource::Base);
        }
    }

    for extra in &event.extra_occurrences {
        if from <= extra.date && extra.date <= to {
            emitter.push(extra.date, extra.time, OccurrenceSource::Extra);
        }
    }

    emitter.finish()
}

/// Expands every event over the same window, in event order.
#[must_use]
pub fn all_occurrences(events: &[Event], from: NaiveDate, to: NaiveDate, tz: Tz) -> Vec<Occurrence> {
    events
        .iter()
        .flat_map(|event| event_occurrences(event, from, to, tz))
        .collect()
}
