//! Home-page snapshot: live and upcoming lists plus a day-by-day timeline.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use onair_core::util::time::add_days;

use crate::expand::all_occurrences;
use crate::model::Event;
use crate::occurrence::Occurrence;
use crate::status::{OccurrenceStatus, next_boundary};

/// Occurrences of one calendar day, in start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineDay<'a> {
    pub date: NaiveDate,
    pub occurrences: Vec<&'a Occurrence>,
}

/// ## Summary
/// All occurrences from yesterday through the look-ahead horizon, evaluated
/// at one reference instant.
///
/// A view is rebuilt on every refresh; it holds no timers and is never
/// updated in place.
#[derive(Debug, Clone)]
pub struct ScheduleView {
    occurrences: Vec<Occurrence>,
    today: NaiveDate,
    now: DateTime<Utc>,
    filter: Option<String>,
}

impl ScheduleView {
    /// ## Summary
    /// Expands `events` over `[today - 1, today + horizon_days]` where
    /// `today` is the calendar date of `now` in `tz`.
    #[must_use]
    pub fn build(events: &[Event], now: DateTime<Utc>, tz: Tz, horizon_days: u32) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        let from = add_days(today, -1).unwrap_or(today);
        let to = add_days(today, i64::from(horizon_days)).unwrap_or(today);
        let occurrences = all_occurrences(events, from, to, tz);

        tracing::debug!(
            events = events.len(),
            occurrences = occurrences.len(),
            from = %from,
            to = %to,
            "Built schedule view"
        );

        Self {
            occurrences,
            today,
            now,
            filter: None,
        }
    }

    /// Restricts lists and timeline to events whose name contains `query`,
    /// ignoring case. A blank query clears the filter.
    #[must_use]
    pub fn with_filter(mut self, query: &str) -> Self {
        let query = query.trim().to_lowercase();
        self.filter = (!query.is_empty()).then_some(query);
        self
    }

    #[must_use]
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn matches(&self, occ: &Occurrence) -> bool {
        self.filter
            .as_deref()
            .is_none_or(|q| occ.event_name.to_lowercase().contains(q))
    }

    fn with_status(&self, status: OccurrenceStatus) -> impl Iterator<Item = &Occurrence> {
        self.occurrences
            .iter()
            .filter(move |occ| occ.status(&self.now) == status && self.matches(occ))
    }

    /// Live occurrences, soonest to end first.
    #[must_use]
    pub fn live(&self) -> Vec<&Occurrence> {
        let mut live: Vec<_> = self.with_status(OccurrenceStatus::Live).collect();
        live.sort_by(|a, b| a.end_dt.cmp(&b.end_dt));
        live
    }

    /// Upcoming occurrences, soonest to start first, at most `limit`.
    #[must_use]
    pub fn upcoming(&self, limit: usize) -> Vec<&Occurrence> {
        let mut upcoming: Vec<_> = self.with_status(OccurrenceStatus::Upcoming).collect();
        upcoming.sort_by(|a, b| a.start_dt.cmp(&b.start_dt));
        upcoming.truncate(limit);
        upcoming
    }

    /// ## Summary
    /// Occurrences dated `today..=today + days`, grouped by date.
    ///
    /// Ended occurrences stay in the timeline. Days without occurrences are
    /// omitted.
    #[must_use]
    pub fn timeline(&self, days: u32) -> Vec<TimelineDay<'_>> {
        let last = add_days(self.today, i64::from(days)).unwrap_or(self.today);
        let mut selected: Vec<_> = self
            .occurrences
            .iter()
            .filter(|occ| self.today <= occ.iso_date && occ.iso_date <= last && self.matches(occ))
            .collect();
        selected.sort_by(|a, b| a.start_dt.cmp(&b.start_dt));

        let mut timeline: Vec<TimelineDay<'_>> = Vec::new();
        for occ in selected {
            match timeline.iter_mut().find(|day| day.date == occ.iso_date) {
                Some(day) => day.occurrences.push(occ),
                None => timeline.push(TimelineDay {
                    date: occ.iso_date,
                    occurrences: vec![occ],
                }),
            }
        }
        timeline.sort_by_key(|day| day.date);
        timeline
    }

    /// Next status change across every occurrence, filtered or not.
    #[must_use]
    pub fn next_boundary(&self) -> Option<DateTime<Utc>> {
        next_boundary(&self.occurrences, &self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use onair_core::util::time::{parse_iso_date, parse_time_window};

    fn date(iso: &str) -> NaiveDate {
        parse_iso_date(iso).unwrap()
    }

    fn daily(id: &str, name: &str, joined: &str) -> Event {
        Event::new(id, name)
            .with_range(date("2025-01-01"), date("2025-12-31"))
            .with_time(parse_time_window(joined).unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn view() -> ScheduleView {
        let events = vec![
            daily("news", "Morning News", "11:00-13:00"),
            daily("match", "Cup Match", "11:30-12:30"),
            daily("late", "Late Show", "22:00-01:00"),
            daily("quiz", "Quiz Night", "19:00-20:00"),
        ];
        ScheduleView::build(&events, now(), chrono_tz::UTC, 14)
    }

    #[test]
    fn test_build_window() {
        let view = view();
        assert_eq!(view.today(), date("2025-03-10"));

        let first = view.occurrences().iter().map(|o| o.iso_date).min().unwrap();
        let last = view.occurrences().iter().map(|o| o.iso_date).max().unwrap();
        assert_eq!(first, date("2025-03-09"));
        assert_eq!(last, date("2025-03-24"));
        assert_eq!(view.occurrences().len(), 4 * 16);
    }

    #[test]
    fn test_live_sorted_by_end() {
        let view = view();
        let names: Vec<_> = view.live().iter().map(|o| o.event_name.as_str()).collect();
        assert_eq!(names, vec!["Cup Match", "Morning News"]);
    }

    #[test]
    fn test_upcoming_sorted_and_limited() {
        let view = view();
        let upcoming = view.upcoming(3);
        let keys: Vec<_> = upcoming.iter().map(|o| o.occurrence_id.as_str()).collect();
        assert_eq!(
            keys,
            vec!["quiz__2025-03-10T19:00", "late__2025-03-10T22:00", "news__2025-03-11T11:00"]
        );
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let view = view().with_filter("  NEWS ");
        assert_eq!(view.live().len(), 1);
        assert!(view.upcoming(100).iter().all(|o| o.event_id == "news"));

        let cleared = view.with_filter("   ");
        assert_eq!(cleared.live().len(), 2);
    }

    #[test]
    fn test_timeline_groups_by_date() {
        let view = view();
        let timeline = view.timeline(7);

        assert_eq!(timeline.len(), 8);
        assert_eq!(timeline[0].date, date("2025-03-10"));
        assert_eq!(timeline[7].date, date("2025-03-17"));
        let first_day: Vec<_> = timeline[0]
            .occurrences
            .iter()
            .map(|o| o.event_id.as_str())
            .collect();
        assert_eq!(first_day, vec!["news", "match", "quiz", "late"]);
    }

    #[test]
    fn test_next_boundary_ignores_filter() {
        let view = view().with_filter("quiz");
        // Cup Match ends first even though it is filtered out.
        assert_eq!(
            view.next_boundary(),
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_empty_schedule() {
        let view = ScheduleView::build(&[], now(), chrono_tz::UTC, 14);
        assert!(view.live().is_empty());
        assert!(view.upcoming(25).is_empty());
        assert!(view.timeline(7).is_empty());
        assert_eq!(view.next_boundary(), None);
    }
}
