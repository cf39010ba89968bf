//! Event definitions and the JSON ingestion boundary.
//!
//! ## Summary
//! The events document is loosely shaped: time windows arrive as records or
//! dash-joined strings, dates as free-form strings, and `date_type` as an
//! unchecked tag. [`RawEvent`] mirrors that shape; [`Event`] is the canonical
//! form the occurrence engine consumes. Conversion never fails. Malformed
//! entries are dropped one at a time so a single bad override or extra does
//! not take the rest of the event with it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use onair_core::constants::DATE_TYPE_SPECIFIC;
use onair_core::util::time::{
    TimeWindow, normalize_time_window, parse_iso_date, parse_time_window,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ScheduleResult;

/// A time window as written in the events document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimeSpec {
    /// `"HH:MM-HH:MM"`
    Joined(String),
    /// `{ "start": "HH:MM", "end": "HH:MM" }`
    Bounds(Map<String, Value>),
    Unrecognized(IgnoredAny),
}

impl RawTimeSpec {
    /// Canonical window, or `None` if the value does not describe one.
    #[must_use]
    pub fn normalize(&self) -> Option<TimeWindow> {
        match self {
            Self::Joined(joined) => parse_time_window(joined),
            Self::Bounds(fields) => normalize_time_window(
                fields.get("start")?.as_str()?,
                fields.get("end")?.as_str()?,
            ),
            Self::Unrecognized(_) => None,
        }
    }
}

/// An extra occurrence's `time`, which may also be a list of windows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawExtraTime {
    List(Vec<RawTimeSpec>),
    Single(RawTimeSpec),
}

impl RawExtraTime {
    /// First window that normalizes.
    fn normalize(&self) -> Option<TimeWindow> {
        match self {
            Self::List(items) => items.iter().find_map(RawTimeSpec::normalize),
            Self::Single(spec) => spec.normalize(),
        }
    }
}

/// Scalar JSON rendered as text. Numbers and booleans are stringified.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(&Value::deserialize(deserializer)?))
}

fn lenient_text_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
        _ => None,
    })
}

fn lenient_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(fields) => Some(fields.into_iter().collect()),
        _ => None,
    })
}

fn lenient_array<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items),
        _ => None,
    })
}

/// ## Summary
/// One event record as the feed supplies it.
///
/// Every field is read leniently: a value of the wrong JSON type reads as
/// absent instead of failing the record, and scalar text fields accept
/// numbers and booleans.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    #[serde(deserialize_with = "lenient_text")]
    pub event_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub event_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub poster: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub channels: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_text")]
    pub date_type: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub specific_dates: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end_date: Option<String>,
    pub time: Option<RawTimeSpec>,
    #[serde(deserialize_with = "lenient_object")]
    pub overrides: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient_array")]
    pub extra_occurrences: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawExtra {
    #[serde(deserialize_with = "lenient_text")]
    date: Option<String>,
    time: Option<RawExtraTime>,
}

/// Which calendar days an event's base schedule covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Only the listed days, in listed order. May be empty.
    SpecificDates(Vec<NaiveDate>),
    /// Every day from `start` to `end`, both inclusive.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// No usable recurrence data.
    Unscheduled,
}

impl Recurrence {
    /// Whether `date` belongs to the base schedule.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::SpecificDates(dates) => dates.contains(&date),
            Self::DateRange { start, end } => *start <= date && date <= *end,
            Self::Unscheduled => false,
        }
    }
}

/// A one-off occurrence added outside the base schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraOccurrence {
    pub date: NaiveDate,
    pub time: TimeWindow,
}

/// Canonical event definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: String,
    pub event_name: String,
    pub poster: String,
    pub channels: Vec<String>,
    pub recurrence: Recurrence,
    /// Default daily window.
    pub time: Option<TimeWindow>,
    /// Per-date replacement windows. A present key replaces the default
    /// window for that date even if none of its windows were usable.
    pub overrides: BTreeMap<NaiveDate, Vec<TimeWindow>>,
    pub extra_occurrences: Vec<ExtraOccurrence>,
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn parse_logged_date(event_id: &str, field: &'static str, iso: &str) -> Option<NaiveDate> {
    let date = parse_iso_date(iso);
    if date.is_none() {
        tracing::debug!(event_id = %event_id, field, value = iso, "Skipping malformed date");
    }
    date
}

impl Event {
    /// Creates an unscheduled event with no time window.
    #[must_use]
    pub fn new(event_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: event_name.into(),
            poster: String::new(),
            channels: Vec::new(),
            recurrence: Recurrence::Unscheduled,
            time: None,
            overrides: BTreeMap::new(),
            extra_occurrences: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = poster.into();
        self
    }

    #[must_use]
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_specific_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.recurrence = Recurrence::SpecificDates(dates.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.recurrence = Recurrence::DateRange { start, end };
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: TimeWindow) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn with_override(mut self, date: NaiveDate, windows: Vec<TimeWindow>) -> Self {
        self.overrides.insert(date, windows);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, date: NaiveDate, time: TimeWindow) -> Self {
        self.extra_occurrences.push(ExtraOccurrence { date, time });
        self
    }

    /// ## Summary
    /// Converts a feed record into its canonical form.
    ///
    /// Non-empty `specific_dates` take precedence over a date range. A
    /// `date_type` of `"specific"` without dates yields an empty date list.
    #[must_use]
    pub fn from_raw(raw: RawEvent) -> Self {
        let event_id = trimmed(raw.event_id);

        let specific: Vec<String> = raw.specific_dates.unwrap_or_default();
        let forced_specific = raw
            .date_type
            .as_deref()
            .is_some_and(|t| t.trim() == DATE_TYPE_SPECIFIC);
        let recurrence = if !specific.is_empty() {
            Recurrence::SpecificDates(
                specific
                    .iter()
                    .filter_map(|iso| parse_logged_date(&event_id, "specific_dates", iso))
                    .collect(),
            )
        } else if forced_specific {
            Recurrence::SpecificDates(Vec::new())
        } else {
            let start = raw.start_date.as_deref().and_then(parse_iso_date);
            let end = raw.end_date.as_deref().and_then(parse_iso_date);
            match (start, end) {
                (Some(start), Some(end)) => Recurrence::DateRange { start, end },
                _ => {
                    tracing::debug!(event_id = %event_id, "Event has no usable recurrence data");
                    Recurrence::Unscheduled
                }
            }
        };

        let time = raw.time.as_ref().and_then(RawTimeSpec::normalize);

        let mut overrides = BTreeMap::new();
        for (iso, value) in raw.overrides.unwrap_or_default() {
            let Value::Array(items) = value else {
                continue;
            };
            if items.is_empty() {
                continue;
            }
            let Some(date) = parse_logged_date(&event_id, "overrides", &iso) else {
                continue;
            };
            let windows = items
                .into_iter()
                .filter_map(|item| {
                    let window = serde_json::from_value::<RawTimeSpec>(item)
                        .ok()
                        .and_then(|spec| spec.normalize());
                    if window.is_none() {
                        tracing::debug!(event_id = %event_id, date = %date, "Skipping malformed override window");
                    }
                    window
                })
                .collect();
            overrides.insert(date, windows);
        }

        let extra_occurrences = raw
            .extra_occurrences
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| {
                if !value.is_object() {
                    return None;
                }
                let extra = serde_json::from_value::<RawExtra>(value).ok()?;
                let date = parse_logged_date(&event_id, "extra_occurrences", extra.date.as_deref()?)?;
                let Some(time) = extra.time.as_ref().and_then(RawExtraTime::normalize) else {
                    tracing::debug!(event_id = %event_id, date = %date, "Skipping extra occurrence without a usable time");
                    return None;
                };
                Some(ExtraOccurrence { date, time })
            })
            .collect();

        Self {
            event_name: trimmed(raw.event_name),
            poster: trimmed(raw.poster),
            channels: raw.channels.unwrap_or_default(),
            event_id,
            recurrence,
            time,
            overrides,
            extra_occurrences,
        }
    }
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Self::from_raw(raw)
    }
}

/// ## Summary
/// Parses the events document.
///
/// A document that is not an array yields no events. Records that are not
/// JSON objects are skipped with a warning; a badly typed field inside a
/// record only loses that field.
///
/// ## Errors
/// Returns `ScheduleError::Json` if `json` is not valid JSON.
pub fn load_events(json: &str) -> ScheduleResult<Vec<Event>> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(records) = document else {
        tracing::warn!("Events document is not an array, treating as empty");
        return Ok(Vec::new());
    };

    let total = records.len();
    let events: Vec<Event> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            if !record.is_object() {
                tracing::warn!(index, "Skipping event record that is not an object");
                return None;
            }
            match serde_json::from_value::<RawEvent>(record) {
                Ok(raw) => Some(Event::from_raw(raw)),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed event record");
                    None
                }
            }
        })
        .collect();

    tracing::debug!(total, loaded = events.len(), "Loaded events document");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(iso: &str) -> NaiveDate {
        parse_iso_date(iso).unwrap()
    }

    fn window(joined: &str) -> TimeWindow {
        parse_time_window(joined).unwrap()
    }

    fn event_from(json: &str) -> Event {
        Event::from_raw(serde_json::from_str::<RawEvent>(json).unwrap())
    }

    #[test]
    fn test_time_spec_forms() {
        let joined: RawTimeSpec = serde_json::from_str(r#""10:00-11:00""#).unwrap();
        let bounds: RawTimeSpec = serde_json::from_str(r#"{"start":"10:00","end":"11:00"}"#).unwrap();
        let list: RawTimeSpec =
            serde_json::from_str(r#"["bad", {"start":"10:00","end":"11:00"}]"#).unwrap();
        let number: RawTimeSpec = serde_json::from_str("42").unwrap();
        let partial: RawTimeSpec = serde_json::from_str(r#"{"start":"10:00"}"#).unwrap();

        assert_eq!(joined.normalize(), Some(window("10:00-11:00")));
        assert_eq!(bounds.normalize(), Some(window("10:00-11:00")));
        assert_eq!(list.normalize(), None);
        assert_eq!(number.normalize(), None);
        assert_eq!(partial.normalize(), None);
    }

    #[test]
    fn test_extra_time_accepts_list() {
        let list: RawExtraTime =
            serde_json::from_str(r#"["bad", {"start":"10:00","end":"11:00"}]"#).unwrap();
        let single: RawExtraTime = serde_json::from_str(r#""12:00-13:00""#).unwrap();

        assert_eq!(list.normalize(), Some(window("10:00-11:00")));
        assert_eq!(single.normalize(), Some(window("12:00-13:00")));
    }

    #[test]
    fn test_list_time_rejected_outside_extras() {
        let event = event_from(
            r#"{
                "specific_dates": ["2025-01-02"],
                "time": ["10:00-11:00"],
                "overrides": {"2025-01-02": [["12:00-13:00"], "14:00-15:00"]}
            }"#,
        );

        assert_eq!(event.time, None);
        assert_eq!(event.overrides[&date("2025-01-02")], vec![window("14:00-15:00")]);
    }

    #[test]
    fn test_specific_dates_take_precedence() {
        let event = event_from(
            r#"{
                "event_id": "e1",
                "specific_dates": ["2025-06-01", "junk", "2025-06-03"],
                "start_date": "2025-01-01",
                "end_date": "2025-12-31",
                "time": "10:00-11:00"
            }"#,
        );

        assert_eq!(
            event.recurrence,
            Recurrence::SpecificDates(vec![date("2025-06-01"), date("2025-06-03")])
        );
    }

    #[test]
    fn test_date_type_specific_without_dates() {
        let event = event_from(
            r#"{
                "event_id": "e1",
                "date_type": " specific ",
                "start_date": "2025-01-01",
                "end_date": "2025-12-31"
            }"#,
        );

        assert_eq!(event.recurrence, Recurrence::SpecificDates(Vec::new()));
        assert!(!event.recurrence.contains(date("2025-06-01")));
    }

    #[test]
    fn test_range_and_unscheduled() {
        let ranged = event_from(r#"{"start_date":"2025-01-01","end_date":"2025-01-03"}"#);
        assert_eq!(
            ranged.recurrence,
            Recurrence::DateRange {
                start: date("2025-01-01"),
                end: date("2025-01-03")
            }
        );
        assert!(ranged.recurrence.contains(date("2025-01-03")));
        assert!(!ranged.recurrence.contains(date("2025-01-04")));

        let open_ended = event_from(r#"{"start_date":"2025-01-01"}"#);
        assert_eq!(open_ended.recurrence, Recurrence::Unscheduled);
    }

    #[test_log::test]
    fn test_overrides_keep_key_when_windows_malformed() {
        let event = event_from(
            r#"{
                "overrides": {
                    "2025-01-02": [{"start":"12:00","end":"13:00"}, "99:00-10:00"],
                    "2025-01-03": ["nope"],
                    "2025-01-04": [],
                    "2025-01-05": "12:00-13:00",
                    "bad-date": ["12:00-13:00"]
                }
            }"#,
        );

        assert_eq!(event.overrides.len(), 2);
        assert_eq!(event.overrides[&date("2025-01-02")], vec![window("12:00-13:00")]);
        assert!(event.overrides[&date("2025-01-03")].is_empty());
    }

    #[test_log::test]
    fn test_extras_skip_individually() {
        let event = event_from(
            r#"{
                "extra_occurrences": [
                    {"date": "2025-01-10", "time": "18:00-19:00"},
                    {"date": "2025-01-11", "time": {"start": "18:00", "end": "25:00"}},
                    {"date": "2025-1-12", "time": "18:00-19:00"},
                    {"time": "18:00-19:00"},
                    "not an object",
                    {"date": "2025-01-13", "time": [{"start": "20:00", "end": "21:00"}]}
                ]
            }"#,
        );

        assert_eq!(
            event.extra_occurrences,
            vec![
                ExtraOccurrence {
                    date: date("2025-01-10"),
                    time: window("18:00-19:00")
                },
                ExtraOccurrence {
                    date: date("2025-01-13"),
                    time: window("20:00-21:00")
                },
            ]
        );
    }

    #[test]
    fn test_text_fields_trimmed() {
        let event = event_from(
            r#"{"event_id":" e1 ","event_name":"  Final ","poster":"p.svg","channels":["A","B"]}"#,
        );
        assert_eq!(event.event_id, "e1");
        assert_eq!(event.event_name, "Final");
        assert_eq!(event.poster, "p.svg");
        assert_eq!(event.channels, vec!["A", "B"]);
    }

    #[test_log::test]
    fn test_load_events_skips_bad_records() {
        let events = load_events(
            r#"[
                {"event_id": "ok", "time": "10:00-11:00"},
                "not an event",
                ["also", "not", "an", "event"],
                null,
                {"event_id": 7},
                {"event_id": "also-ok", "channels": ["A"]}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "7", "also-ok"]);
    }

    fn occurrence_count(event: &Event) -> usize {
        crate::expand::event_occurrences(event, date("2025-05-01"), date("2025-07-01"), chrono_tz::UTC).len()
    }

    fn single_occurrence_event(extra_field: &str) -> Vec<Event> {
        load_events(&format!(
            r#"[{{
                "event_id": "e1",
                "event_name": "Final",
                "specific_dates": ["2025-06-01"],
                "time": "10:00-11:00",
                {extra_field}
            }}]"#
        ))
        .unwrap()
    }

    #[test_log::test]
    fn test_overrides_as_array_keep_event() {
        let events = single_occurrence_event(r#""overrides": [{"2025-06-01": ["12:00-13:00"]}]"#);

        assert_eq!(events.len(), 1);
        assert!(events[0].overrides.is_empty());
        assert_eq!(events[0].time, Some(window("10:00-11:00")));
        assert_eq!(occurrence_count(&events[0]), 1);
    }

    #[test_log::test]
    fn test_badly_typed_channels_keep_event() {
        let events = single_occurrence_event(r#""channels": ["Main", null, 3]"#);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channels, vec!["Main", "3"]);

        let events = single_occurrence_event(r#""channels": null"#);
        assert_eq!(events.len(), 1);
        assert!(events[0].channels.is_empty());
        assert_eq!(occurrence_count(&events[0]), 1);
    }

    #[test_log::test]
    fn test_extras_as_object_keep_event() {
        let events = single_occurrence_event(
            r#""extra_occurrences": {"date": "2025-06-02", "time": "10:00-11:00"}"#,
        );

        assert_eq!(events.len(), 1);
        assert!(events[0].extra_occurrences.is_empty());
        assert_eq!(
            events[0].recurrence,
            Recurrence::SpecificDates(vec![date("2025-06-01")])
        );
        assert_eq!(occurrence_count(&events[0]), 1);
    }

    #[test_log::test]
    fn test_numeric_text_fields_are_stringified() {
        let events = single_occurrence_event(r#""poster": 5, "start_date": {"y": 2025}"#);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].poster, "5");
        assert_eq!(events[0].event_name, "Final");
        assert_eq!(occurrence_count(&events[0]), 1);
    }

    #[test]
    fn test_load_events_non_array() {
        assert!(load_events(r#"{"events": []}"#).unwrap().is_empty());
        assert!(load_events("not json").is_err());
    }
}
