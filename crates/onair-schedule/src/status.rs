//! Live/upcoming/ended classification and refresh boundaries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::occurrence::Occurrence;

/// Where an occurrence stands relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Upcoming,
    Live,
    Ended,
    /// No occurrence was supplied.
    Invalid,
}

impl OccurrenceStatus {
    /// ## Summary
    /// Classifies `occ` at `now`.
    ///
    /// Live covers `start_dt..=end_dt`, inclusive at both ends. A missing
    /// occurrence is `Invalid` rather than an error.
    #[must_use]
    pub fn of(occ: Option<&Occurrence>, now: &DateTime<Utc>) -> Self {
        let Some(occ) = occ else {
            return Self::Invalid;
        };
        if *now < occ.start_dt {
            Self::Upcoming
        } else if *now <= occ.end_dt {
            Self::Live
        } else {
            Self::Ended
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Live => "live",
            Self::Ended => "ended",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ## Summary
/// Earliest future instant at which some occurrence changes status.
///
/// An upcoming occurrence contributes its start; one that has started and not
/// yet reached its end contributes its end. Returns `None` when the set is
/// empty or everything has ended.
#[must_use]
pub fn next_boundary<'a, I>(occurrences: I, now: &DateTime<Utc>) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a Occurrence>,
{
    occurrences
        .into_iter()
        .filter_map(|occ| {
            if *now < occ.start_dt {
                Some(occ.start_dt.with_timezone(&Utc))
            } else if *now < occ.end_dt {
                Some(occ.end_dt.with_timezone(&Utc))
            } else {
                None
            }
        })
        .min()
}
