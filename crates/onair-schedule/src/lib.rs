//! Schedule engine for live and upcoming stream events.
//!
//! Expands event definitions into concrete occurrences, classifies them as
//! upcoming, live or ended, and derives the views the front ends render.

pub mod error;
pub mod expand;
pub mod model;
pub mod occurrence;
pub mod player;
pub mod status;
pub mod streams;
pub mod view;

pub use expand::event_occurrences;
pub use model::{Event, ExtraOccurrence, Recurrence, load_events};
pub use occurrence::{Occurrence, OccurrenceSource};
pub use status::{OccurrenceStatus, next_boundary};
