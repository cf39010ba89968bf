/// Name used for the binary and outgoing requests
pub const APP_NAME: &str = "onair";
pub const USER_AGENT: &str = const_str::concat!(APP_NAME, "/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_EVENTS_SOURCE: &str = "events.json";
pub const DEFAULT_STREAMS_SOURCE: &str = "streams.json";

/// Joins an event id and an occurrence key into an occurrence id.
pub const OCCURRENCE_ID_SEPARATOR: &str = "__";

/// `date_type` value that forces specific-date semantics.
pub const DATE_TYPE_SPECIFIC: &str = "specific";
