//! Channel name to embeddable stream URL lookup.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{ScheduleError, ScheduleResult};

/// ## Summary
/// Parsed streams document: `{ "<channel>": { "iframe": "<url>" } }`.
///
/// Entries without a non-blank `iframe` string are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDirectory {
    urls: BTreeMap<String, String>,
}

impl StreamDirectory {
    /// ## Summary
    /// Parses the streams document.
    ///
    /// ## Errors
    /// Returns `ScheduleError::Json` for invalid JSON and
    /// `ScheduleError::InvalidDocument` if the top level is not an object.
    pub fn from_json(json: &str) -> ScheduleResult<Self> {
        let Value::Object(entries) = serde_json::from_str::<Value>(json)? else {
            return Err(ScheduleError::InvalidDocument(
                "streams document must be an object".to_string(),
            ));
        };

        let urls = entries
            .into_iter()
            .filter_map(|(channel, info)| {
                let url = info.get("iframe").and_then(Value::as_str)?.trim();
                if url.is_empty() {
                    tracing::debug!(channel = %channel, "Skipping stream without iframe URL");
                    return None;
                }
                Some((channel, url.to_string()))
            })
            .collect();

        Ok(Self { urls })
    }

    #[must_use]
    pub fn resolve(&self, channel: &str) -> Option<&str> {
        self.urls.get(channel).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// ## Summary
/// Picks the channel to play: `remembered` if it is one of `channels`,
/// otherwise the first channel.
#[must_use]
pub fn choose_channel<'a>(channels: &'a [String], remembered: Option<&str>) -> Option<&'a str> {
    remembered
        .and_then(|wanted| channels.iter().find(|c| c.as_str() == wanted))
        .or_else(|| channels.first())
        .map(String::as_str)
}
