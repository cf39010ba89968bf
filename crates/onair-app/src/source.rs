//! Loading the events and streams documents from files or URLs.

use onair_core::config::SourcesConfig;
use onair_core::constants::USER_AGENT;
use onair_schedule::model::{Event, load_events};
use onair_schedule::streams::StreamDirectory;
use reqwest::header::{CACHE_CONTROL, HeaderValue};

use crate::error::{AppError, AppResult};

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetches both documents on demand. Nothing is cached between loads.
#[derive(Debug, Clone)]
pub struct DataSources {
    client: reqwest::Client,
    events: String,
    streams: String,
}

impl DataSources {
    /// ## Summary
    /// Builds the HTTP client used for remote sources.
    ///
    /// ## Errors
    /// Returns `AppError::Fetch` if the HTTP client cannot be constructed.
    pub fn new(config: &SourcesConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::fetch("http client", e))?;

        Ok(Self {
            client,
            events: config.events.clone(),
            streams: config.streams.clone(),
        })
    }

    async fn fetch(&self, source: &str) -> AppResult<String> {
        if !is_remote(source) {
            tracing::debug!(path = %source, "Reading document from file");
            return tokio::fs::read_to_string(source)
                .await
                .map_err(|e| AppError::fetch(source, e));
        }

        tracing::debug!(url = %source, "Fetching document");
        let response = self
            .client
            .get(source)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await
            .map_err(|e| AppError::fetch(source, e))?
            .error_for_status()
            .map_err(|e| AppError::fetch(source, e))?;

        response.text().await.map_err(|e| AppError::fetch(source, e))
    }

    /// ## Summary
    /// Fetches and parses the events document.
    ///
    /// ## Errors
    /// Returns `AppError::Fetch` if the source cannot be read and a schedule
    /// error if it is not valid JSON.
    pub async fn load_events(&self) -> AppResult<Vec<Event>> {
        let body = self.fetch(&self.events).await?;
        Ok(load_events(&body)?)
    }

    /// ## Summary
    /// Fetches and parses the streams document.
    ///
    /// ## Errors
    /// Returns `AppError::Fetch` if the source cannot be read and a schedule
    /// error if it is malformed.
    pub async fn load_streams(&self) -> AppResult<StreamDirectory> {
        let body = self.fetch(&self.streams).await?;
        let directory = StreamDirectory::from_json(&body)?;
        tracing::debug!(channels = directory.len(), "Loaded streams document");
        Ok(directory)
    }
}
