use thiserror::Error;

/// Schedule document and ingestion errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
