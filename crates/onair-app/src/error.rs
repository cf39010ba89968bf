use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to fetch {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error(transparent)]
    ScheduleError(#[from] onair_schedule::error::ScheduleError),

    #[error(transparent)]
    CoreError(#[from] onair_core::error::CoreError),
}

impl AppError {
    pub(crate) fn fetch(source_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
