use std::convert::Infallible;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Progress for user {user_id} on card {card_id} was modified concurrently")]
    Conflict { user_id: String, card_id: i64 },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchedulerError {
    /// True for failures of the underlying progress store, as opposed to
    /// rejected input or missing records.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            SchedulerError::StorageFailure(_) | SchedulerError::StoreUnavailable(_)
        )
    }
}

// Lets `Grade` itself be passed where a fallible grade conversion is accepted.
impl From<Infallible> for SchedulerError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
