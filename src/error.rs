//! Error types for tracking-rs.

use std::time::Duration;

use thiserror::Error;

use crate::model::EventId;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller input rejected before anything reaches the queue.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode task payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode task payload: {0}")]
    Decode(String),

    /// A delivery was routed to a handler that does not own its task type.
    #[error("unexpected task type: {found} (expected {expected})")]
    UnexpectedTaskType { expected: String, found: String },

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("dispatch timed out after {0:?}")]
    DispatchTimeout(Duration),

    #[error("persist event {id}: {reason}")]
    Persistence { id: EventId, reason: String },

    #[error("task timed out after {0:?}")]
    TaskTimeout(Duration),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Dispatch failures surface to the caller as server errors.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Error::Dispatch(_) | Error::DispatchTimeout(_))
    }

    /// Whether the queue runtime should redeliver a task that failed with
    /// this error. Routing defects and invalid input never heal on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::Validation(_) | Error::UnexpectedTaskType { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
