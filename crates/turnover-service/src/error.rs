use thiserror::Error;

use crate::feed::FeedError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] turnover_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] turnover_core::error::CoreError),

    #[error(transparent)]
    FeedError(#[from] FeedError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

impl ServiceError {
    /// Returns `true` when the database could not be reached at all.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::DatabaseError(e) if e.is_unavailable())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
