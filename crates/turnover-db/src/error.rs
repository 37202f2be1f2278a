use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl DbError {
    /// Returns `true` when the underlying failure is the pool being unable to
    /// hand out a connection.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::PoolError(_))
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
