use thiserror::Error;

/// Errors raised while reading settings or by broken internal wiring.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting is present but unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Something the server sets up itself is missing, e.g. a depot entry.
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
