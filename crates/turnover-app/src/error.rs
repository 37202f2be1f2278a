use diesel::result::DatabaseErrorKind;
use salvo::http::StatusCode;
use salvo::prelude::{Json, Writer};
use salvo::{Depot, Request, Response, async_trait};
use serde_json::json;
use thiserror::Error;
use turnover_core::error::CoreError;
use turnover_db::error::DbError;
use turnover_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Database error: {0}")]
    QueryError(#[from] diesel::result::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

fn diesel_status(error: &diesel::result::Error) -> StatusCode {
    match error {
        diesel::result::Error::NotFound => StatusCode::NOT_FOUND,
        diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            _,
        ) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// ## Summary
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ServiceError(ServiceError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) | Self::ServiceError(ServiceError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::ServiceError(ServiceError::Conflict(_)) => StatusCode::CONFLICT,
            Self::ServiceError(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryError(e)
            | Self::ServiceError(ServiceError::DieselError(e))
            | Self::DatabaseError(DbError::DatabaseError(e)) => diesel_status(e),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body. Server-side failures are not
    /// described to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::SERVICE_UNAVAILABLE => "Database unavailable".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::CONFLICT if !matches!(self, Self::ServiceError(ServiceError::Conflict(_))) => {
                "Conflicts with existing data".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        res.status_code(status);
        res.render(Json(json!({
            "success": false,
            "error": self.public_message(),
        })));
    }
}

#[cfg(test)]
mod tests {
    use diesel_async::pooled_connection::bb8::RunError;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ServiceError::ValidationError("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ServiceError::NotFound("event".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ServiceError::Conflict("final".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(DbError::PoolError(RunError::TimedOut)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ServiceError::from(DbError::PoolError(RunError::TimedOut)))
                .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ServiceError::InvariantViolation("broken")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(diesel::result::Error::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_server_errors_are_not_described() {
        let err = AppError::from(ServiceError::InvariantViolation("secret detail"));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::from(ServiceError::Conflict("report is final".into()));
        assert_eq!(err.public_message(), "Conflict: report is final");
    }
}
