use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lodge_db::DbError;
use lodge_types::api::ErrorResponse;
use lodge_types::stay::StayRangeError;
use thiserror::Error;
use tracing::error;

/// Every handler failure. Rendered as `{ "success": false, "error": "..." }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("You do not have access to this {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Listing is not available for the selected dates")]
    Unavailable,

    /// The message is what the client sees; details are logged where the
    /// error is produced.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Unavailable => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ApiError::NotFound(what),
            DbError::Forbidden(what) => ApiError::Forbidden(what),
            DbError::Unavailable => ApiError::Unavailable,
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::AlreadyExists => ApiError::Conflict("Record already exists".into()),
            DbError::InvalidReference => {
                ApiError::Validation("Referenced record does not exist".into())
            }
            err @ (DbError::InvalidData(_) | DbError::LockPoisoned | DbError::Sqlite(_)) => {
                error!("Database error: {:?}", err);
                ApiError::Internal("Internal server error")
            }
        }
    }
}

impl From<StayRangeError> for ApiError {
    fn from(err: StayRangeError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
