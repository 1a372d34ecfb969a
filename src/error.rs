use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    auth::Rejection,
    credentials::{HashError, PolicyViolation},
    repository::RepoError,
    session::SessionError,
    visibility::InvalidCategory,
};

/// ApiError
///
/// The single error type returned by guards, the visibility filter and handlers.
/// Each variant owns its status code. 401 means "log in", 403 means "logging in
/// will not help".
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("{0}")]
    Conflict(String),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("Already authenticated")]
    AlreadyAuthenticated,
    #[error("{0}")]
    NotFound(String),
    /// Persistence, hashing or session backend failure. The detail is logged only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Policy(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::AlreadyAuthenticated => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// --- Conversions ---

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ApiError::NotFound("Resource not found".into()),
            RepoError::UniqueViolation => ApiError::Conflict("Resource already exists".into()),
            RepoError::InvalidReference => {
                ApiError::Validation("Referenced resource does not exist".into())
            }
            RepoError::Database(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Missing field, wrong type or unknown enum value. axum's text names the field.
            JsonRejection::JsonDataError(err) => ApiError::Validation(err.body_text()),
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::Validation("Expected Content-Type: application/json".into())
            }
            _ => ApiError::Validation("Invalid JSON format".into()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<InvalidCategory> for ApiError {
    fn from(err: InvalidCategory) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::AlreadyAuthenticated => ApiError::AlreadyAuthenticated,
            Rejection::Unauthenticated => ApiError::Unauthenticated,
            Rejection::InsufficientRole => ApiError::Forbidden("Admin access required".into()),
        }
    }
}
