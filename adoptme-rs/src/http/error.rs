use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::ValidationError;

/// Router-boundary error, rendered as `{"status": "error", "error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    MethodNotAllowed(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "status": "error",
            "error": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEmail(_) => ApiError::Conflict("User already exists"),
            DbError::UserNotFound(_) => ApiError::NotFound("User not found"),
            DbError::PetNotFound(_) => ApiError::NotFound("Pet not found"),
            DbError::AdoptionNotFound(_) => ApiError::NotFound("Adoption not found"),
            DbError::AlreadyAdopted(_) => ApiError::BadRequest(String::from("Pet is already adopted")),
            DbError::PetAdopted(_) => ApiError::Conflict("Adopted pets cannot be deleted"),
            DbError::UserHasPets(_) => ApiError::Conflict("User has adopted pets"),
            DbError::UnsupportedUrl(_)
            | DbError::Read { .. }
            | DbError::Parse { .. }
            | DbError::Write { .. } => {
                error!(error = %err, "database failure");
                ApiError::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) => ApiError::Unauthorized("Invalid session"),
            AuthError::TtlOverflow(_) => {
                error!(error = %err, "session issue failed");
                ApiError::Internal
            }
            AuthError::Hash(_) | AuthError::MalformedHash(_) | AuthError::Worker(_) => {
                error!(error = %err, "password handling failed");
                ApiError::Internal
            }
        }
    }
}
