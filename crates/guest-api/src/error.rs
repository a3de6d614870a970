//! Error types for the guest API.

use crate::auth::AuthError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guest_core::{FieldErrors, GuestError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    #[error("Not found")]
    NotFound,

    #[error("Cannot find country by phone number")]
    UnresolvedCountry,

    #[error("Wrong email or password!")]
    InvalidCredentials,

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Too Many Attempts.")]
    RateLimitExceeded,

    #[error("{0}")]
    BadRequest(String),

    #[error("Expected request with Content-Type: application/json")]
    UnsupportedMediaType,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            // Existing clients expect a 200 for this outcome.
            ApiError::UnresolvedCountry => StatusCode::OK,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(errors) => ErrorResponse {
                message: "The given data was invalid.".to_string(),
                errors: Some(errors),
            },
            ApiError::Storage(ref e) | ApiError::Internal(ref e) => {
                error!(error = %e, "Request failed with server error");
                ErrorResponse {
                    message: "Server Error".to_string(),
                    errors: None,
                }
            }
            other => ErrorResponse {
                message: other.to_string(),
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GuestError> for ApiError {
    fn from(e: GuestError) -> Self {
        match e {
            GuestError::Validation(errors) => ApiError::Validation(errors),
            GuestError::NotFound(_) => ApiError::NotFound,
            GuestError::UnresolvedCountry(_) => ApiError::UnresolvedCountry,
            e @ GuestError::IdsExhausted => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Unauthenticated => ApiError::Unauthenticated,
            AuthError::Hashing(e) => ApiError::Internal(e),
            e @ AuthError::IdsExhausted => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => {
                let text = rejection.body_text();
                // "<summary>: <path>: <serde message>"
                let detail = text.split_once(": ").map_or(text.as_str(), |(_, rest)| rest);
                let field = rejected_field(detail).unwrap_or("body");

                let mut errors = FieldErrors::new();
                errors.add(field, format!("The {} field has an invalid type.", field));
                ApiError::Validation(errors)
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::BadRequest("The request body is not valid JSON.".to_string())
            }
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType,
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Field path leading a serde error message, e.g. `country_id` in
/// `country_id: invalid type: string "abc", expected u64`.
fn rejected_field(detail: &str) -> Option<&str> {
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then_some(path)
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Storage(format!("JSON serialization error: {}", e))
    }
}
