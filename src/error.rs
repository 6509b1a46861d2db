// =============================================================================
// ERROR MODULE
// =============================================================================
// This module defines the HTTP-facing error type and its responses.
//
// LEARNING NOTES:
// - Rust doesn't have exceptions; it uses Result<T, E> for error handling
// - thiserror crate makes defining error types easy
// - We convert our errors to HTTP responses using Axum's IntoResponse
//
// ERROR HANDLING PHILOSOPHY:
// - Store failures keep their typed outcome all the way to the client
// - Errors should be informative but not leak internal details
// =============================================================================

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::{ErrorKind, StoreError};

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
#[derive(Debug, Error)]
pub enum AppError {
    // -------------------------------------------------------------------------
    // STORE ERRORS
    // -------------------------------------------------------------------------
    /// A rent or return was refused by the store
    #[error(transparent)]
    Store(#[from] StoreError),

    // -------------------------------------------------------------------------
    // REQUEST ERRORS
    // -------------------------------------------------------------------------
    /// Resource not found outside of a store mutation (e.g. GET by id)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// HTTP RESPONSE CONVERSION
// =============================================================================
impl AppError {
    /// HTTP status for this error.
    ///
    /// Store failures map by kind: NotFound -> 404, InvalidState -> 409,
    /// Inconsistent -> 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InvalidState => StatusCode::CONFLICT,
                ErrorKind::Inconsistent => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // The kind travels in `details` so clients can branch on it
            AppError::Store(err) => {
                let kind = match err.kind() {
                    ErrorKind::NotFound => "not_found",
                    ErrorKind::InvalidState => "invalid_state",
                    ErrorKind::Inconsistent => "inconsistent",
                };
                ErrorResponse::with_details(err.code(), err.to_string(), kind)
            }
            AppError::NotFound(msg) => ErrorResponse::new("NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => ErrorResponse::new("BAD_REQUEST", msg.clone()),
        };

        tracing::error!(
            error_code = %body.error,
            status = status.as_u16(),
            message = %body.message,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// EXTRACTOR REJECTIONS
// =============================================================================
// Malformed bodies, query strings and path segments are all 400 BAD_REQUEST
// with the JSON error body.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_by_kind() {
        let cases = [
            (StoreError::MovieNotFound(9), StatusCode::NOT_FOUND),
            (StoreError::UserNotFound(9), StatusCode::NOT_FOUND),
            (StoreError::RentalNotFound(9), StatusCode::NOT_FOUND),
            (StoreError::MovieNotAvailable(9), StatusCode::CONFLICT),
            (StoreError::RentalAlreadyReturned(9), StatusCode::CONFLICT),
            (
                StoreError::Inconsistent("broken".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn request_errors_map_to_status() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("movie 1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_error_message_is_passed_through() {
        let err = AppError::from(StoreError::MovieNotAvailable(102));
        assert_eq!(err.to_string(), "Movie 102 is already rented");
    }
}
