//!
//! # Custom Error Handling
//!
//! This module defines the HTTP-facing error type `AppError`. Handlers and the
//! authorization middleware return it, and it renders itself as a JSON body
//! with the matching status code.
//!
//! Errors from the session core (`SessionError`) convert into `AppError` with
//! the login-time mapping: an unknown email is a 404 and a password mismatch
//! is a 401. The authorization middleware applies its own, coarser mapping
//! (see `auth::middleware`).

use crate::auth::{SessionError, StoreError};
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Represents an unauthorized access attempt (HTTP 401).
    /// Typically used when authentication fails or is required but missing.
    Unauthorized(String),
    /// Represents a request body that could not be parsed (HTTP 400).
    BadRequest(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    NotFound(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from the token store or user directory (HTTP 500).
    DatabaseError(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    /// Wraps errors from the `validator` crate.
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
            // Store failures are not described to the client.
            AppError::DatabaseError(_) => "Internal server error",
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Login-time mapping of session errors.
impl From<SessionError> for AppError {
    fn from(error: SessionError) -> AppError {
        match error {
            SessionError::InvalidCredentials => AppError::Unauthorized(error.to_string()),
            SessionError::NotFound(msg) => AppError::NotFound(msg),
            SessionError::InvalidToken(_) => AppError::Unauthorized(error.to_string()),
            SessionError::Store(store_error) => store_error.into(),
            SessionError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::DatabaseError("connection reset".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::ValidationError("email: invalid".into());
        assert_eq!(error.error_response().status(), 422);
    }

    #[test]
    fn test_status_code_matches_rendered_response() {
        let errors = vec![
            (AppError::Unauthorized("Missing token".into()), 401),
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::NotFound("User not found".into()), 404),
            (AppError::InternalServerError("Server error".into()), 500),
            (AppError::DatabaseError("connection reset".into()), 500),
            (AppError::ValidationError("email: invalid".into()), 422),
        ];

        for (error, expected) in errors {
            assert_eq!(error.status_code(), expected, "status_code for {}", error);
            assert_eq!(
                error.error_response().status(),
                error.status_code(),
                "rendered status for {}",
                error
            );
        }
    }

    #[actix_rt::test]
    async fn test_error_body_is_json() {
        let resp = AppError::Unauthorized("Missing token".into()).error_response();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing token");

        let resp = AppError::DatabaseError("connection reset".into()).error_response();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_session_error_login_mapping() {
        let status = |e: SessionError| AppError::from(e).error_response().status();

        assert_eq!(status(SessionError::InvalidCredentials), 401);
        assert_eq!(status(SessionError::NotFound("User not found".into())), 404);
        assert_eq!(status(SessionError::InvalidToken("bad".into())), 401);
        assert_eq!(status(SessionError::Store(StoreError::DuplicateCredential)), 500);
        assert_eq!(status(SessionError::Internal("boom".into())), 500);
    }
}
