//! Domain error types for the homework results server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::services::github_oidc::AuthenticationError;
use crate::services::store::StoreError;

/// Generic message returned for every token verification failure.
pub const TOKEN_VALIDATION_FAILED_MSG: &str = "Token validation failed";

/// Submission or query input that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Mismatch in repository info")]
    RepositoryMismatch,

    #[error("Repository must look like '.../<username>/<userId>-<taskId>'")]
    MalformedRepository,

    #[error("Both userId and taskId query parameters are required")]
    MissingQueryParams,

    #[error("Query parameters contain unsupported characters")]
    InvalidQueryParams,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "missing_fields",
            ValidationError::RepositoryMismatch => "repository_mismatch",
            ValidationError::MalformedRepository => "malformed_repository",
            ValidationError::MissingQueryParams => "missing_query_params",
            ValidationError::InvalidQueryParams => "invalid_query_params",
            ValidationError::MalformedBody(_) => "malformed_body",
        }
    }
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or unusable Authorization header
    #[error("{0}")]
    Unauthorized(String),

    /// Token verification failed; the reason is logged, never returned
    #[error("{}", TOKEN_VALIDATION_FAILED_MSG)]
    Authentication(#[from] AuthenticationError),

    /// Invalid input data
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Result store operation failed
    #[error("Backend error: {0}")]
    Backend(#[from] StoreError),

    /// Route exists but not for this method; holds the allowed methods
    #[error("Method not allowed, only {0} is permissible.")]
    MethodNotAllowed(&'static str),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message, reason) = match self {
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string(), None),
            AppError::Authentication(err) => {
                tracing::warn!(reason = err.reason(), "OIDC verification failed: {}", err);
                ("UNAUTHORIZED", self.to_string(), None)
            }
            AppError::Validation(err) => ("INVALID_INPUT", err.to_string(), Some(err.reason())),
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string(), None),
            AppError::Backend(err) => {
                tracing::error!("Result store error: {}", err);
                (
                    "BACKEND_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::MethodNotAllowed(_) => ("METHOD_NOT_ALLOWED", self.to_string(), None),
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let AppError::MethodNotAllowed(allowed) = self {
            builder.insert_header((actix_web::http::header::ALLOW, *allowed));
        }

        builder.json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
            reason: reason.map(str::to_string),
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Validation reason code, present on 400 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
