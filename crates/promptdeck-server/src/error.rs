//! Error handling for the API server

use crate::models::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use promptdeck_engine::EngineError;
use thiserror::Error;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidQuery(_) => "INVALID_QUERY",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Config(_) | ApiError::Internal(_) | ApiError::Io(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Config(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            EngineError::Forbidden(msg) => ApiError::Forbidden(msg),
            EngineError::TemplateNotFound(msg) => ApiError::TemplateNotFound(msg),
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::InvalidQuery(msg) => ApiError::InvalidQuery(msg),
            EngineError::Transient(msg) => ApiError::Conflict(msg),
            EngineError::Storage(msg) | EngineError::SearchIndex(msg) => ApiError::Internal(msg),
            EngineError::Serialization(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ApiResponse::<()>::err(self.code(), self.to_string()));

        (status, body).into_response()
    }
}

// Convenience functions for common errors
impl ApiError {
    pub fn unauthorized(msg: &str) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }
}
