//! Error types for the promptdeck engine

use crate::store::StoreError;
use thiserror::Error;

/// Engine-specific errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not the owner: {0}")]
    Forbidden(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Transient storage failure after retries: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Search index error: {0}")]
    SearchIndex(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::TemplateNotFound(id),
            StoreError::Conflict(msg) => EngineError::Transient(msg),
            StoreError::Backend(msg) => EngineError::Storage(msg),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
