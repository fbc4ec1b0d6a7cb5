//! Server configuration management

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// CORS allowed origins ("*" for permissive)
    pub cors_origins: Vec<String>,

    /// Search result limit applied when the caller gives none
    pub default_search_limit: usize,

    /// Upper bound on the caller-supplied search limit
    pub max_search_limit: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid PORT value".to_string()))?,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            default_search_limit: std::env::var("DEFAULT_SEARCH_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid DEFAULT_SEARCH_LIMIT value".to_string()))?,
            max_search_limit: std::env::var("MAX_SEARCH_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid MAX_SEARCH_LIMIT value".to_string()))?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            default_search_limit: 20,
            max_search_limit: 50,
        }
    }
}
