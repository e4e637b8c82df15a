//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum VimError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Session missing or expired
    #[error("Authentication required")]
    Unauthorized,

    /// Managed object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side method fault
    #[error("{type_name}: {message}")]
    Fault { type_name: String, message: String },

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VimError {
    /// Fault type name, if the server reported one
    pub fn fault_type(&self) -> Option<&str> {
        match self {
            VimError::Fault { type_name, .. } => Some(type_name),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type VimResult<T> = Result<T, VimError>;
