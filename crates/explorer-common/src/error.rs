//! Error types for climate-explorer crates.

use thiserror::Error;

/// Result type alias using ExplorerError.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Primary error type for resolver and fetch operations.
#[derive(Debug, Error)]
pub enum ExplorerError {
    // === Transport Errors ===
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timeout")]
    Timeout,

    // === Payload Errors ===
    #[error("Failed to decode response: {0}")]
    Decode(String),

    // === Catalog Errors ===
    #[error("Invalid catalog entry '{name}': {message}")]
    InvalidCatalogEntry { name: String, message: String },

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Decode(format!("JSON error: {}", err))
    }
}
