//! Error types for mirp-sync
//!
//! The synchronisation core never fails: normalisers salvage what they can
//! and seeks clamp. These errors only come out of the edges that read files
//! or bind media.

use thiserror::Error;

/// Main error type for mirp-sync
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be decoded at all
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Media element missing or unusable
    #[error("Media error: {0}")]
    Media(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Errors bubbled up from mirp-common
    #[error(transparent)]
    Common(#[from] mirp_common::Error),
}

/// Result type alias for mirp-sync operations
pub type Result<T> = std::result::Result<T, Error>;
