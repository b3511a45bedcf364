//! Error types for zapstats-core

use thiserror::Error;

/// Main error type for the zapstats-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Message feed error (store unreachable, query rejected)
    #[error("feed error: {0}")]
    Feed(String),
}

/// Result type alias for zapstats-core
pub type Result<T> = std::result::Result<T, Error>;
