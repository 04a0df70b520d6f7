//! Error types for cohstats-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the persisted settings store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings file {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Settings value for '{key}' has the wrong shape: {source}")]
    Value {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No platform config directory available")]
    NoConfigDir,

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),
}

/// Errors from the leaderboard and team APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(String),

    #[error("API rejected the request: {message}")]
    Rejected { message: String },

    #[error("API response carried no result status")]
    MissingResult,

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("Request timed out: {}", e)
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else if let Some(status) = e.status() {
            format!("HTTP {} error: {}", status.as_u16(), e)
        } else {
            format!("HTTP error: {}", e)
        };
        ApiError::Http(message)
    }
}

/// Errors from reading the game log.
#[derive(Debug, Error)]
pub enum LogParseError {
    #[error("Failed to read log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Main error type for cohstats-core
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    LogParse(#[from] LogParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cohstats-core operations
pub type Result<T> = std::result::Result<T, Error>;
