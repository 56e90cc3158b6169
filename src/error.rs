// src/error.rs

//! Unified error handling for the scorecard monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scope or database document failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetching a score failed
    #[error("Fetch error for {repository}: {message}")]
    Fetch { repository: String, message: String },

    /// The existing report cannot be spliced safely
    #[error("Splice error: {0}")]
    Splice(String),

    /// A git command failed
    #[error("Git error running `{command}`: {message}")]
    Git { command: String, message: String },

    /// GitHub API call failed
    #[error("GitHub error: {0}")]
    GitHub(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for a repository.
    pub fn fetch(repository: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Fetch {
            repository: repository.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a splice error.
    pub fn splice(message: impl Into<String>) -> Self {
        Self::Splice(message.into())
    }

    /// Create a git error with the failing command.
    pub fn git(command: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Git {
            command: command.into(),
            message: message.to_string(),
        }
    }

    /// Create a GitHub API error.
    pub fn github(message: impl fmt::Display) -> Self {
        Self::GitHub(message.to_string())
    }
}
