//! Error taxonomy for the report pipeline.
//!
//! Only [`ConfigError`] is fatal. Everything else is logged by the caller and
//! the current cycle carries on.

use std::path::PathBuf;

use thiserror::Error;

/// Missing or malformed configuration or credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(
        "Weather API key not found.\n\
         Hint: export {0}=<your OpenWeather API key>"
    )]
    MissingApiKey(&'static str),

    #[error("Failed to write config file {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

/// Failure to obtain a weather record for one location.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Delivery failure from a notification channel.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("{failed} of {total} notification channels failed")]
    Partial { failed: usize, total: usize },
}

/// Invalid job registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Interval must be at least one minute")]
    InvalidInterval,
}
