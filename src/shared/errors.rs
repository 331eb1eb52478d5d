//! Error handling for the application

use std::time::Duration;
use thiserror::Error;

/// Log stream errors. Always transient: the watcher backs off and resubscribes.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Websocket connect failed: {0}")]
    Connect(String),

    #[error("Logs subscription failed: {0}")]
    Subscribe(String),

    #[error("Log stream closed by remote")]
    Closed,

    #[error("No log notification within {0:?}")]
    Timeout(Duration),
}

/// Security / market collaborator errors. The candidate is discarded.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Watchlist persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Watchlist IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watchlist serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Alert delivery errors
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Alert rejected by endpoint: {0}")]
    Rejected(String),
}

/// Startup configuration errors. Fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Alert error: {0}")]
    AlertError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<StreamError> for AppError {
    fn from(err: StreamError) -> Self {
        AppError::StreamError(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::ServiceError(err.to_string())
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<AlertError> for AppError {
    fn from(err: AlertError) -> Self {
        AppError::AlertError(err.to_string())
    }
}
