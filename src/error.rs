// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unknown symbol: {0}")]
    Lookup(String),

    #[error("Order rejected: {0}")]
    Order(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data not found: {0}")]
    DataNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    /// Fatal errors abort the process; the rest are reported and the run continues.
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Auth(_) => true,
            AppError::Lookup(_) => true,
            AppError::Config(_) => true,
            AppError::Http(_) => true,
            AppError::Order(_) => false,
            AppError::Validation(_) => false,
            AppError::DataNotFound(_) => false,
            AppError::Serialization(_) => true,
            AppError::Io(_) => true,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, AppError>;
