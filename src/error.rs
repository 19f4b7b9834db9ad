//! Domain-specific error types for eti-signups

use thiserror::Error;

/// Main error type for the signup list core
#[derive(Error, Debug)]
pub enum EtiSignupsError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for EtiSignupsError {
    fn from(err: anyhow::Error) -> Self {
        EtiSignupsError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EtiSignupsError {
    fn from(err: serde_json::Error) -> Self {
        EtiSignupsError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<surrealdb::Error> for EtiSignupsError {
    fn from(err: surrealdb::Error) -> Self {
        EtiSignupsError::Database {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EtiSignupsError {
    fn from(err: toml::de::Error) -> Self {
        EtiSignupsError::Config {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for EtiSignupsError {
    fn from(err: chrono::ParseError) -> Self {
        EtiSignupsError::Validation {
            message: format!("Date parsing error: {}", err),
        }
    }
}

/// Result type alias for signup operations
pub type Result<T> = std::result::Result<T, EtiSignupsError>;
