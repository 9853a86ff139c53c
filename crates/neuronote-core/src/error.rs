//! Core error types for neuronote-core.
//!
//! This module defines a comprehensive error hierarchy using thiserror
//! for better error handling and reporting across the library.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for neuronote-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Auth/session errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// ML service errors
    #[error("ML service error: {0}")]
    Ml(#[from] MlError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Scheduler errors.
///
/// The allocator has exactly one hard failure mode; every other degenerate
/// input produces a successful (possibly empty) schedule.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// Discretizing the calendar produced zero slots
    #[error("no available time slots")]
    NoAvailability,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Data directory could not be created or determined
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be created or determined
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Auth/session errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token is malformed or its signature does not match
    #[error("Invalid session token: {0}")]
    TokenInvalid(String),

    /// Token signature is valid but the token itself has expired
    #[error("Session token expired")]
    TokenExpired,

    /// No live session exists for the token
    #[error("Session expired or not found")]
    SessionExpired,
}

/// ML service client errors.
#[derive(Error, Debug)]
pub enum MlError {
    /// Base URL could not be parsed
    #[error("Invalid ML service URL: {0}")]
    InvalidBaseUrl(String),

    /// Request could not be sent
    #[error("ML request failed: {0}")]
    RequestFailed(String),

    /// Service answered with a non-success status
    #[error("ML service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to parse ML response: {0}")]
    InvalidResponse(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must not precede start ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
