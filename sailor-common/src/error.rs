//! Common error types for the Sailor Skills services

use thiserror::Error;

/// Common result type for Sailor Skills operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Sailor Skills crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request conflicts with current state (slot taken, stock exhausted)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Third-party service (calendar, payments) failed
    #[error("Integration error: {0}")]
    Integration(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
