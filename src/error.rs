//! Error types for taskhub
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (malformed input, bad config)
//! - 3: Forbidden (authenticated but not authorized for the target task)
//! - 4: Not found (referenced task or user absent)
//! - 5: Operation failed (storage or unclassified failure)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskhub CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const FORBIDDEN: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const OPERATION_FAILED: i32 = 5;
}

/// Main error type for taskhub operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Authorization failures (exit code 3)
    #[error("No caller identity (pass --user or set TASKHUB_USER)")]
    Unauthenticated,

    #[error("Not authorized: {0}")]
    Forbidden(String),

    // Missing records (exit code 4)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Operation failures (exit code 5)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Unauthenticated | Error::Forbidden(_) => exit_codes::FORBIDDEN,

            Error::TaskNotFound(_) | Error::UserNotFound(_) => exit_codes::NOT_FOUND,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable kind string for the JSON error envelope
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "validation",
            exit_codes::FORBIDDEN => "forbidden",
            exit_codes::NOT_FOUND => "not_found",
            _ => "unexpected",
        }
    }

    /// Message safe to show callers. Validation, authorization, and
    /// not-found failures carry their specific message; operation failures
    /// stay generic so storage internals never leak through the boundary.
    pub fn public_message(&self) -> String {
        match self.exit_code() {
            exit_codes::OPERATION_FAILED => "Operation failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for taskhub operations
pub type Result<T> = std::result::Result<T, Error>;
