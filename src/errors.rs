//! Unified application error type.
//! Every module (db, core, cli, utils) returns AppError so that validation
//! failures, store failures and lookups surface the same way to callers.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Store
    // ---------------------------
    #[error("Store unavailable: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Validation (rejected before any write)
    // ---------------------------
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    // ---------------------------
    // Lookups
    // ---------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    // ---------------------------
    // Collaborators
    // ---------------------------
    #[error("Credential error: {0}")]
    Credential(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// True for errors raised by input validation, i.e. before the store was touched.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            AppError::InvalidStatus(_)
                | AppError::InvalidArgument(_)
                | AppError::InvalidDate(_)
                | AppError::InvalidTime(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
