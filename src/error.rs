//! Error types for the proposal pipeline.
//!
//! The pipeline stages themselves never fail on well-formed field input;
//! these variants cover the JSON, file, and configuration boundaries.

use std::io;
use thiserror::Error;

/// Result type alias for proposal-forge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the crate's input/output boundaries.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON in a fields record, config, or serialised document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The fields payload was valid JSON but not a key-value record.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Pipeline configuration rejected before any stage ran.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
