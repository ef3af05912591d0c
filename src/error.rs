//! Error types for Parsesmith
//!
//! Centralized error handling using thiserror. Failures of a candidate parser
//! are not errors; they are recorded as failing test outcomes and retried.
//! Everything in here aborts the correction loop.

use thiserror::Error;

/// All error types that can occur in Parsesmith
#[derive(Debug, Error)]
pub enum ParsesmithError {
    /// Generation capability unreachable, rejected the request, or returned unusable text
    #[error("Generation error: {0}")]
    Generation(String),

    /// Input artifact missing or unreadable
    #[error("Input artifact error: {0}")]
    InputArtifact(String),

    /// Reference dataset missing or malformed
    #[error("Reference dataset error: {0}")]
    Reference(String),

    /// Source could not be persisted or the harness could not be started
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Configuration or startup environment problem
    #[error("Config error: {0}")]
    Config(String),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error; the csv crate already prefixes its messages
    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for Parsesmith operations
pub type Result<T> = std::result::Result<T, ParsesmithError>;
