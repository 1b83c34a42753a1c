//! Error types for tripleflow-core.
//!
//! Minimal error types without any I/O dependencies.

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Invalid triple pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid column span {start}..={end} for {count} triple patterns")]
    InvalidColumnSpan {
        start: usize,
        end: usize,
        count: usize,
    },

    #[error("Offset {offset} out of range for row of size {size}")]
    OffsetOutOfRange { offset: usize, size: usize },

    #[error("Failed to make a triple match for column {column}: {reason}")]
    MatchFailed { column: usize, reason: String },

    #[error("Invalid row source state: {0}")]
    InvalidState(String),

    #[error("Row limit exceeded: {0}")]
    LimitExceeded(usize),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl serde::Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
