use thiserror::Error;

/// Failure of a catalogue operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("book {0} not found")]
    NotFound(i32),

    #[error("{0}")]
    InvalidInput(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
