//! Error types for the resume search engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types that can occur in engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input could not be turned into usable text. User-correctable.
    #[error("Extraction failed: {reason}")]
    Extraction { reason: String },

    /// Search was issued before any document was successfully indexed.
    #[error("No documents have been indexed yet")]
    NoData,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, EngineError::Extraction { .. } | EngineError::NoData)
    }
}
