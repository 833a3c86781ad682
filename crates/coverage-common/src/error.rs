//! Error types for coverage value types.

use thiserror::Error;

/// Result type alias using CoverageError.
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Errors raised while building or parsing shared coverage types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoverageError {
    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid grid range: {0}")]
    InvalidGridRange(String),
}

impl CoverageError {
    /// Create an InvalidCrs error.
    pub fn invalid_crs(msg: impl Into<String>) -> Self {
        Self::InvalidCrs(msg.into())
    }

    /// Create an InvalidEnvelope error.
    pub fn invalid_envelope(msg: impl Into<String>) -> Self {
        Self::InvalidEnvelope(msg.into())
    }

    /// Create an InvalidGridRange error.
    pub fn invalid_grid_range(msg: impl Into<String>) -> Self {
        Self::InvalidGridRange(msg.into())
    }
}
