//! Error types for read planning.

use coverage_common::CoverageError;
use projection::TransformError;
use thiserror::Error;

/// Errors that can occur while planning a coverage read.
///
/// Only [`ReaderError::UnsupportedTransformKind`], configuration and input
/// validation errors ever reach callers of the planning entry points;
/// reprojection failures and degenerate geometry are absorbed by fallbacks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// The grid-to-world transform is not affine where an affine one is required.
    #[error("unsupported grid-to-world transform: {0}")]
    UnsupportedTransformKind(String),

    /// A CRS lookup or coordinate transform failed.
    #[error("reprojection failed: {0}")]
    Reprojection(#[from] TransformError),

    /// A computed distance or resolution collapsed to zero or NaN.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] CoverageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ReaderError {
    /// Create an UnsupportedTransformKind error.
    pub fn unsupported_transform(msg: impl Into<String>) -> Self {
        Self::UnsupportedTransformKind(msg.into())
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Create a ConfigError.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether a simpler estimate can be substituted for the failed computation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Reprojection(_) | Self::DegenerateGeometry(_))
    }
}

/// Result type for read planning operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
