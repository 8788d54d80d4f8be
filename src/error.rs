//! Error types for the analytics cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer and the dataset loader.
///
/// Failures raised by caller-supplied compute functions never pass through
/// this type; the get-or-compute entry points hand them back unchanged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid capacity or TTL, rejected at construction or call time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backing data file could not be read or parsed
    #[error("Data loading failed: {0}")]
    DataLoad(String),

    /// Backing data file parsed but failed validation
    #[error("Data validation failed: {0}")]
    DataValidation(String),

    /// Internal error (background task failure and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
