//! Request-level error kinds
//!
//! Unknown categories are never an error; they are absorbed by the fallback
//! encoding in [`crate::encoding`].

use thiserror::Error;

/// Failure of a single advisory request.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// A required trained artifact is not loaded. Not retryable until reload.
    #[error("{0} not loaded")]
    Unavailable(&'static str),

    /// No record matched after all fallbacks.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure while assembling features or invoking a model.
    #[error("computation failed: {0}")]
    Computation(String),
}

impl AdvisorError {
    /// Wrap an internal error as an opaque computation failure.
    pub fn computation(err: impl std::fmt::Display) -> Self {
        AdvisorError::Computation(err.to_string())
    }
}

pub type AdvisorResult<T> = std::result::Result<T, AdvisorError>;
