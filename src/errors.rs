//! Error types for the plan search.
//!
//! The search never fails on a well-formed tree. Every failure either comes
//! from the external optimizer or from rejected configuration, and each
//! carries a stable machine-readable code:
//! - PLAN_OPTIMIZER_FAILED
//! - PLAN_INVALID_THRESHOLD

use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type the external optimizer returns
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Failure reported by the external optimizer for one tree.
///
/// Not locally recoverable: the search performs no mutation that should ever
/// produce an invalid tree, so this surfaces a rewrite defect to the host
/// instead of being swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("optimizer failed: {message}")]
pub struct OptimizerError {
    message: String,
}

impl OptimizerError {
    /// Creates an optimizer failure with the given description
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure description
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by one plan search
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The external optimizer could not plan a tree handed to it
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    /// The configured improvement threshold is not strictly positive
    #[error("improvement threshold must be strictly positive, got {0}")]
    InvalidThreshold(f64),
}

impl SearchError {
    /// Returns the stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Optimizer(_) => "PLAN_OPTIMIZER_FAILED",
            SearchError::InvalidThreshold(_) => "PLAN_INVALID_THRESHOLD",
        }
    }
}
