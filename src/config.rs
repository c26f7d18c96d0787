//! Search configuration.
//!
//! Passed explicitly to the driver at call time; the search holds no ambient
//! global state. Hosts that keep these settings process-wide read them once
//! per request, so an administrative update becomes visible to subsequent
//! requests only.

use serde::{Deserialize, Serialize};

use crate::errors::{SearchError, SearchResult};

/// Plan search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether the rewrite search runs at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Improvement ratio the pristine-to-rewritten cost quotient must exceed
    /// for the rewritten plan to win (default: 1.0, adopt any strictly
    /// cheaper rewrite)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> f64 {
    1.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            threshold: default_threshold(),
        }
    }
}

impl SearchConfig {
    /// Creates a config with the given improvement threshold
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Creates a config with the search switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Rejects thresholds that are not strictly positive
    pub fn validate(&self) -> SearchResult<()> {
        if self.threshold > 0.0 {
            Ok(())
        } else {
            Err(SearchError::InvalidThreshold(self.threshold))
        }
    }
}
