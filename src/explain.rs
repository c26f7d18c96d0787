//! Deterministic account of one search decision.
//!
//! Produces the same report for the same search, suitable for logs and for
//! surfacing through a host's EXPLAIN-like channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The query was planned as received
    Pristine,
    /// A bounded-existence rewrite replaced the pristine plan
    Rewritten,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pristine => "PRISTINE",
            Decision::Rewritten => "REWRITTEN",
        }
    }
}

/// Why a search kept the pristine plan without weighing costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The search is switched off in configuration
    Disabled,
    /// Top-level filter absent or not a conjunction
    UnsupportedShape,
    /// No eligible existence check anywhere in the tree
    NoExistenceChecks,
    /// A base cost of zero leaves the improvement ratio undefined
    ZeroCostBase,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "DISABLED",
            SkipReason::UnsupportedShape => "UNSUPPORTED_SHAPE",
            SkipReason::NoExistenceChecks => "NO_EXISTENCE_CHECKS",
            SkipReason::ZeroCostBase => "ZERO_COST_BASE",
        }
    }
}

/// Report for one search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Terminal outcome
    pub decision: Decision,
    /// Cost of the pristine plan
    pub base_cost: f64,
    /// Cost of the best rewritten variant, if any was evaluated
    pub best_cost: Option<f64>,
    /// Pristine-to-rewritten cost quotient, when defined
    pub improvement_ratio: Option<f64>,
    /// Threshold the ratio was compared against
    pub threshold: f64,
    /// Variants handed to the optimizer, base plan excluded
    pub variants_evaluated: usize,
    /// Why the pristine plan won without a cost comparison, if it did
    pub skipped: Option<SkipReason>,
}

impl SearchReport {
    /// Report for a search that never explored
    pub(crate) fn skipped(reason: SkipReason, base_cost: f64, threshold: f64) -> Self {
        Self {
            decision: Decision::Pristine,
            base_cost,
            best_cost: None,
            improvement_ratio: None,
            threshold,
            variants_evaluated: 0,
            skipped: Some(reason),
        }
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== PLAN SEARCH ===")?;
        writeln!(f, "Decision: {}", self.decision.as_str())?;
        writeln!(f, "Base Cost: {}", self.base_cost)?;
        if let Some(best) = self.best_cost {
            writeln!(f, "Best Variant Cost: {}", best)?;
        }
        if let Some(ratio) = self.improvement_ratio {
            writeln!(f, "Improvement Ratio: {}", ratio)?;
        }
        writeln!(f, "Threshold: {}", self.threshold)?;
        writeln!(f, "Variants Evaluated: {}", self.variants_evaluated)?;
        if let Some(reason) = self.skipped {
            writeln!(f, "Skipped: {}", reason.as_str())?;
        }
        Ok(())
    }
}
