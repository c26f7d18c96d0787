//! External optimizer contract.
//!
//! The search treats the optimizer as an oracle: query tree in, executable
//! plan and scalar cost out. The plan payload is opaque and never
//! introspected; only the cost is compared.

use crate::ast::Query;
use crate::errors::OptimizerResult;

/// An executable plan together with its estimated total cost.
///
/// Two plans are compared purely by cost. Equal costs are a valid tie.
#[derive(Debug, Clone, PartialEq)]
pub struct CostedPlan<P> {
    /// Executable plan payload, opaque to the search
    pub plan: P,
    /// Estimated total cost, non-negative
    pub cost: f64,
}

impl<P> CostedPlan<P> {
    /// Creates a costed plan
    pub fn new(plan: P, cost: f64) -> Self {
        Self { plan, cost }
    }
}

/// Cost-based optimizer supplied by the host.
///
/// `plan` must be total: it returns a usable plan or an error, never a
/// partial result. It must also be deterministic for a fixed tree within one
/// search, since the search compares costs across repeated calls in the same
/// request.
pub trait Optimizer {
    /// Executable plan type produced by the host
    type Plan;

    /// Plans a query tree, returning the plan and its estimated total cost
    fn plan(&self, query: &Query) -> OptimizerResult<CostedPlan<Self::Plan>>;
}
