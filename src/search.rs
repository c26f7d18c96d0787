//! Search driver: pristine plan versus cumulative rewrite trajectory.
//!
//! One linear stage sequence per request (config-check, disabled-check,
//! shape-check, base-cost, explore, decide) ending in exactly one of two
//! outcomes, pristine or rewritten. No retry, no backtracking.

use tracing::debug;

use crate::ast::Query;
use crate::config::SearchConfig;
use crate::errors::SearchResult;
use crate::explain::{Decision, SearchReport, SkipReason};
use crate::optimizer::{CostedPlan, Optimizer};
use crate::rewrite::{rewrite, SearchState};

/// Outcome of one plan search
#[derive(Debug, Clone)]
pub struct SearchOutcome<P> {
    /// The selected plan, ready for execution
    pub plan: CostedPlan<P>,
    /// The query tree the selected plan was produced from
    pub query: Query,
    /// How the decision fell
    pub report: SearchReport,
}

impl<P> SearchOutcome<P> {
    /// Returns the terminal decision
    pub fn decision(&self) -> Decision {
        self.report.decision
    }
}

/// Cost-gated rewrite search over correlated existence checks.
///
/// One instance may serve many queries. Every call builds its own state, so
/// concurrent searches sharing an optimizer and configuration by reference
/// are independent.
pub struct PlanSearch<'a, O: Optimizer> {
    optimizer: &'a O,
    config: &'a SearchConfig,
}

impl<'a, O: Optimizer> PlanSearch<'a, O> {
    /// Creates a search over the given optimizer and configuration
    pub fn new(optimizer: &'a O, config: &'a SearchConfig) -> Self {
        Self { optimizer, config }
    }

    /// Plans `query`, exploring bounded-existence rewrites, and returns the
    /// cheaper of the pristine and best rewritten plan subject to the
    /// configured threshold.
    ///
    /// The caller's `query` is never mutated, regardless of outcome.
    pub fn search(&self, query: &Query) -> SearchResult<SearchOutcome<O::Plan>> {
        self.config.validate()?;

        // 1. Switched off: cost the original once and hand it back.
        if !self.config.enabled {
            return self.pass_through(query, SkipReason::Disabled);
        }

        // 2. The heuristic only targets a top-level conjunction; any other
        //    shape passes through untouched, indistinguishable from the
        //    search being disabled for that statement.
        if !query.has_conjunctive_filter() {
            return self.pass_through(query, SkipReason::UnsupportedShape);
        }

        // 3. Base plan, computed once before any mutation.
        let base_plan = self.optimizer.plan(query)?;

        // 4. Explore the cumulative trajectory on a structural copy.
        let mut state = SearchState::new(query.clone(), base_plan);
        let mut working = query.clone();
        rewrite(&mut state, &mut working, self.optimizer)?;

        // 5. Decide between the pristine plan and the best variant.
        Ok(decide(state, self.config.threshold))
    }

    fn pass_through(
        &self,
        query: &Query,
        reason: SkipReason,
    ) -> SearchResult<SearchOutcome<O::Plan>> {
        debug!(reason = reason.as_str(), "rewrite search skipped");
        let plan = self.optimizer.plan(query)?;
        let report = SearchReport::skipped(reason, plan.cost, self.config.threshold);
        Ok(SearchOutcome {
            plan,
            query: query.clone(),
            report,
        })
    }
}

fn decide<P>(state: SearchState<P>, threshold: f64) -> SearchOutcome<P> {
    let SearchState {
        original,
        base_plan,
        working_best,
        best_plan,
        variants_evaluated,
    } = state;
    let base_cost = base_plan.cost;

    let best = match best_plan {
        Some(best) => best,
        // No eligible existence check was found; nothing was explored.
        None => {
            debug!(base = base_cost, "no existence check found; kept the pristine plan");
            return SearchOutcome {
                plan: base_plan,
                query: original,
                report: SearchReport::skipped(SkipReason::NoExistenceChecks, base_cost, threshold),
            };
        }
    };
    let best_cost = best.cost;

    // A zero-cost base leaves the improvement ratio undefined; keep the
    // pristine plan rather than divide by zero.
    if base_cost == 0.0 {
        debug!(best = best_cost, "zero-cost base; kept the pristine plan");
        return SearchOutcome {
            plan: base_plan,
            query: original,
            report: SearchReport {
                decision: Decision::Pristine,
                base_cost,
                best_cost: Some(best_cost),
                improvement_ratio: None,
                threshold,
                variants_evaluated,
                skipped: Some(SkipReason::ZeroCostBase),
            },
        };
    }

    let ratio = base_cost / best_cost;
    if ratio <= threshold {
        debug!(base = base_cost, best = best_cost, ratio, "kept the pristine plan");
        SearchOutcome {
            plan: base_plan,
            query: original,
            report: SearchReport {
                decision: Decision::Pristine,
                base_cost,
                best_cost: Some(best_cost),
                improvement_ratio: Some(ratio),
                threshold,
                variants_evaluated,
                skipped: None,
            },
        }
    } else {
        debug!(base = base_cost, best = best_cost, ratio, "adopted the rewritten plan");
        SearchOutcome {
            plan: best,
            query: working_best,
            report: SearchReport {
                decision: Decision::Rewritten,
                base_cost,
                best_cost: Some(best_cost),
                improvement_ratio: Some(ratio),
                threshold,
                variants_evaluated,
                skipped: None,
            },
        }
    }
}
