//! Mutation pass over a working copy of the query tree.
//!
//! The pass visits every eligible existence check innermost-first and
//! left-to-right, injects a row-bound marker into its sub-select, and costs
//! the entire working tree immediately after each injection. One cumulative
//! trajectory is explored and the best prefix of it is recorded in the
//! search state; the power set of injection choices is deliberately not
//! enumerated.
//!
//! The visit order is load-bearing: it decides which variant the search
//! discovers as best.

use tracing::trace;

use crate::ast::{Expr, Query, RowBound};
use crate::errors::SearchResult;
use crate::optimizer::{CostedPlan, Optimizer};

/// State owned by exactly one search invocation, never shared across
/// requests. Created after the pristine plan is costed, mutated only during
/// that request's traversal, discarded once the final plan is returned.
#[derive(Debug)]
pub(crate) struct SearchState<P> {
    /// The query as received, untouched
    pub original: Query,
    /// Plan for `original`, computed once before any mutation
    pub base_plan: CostedPlan<P>,
    /// Best variant discovered so far
    pub working_best: Query,
    /// Plan for `working_best`, absent until a variant is evaluated
    pub best_plan: Option<CostedPlan<P>>,
    /// Number of variants handed to the optimizer
    pub variants_evaluated: usize,
}

impl<P> SearchState<P> {
    pub fn new(original: Query, base_plan: CostedPlan<P>) -> Self {
        let working_best = original.clone();
        Self {
            original,
            base_plan,
            working_best,
            best_plan: None,
            variants_evaluated: 0,
        }
    }

    /// Costs `candidate` and records it as the new best when its cost is not
    /// worse. Equal costs overwrite: of several equal-cost variants, the last
    /// one evaluated wins.
    ///
    /// Returns whether the candidate became the new best. Cost comparison
    /// itself never fails; only the optimizer call can.
    pub fn evaluate<O>(&mut self, optimizer: &O, candidate: &Query) -> SearchResult<bool>
    where
        O: Optimizer<Plan = P>,
    {
        let plan = optimizer.plan(candidate)?;
        self.variants_evaluated += 1;

        if let Some(best) = &self.best_plan {
            if plan.cost > best.cost {
                trace!(cost = plan.cost, best = best.cost, "variant rejected");
                return Ok(false);
            }
        }

        trace!(cost = plan.cost, "variant recorded as best");
        self.working_best = candidate.clone();
        self.best_plan = Some(plan);
        Ok(true)
    }
}

/// One edge on the path from the query root to an existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// n-th child of a boolean connective (`Not` has the single child 0)
    Clause(usize),
    /// Through an existence check into its sub-select's filter
    Inner,
}

/// Runs the mutation pass over `working`, threading `state`.
///
/// `working` starts as a structural copy of the original. After the pass it
/// carries a marker on every existence check that was eligible when visited,
/// and `state` holds the cheapest prefix of that trajectory.
///
/// The pass is an ordered visit of the tree (locations collected innermost
/// first, then one injection per location through the root), so a whole-tree
/// borrow is available at every evaluation point. The candidate sequence
/// handed to the optimizer is exactly that of a mutate-at-node traversal.
pub(crate) fn rewrite<O>(
    state: &mut SearchState<O::Plan>,
    working: &mut Query,
    optimizer: &O,
) -> SearchResult<()>
where
    O: Optimizer,
{
    for path in collect_checks(working) {
        // Injections only fill `bound` slots, so paths collected up front
        // stay valid for the whole pass.
        let injected = match subquery_at_mut(working, &path) {
            Some(sub) if !sub.has_bound() => {
                sub.bound = Some(RowBound::zero_offset());
                true
            }
            _ => false,
        };
        if injected {
            state.evaluate(optimizer, working)?;
        }
    }
    Ok(())
}

/// Collects the location of every eligible existence check in evaluation
/// order: innermost before outer, siblings left to right.
///
/// A check whose sub-select already carries a row bound is not eligible but
/// is still recursed into, so nested opportunities below it are found.
fn collect_checks(query: &Query) -> Vec<Vec<Step>> {
    let mut found = Vec::new();
    if let Some(filter) = &query.filter {
        let mut path = Vec::new();
        collect_expr(filter, &mut path, &mut found);
    }
    found
}

fn collect_expr(expr: &Expr, path: &mut Vec<Step>, found: &mut Vec<Vec<Step>>) {
    match expr {
        Expr::And(clauses) | Expr::Or(clauses) => {
            for (i, clause) in clauses.iter().enumerate() {
                path.push(Step::Clause(i));
                collect_expr(clause, path, found);
                path.pop();
            }
        }
        Expr::Not(inner) => {
            path.push(Step::Clause(0));
            collect_expr(inner, path, found);
            path.pop();
        }
        Expr::Exists(sub) => {
            if let Some(filter) = &sub.filter {
                path.push(Step::Inner);
                collect_expr(filter, path, found);
                path.pop();
            }
            if !sub.has_bound() {
                found.push(path.clone());
            }
        }
        Expr::Compare { .. } => {}
    }
}

/// Returns the sub-select of the existence check at `path`
fn subquery_at_mut<'a>(query: &'a mut Query, path: &[Step]) -> Option<&'a mut Query> {
    let mut expr = query.filter.as_mut()?;
    for step in path {
        expr = match (*step, expr) {
            (Step::Clause(i), Expr::And(clauses) | Expr::Or(clauses)) => clauses.get_mut(i)?,
            (Step::Clause(0), Expr::Not(inner)) => inner.as_mut(),
            (Step::Inner, Expr::Exists(sub)) => sub.filter.as_mut()?,
            _ => return None,
        };
    }
    match expr {
        Expr::Exists(sub) => Some(sub.as_mut()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OptimizerResult;
    use serde_json::json;

    #[test]
    fn test_checks_collected_innermost_first() {
        let mut query = Query::new("orders").with_filter(Expr::and([
            Expr::eq("status", json!("open")),
            Expr::exists(Query::new("items").with_filter(Expr::and([
                Expr::eq("qty", json!(2)),
                Expr::exists(Query::new("stock")),
            ]))),
        ]));

        let checks = collect_checks(&query);
        assert_eq!(checks.len(), 2);

        let inner = subquery_at_mut(&mut query, &checks[0]).unwrap();
        assert_eq!(inner.relation, "stock");
        let outer = subquery_at_mut(&mut query, &checks[1]).unwrap();
        assert_eq!(outer.relation, "items");
    }

    #[test]
    fn test_siblings_collected_left_to_right() {
        let mut query = Query::new("orders").with_filter(Expr::and([
            Expr::exists(Query::new("left")),
            Expr::eq("status", json!("open")),
            Expr::exists(Query::new("right")),
        ]));

        let checks = collect_checks(&query);
        assert_eq!(checks.len(), 2);
        assert_eq!(subquery_at_mut(&mut query, &checks[0]).unwrap().relation, "left");
        assert_eq!(subquery_at_mut(&mut query, &checks[1]).unwrap().relation, "right");
    }

    #[test]
    fn test_bounded_subselect_skipped_but_recursed() {
        let mut query = Query::new("orders").with_filter(Expr::and([Expr::exists(
            Query::new("items")
                .with_filter(Expr::exists(Query::new("stock")))
                .with_bound(RowBound::limit(1)),
        )]));

        let checks = collect_checks(&query);
        assert_eq!(checks.len(), 1);
        assert_eq!(subquery_at_mut(&mut query, &checks[0]).unwrap().relation, "stock");
    }

    #[test]
    fn test_paths_navigate_through_or_and_not() {
        let mut query = Query::new("orders").with_filter(Expr::and([Expr::not(Expr::or([
            Expr::eq("status", json!("open")),
            Expr::exists(Query::new("items")),
        ]))]));

        let checks = collect_checks(&query);
        assert_eq!(checks.len(), 1);
        assert_eq!(subquery_at_mut(&mut query, &checks[0]).unwrap().relation, "items");
    }

    /// Optimizer stub with one fixed cost for every tree
    struct FlatCostOptimizer {
        cost: f64,
    }

    impl Optimizer for FlatCostOptimizer {
        type Plan = String;

        fn plan(&self, query: &Query) -> OptimizerResult<CostedPlan<String>> {
            Ok(CostedPlan::new(query.relation.clone(), self.cost))
        }
    }

    #[test]
    fn test_equal_cost_variant_overwrites_best() {
        let optimizer = FlatCostOptimizer { cost: 42.0 };
        let base = optimizer.plan(&Query::new("orders")).unwrap();
        let mut state = SearchState::new(Query::new("orders"), base);

        assert!(state.evaluate(&optimizer, &Query::new("first")).unwrap());
        assert!(state.evaluate(&optimizer, &Query::new("second")).unwrap());

        assert_eq!(state.working_best.relation, "second");
        assert_eq!(state.best_plan.unwrap().plan, "second");
        assert_eq!(state.variants_evaluated, 2);
    }

    #[test]
    fn test_worse_variant_leaves_best_untouched() {
        struct ByRelation;
        impl Optimizer for ByRelation {
            type Plan = ();
            fn plan(&self, query: &Query) -> OptimizerResult<CostedPlan<()>> {
                let cost = if query.relation == "cheap" { 10.0 } else { 50.0 };
                Ok(CostedPlan::new((), cost))
            }
        }

        let optimizer = ByRelation;
        let base = optimizer.plan(&Query::new("orders")).unwrap();
        let mut state = SearchState::new(Query::new("orders"), base);

        assert!(state.evaluate(&optimizer, &Query::new("cheap")).unwrap());
        assert!(!state.evaluate(&optimizer, &Query::new("pricey")).unwrap());

        assert_eq!(state.working_best.relation, "cheap");
        assert_eq!(state.variants_evaluated, 2);
    }
}
