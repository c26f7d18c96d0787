//! Query tree model for the rewrite search.
//!
//! A `Query` is one (sub)select: the relation it reads, an optional predicate
//! tree, and an optional row-bound clause. Existence checks nest a full
//! `Query` inside the predicate tree; that nesting is what the search walks.

use serde::{Deserialize, Serialize};

/// Comparison operators for leaf predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Returns the operator name for report output
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }
}

/// A predicate tree node.
///
/// The search only has opinions about two shapes: a top-level conjunction,
/// and existence checks anywhere below it. Every other node is recursed
/// through and otherwise left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Conjunction of clauses
    And(Vec<Expr>),
    /// Disjunction of clauses
    Or(Vec<Expr>),
    /// Negation
    Not(Box<Expr>),
    /// Existence check: true if the sub-select produces at least one row
    Exists(Box<Query>),
    /// Leaf comparison, opaque to the search
    Compare {
        /// Field name
        field: String,
        /// Comparison operator
        op: CompareOp,
        /// Literal the field is compared against
        value: serde_json::Value,
    },
}

impl Expr {
    /// Builds a conjunction
    pub fn and(clauses: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(clauses.into_iter().collect())
    }

    /// Builds a disjunction
    pub fn or(clauses: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(clauses.into_iter().collect())
    }

    /// Builds a negation
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Builds an existence check over a sub-select
    pub fn exists(sub: Query) -> Self {
        Expr::Exists(Box::new(sub))
    }

    /// Builds an equality comparison
    pub fn eq(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Eq, value)
    }

    /// Builds an inequality comparison
    pub fn ne(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Ne, value)
    }

    /// Builds a greater-than comparison
    pub fn gt(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Gt, value)
    }

    /// Builds a greater-or-equal comparison
    pub fn gte(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Gte, value)
    }

    /// Builds a less-than comparison
    pub fn lt(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Lt, value)
    }

    /// Builds a less-or-equal comparison
    pub fn lte(field: impl Into<String>, value: serde_json::Value) -> Self {
        Expr::compare(field, CompareOp::Lte, value)
    }

    /// Builds a leaf comparison
    pub fn compare(field: impl Into<String>, op: CompareOp, value: serde_json::Value) -> Self {
        Expr::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Returns true if this node is a conjunction
    pub fn is_conjunction(&self) -> bool {
        matches!(self, Expr::And(_))
    }
}

/// LIMIT/OFFSET-equivalent clause attached to a (sub)select.
///
/// Presence is a planning barrier: an existence check over a bounded
/// sub-select must be planned as its own bounded step and must not be folded
/// into a join. Absence leaves the optimizer free to choose either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBound {
    /// Maximum number of rows produced
    pub limit: Option<u64>,
    /// Rows skipped before any are produced
    pub offset: Option<u64>,
}

impl RowBound {
    /// Creates a bound that caps the number of rows produced
    pub fn limit(n: u64) -> Self {
        Self {
            limit: Some(n),
            offset: None,
        }
    }

    /// Creates a bound that skips the first `n` rows
    pub fn offset(n: u64) -> Self {
        Self {
            limit: None,
            offset: Some(n),
        }
    }

    /// The marker the search injects: a zero offset bounds planning without
    /// changing the rows the sub-select produces.
    pub fn zero_offset() -> Self {
        Self::offset(0)
    }
}

/// One (sub)select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Relation the select reads from
    pub relation: String,
    /// Top-level predicate tree, if any
    pub filter: Option<Expr>,
    /// Row-bound clause, if any
    pub bound: Option<RowBound>,
}

impl Query {
    /// Creates a query over a relation with no filter and no bound
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            filter: None,
            bound: None,
        }
    }

    /// Sets the predicate tree
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the row-bound clause
    pub fn with_bound(mut self, bound: RowBound) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Returns true if a row-bound clause is present
    pub fn has_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Returns true if the top-level filter is a conjunction
    pub fn has_conjunctive_filter(&self) -> bool {
        self.filter.as_ref().is_some_and(Expr::is_conjunction)
    }
}
