//! Clause visitor seam shared by the compiler backends
//!
//! Each backend drives the traversal of a `Select` itself (the order in
//! which clauses are visited differs between backends) and dispatches to
//! the clause through [`Clause::accept`].

use super::clause::{Limit, Skip, Where};
use super::errors::QueryResult;
use super::order_by::OrderBy;

/// Per-clause callbacks; `Output` is what one clause contributes
pub trait ClauseVisitor {
    type Output;

    fn visit_where(&mut self, clause: &Where) -> QueryResult<Self::Output>;
    fn visit_order_by(&mut self, clause: &OrderBy) -> QueryResult<Self::Output>;
    fn visit_limit(&mut self, clause: &Limit) -> QueryResult<Self::Output>;
    fn visit_skip(&mut self, clause: &Skip) -> QueryResult<Self::Output>;
}

/// A SELECT clause that can be visited
pub trait Clause {
    fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> QueryResult<V::Output>;
}

impl Clause for Where {
    fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> QueryResult<V::Output> {
        visitor.visit_where(self)
    }
}

impl Clause for OrderBy {
    fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> QueryResult<V::Output> {
        visitor.visit_order_by(self)
    }
}

impl Clause for Limit {
    fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> QueryResult<V::Output> {
        visitor.visit_limit(self)
    }
}

impl Clause for Skip {
    fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> QueryResult<V::Output> {
        visitor.visit_skip(self)
    }
}

/// Identifies a clause slot of a `Select`, used to fix visiting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Where,
    OrderBy,
    Limit,
    Skip,
}
