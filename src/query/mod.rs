//! Query domain model
//!
//! Typed wrappers around the parser's AST:
//! - `QueryFile` holds the queries declared in one file
//! - `Query` names one `Select`
//! - `Select` owns optional `Where`, `OrderBy`, `Limit` and `Skip` clauses
//!
//! Construction performs structural checks only. `validate()` resolves
//! the selected type through a `ModelRegistry` and checks every clause
//! against it. Compiler backends traverse clauses through
//! `ClauseVisitor`.

mod clause;
mod definition;
mod errors;
mod file;
mod manager;
mod order_by;
mod select;
mod validator;
mod visitor;

pub use clause::{Bound, Limit, QueryRef, Skip, Where};
pub use definition::Query;
pub use errors::{ErrorCategory, QueryError, QueryErrorKind, QueryResult};
pub use file::QueryFile;
pub use manager::QueryManager;
pub use order_by::{OrderBy, Sort, SortDirection};
pub use select::Select;
pub use validator::WhereValidator;
pub use visitor::{Clause, ClauseKind, ClauseVisitor};
