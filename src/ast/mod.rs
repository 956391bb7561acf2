//! Query AST consumed by the compiler
//!
//! The query grammar lives outside this crate. Its parser emits a JSON
//! tree which is deserialized into the types below and handed, as-is, to
//! the query domain model.
//!
//! Optional fields stay optional here so that missing pieces surface as
//! structural errors from the domain model rather than as opaque
//! deserialization failures.

mod expr;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use expr::{
    parameter_name, ArrayExpression, BinaryExpression, Expr, Identifier, Literal,
    MemberExpression, Operator, PARAMETER_PREFIX,
};

/// A point in the query source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Source range reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} column {} to line {} column {}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// `{ name }` wrapper used for query identifiers and sort fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub name: String,
}

/// Parsed query file: a list of query declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFileAst {
    #[serde(default)]
    pub queries: Vec<QueryAst>,
}

/// Parsed `query Name { description: ..., statement: SELECT ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAst {
    #[serde(default)]
    pub identifier: Option<Name>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "statement")]
    pub select: Option<SelectAst>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Parsed SELECT statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectAst {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<Expr>,
    #[serde(default)]
    pub order_by: Option<Vec<SortAst>>,
    #[serde(default)]
    pub limit: Option<Expr>,
    #[serde(default)]
    pub skip: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// One ORDER BY criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortAst {
    #[serde(default)]
    pub field_name: Option<Name>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl QueryAst {
    /// Create a query AST around a select statement
    pub fn new(name: impl Into<String>, select: SelectAst) -> Self {
        Self {
            identifier: Some(Name { name: name.into() }),
            description: None,
            select: Some(select),
            location: None,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl SelectAst {
    /// Creates a select over the given resource type
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    /// Sets the registry override
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the WHERE expression
    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    /// Appends an ORDER BY criterion
    pub fn with_sort(mut self, sort: SortAst) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(sort);
        self
    }

    /// Sets the LIMIT expression
    pub fn with_limit(mut self, limit: Expr) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the SKIP expression
    pub fn with_skip(mut self, skip: Expr) -> Self {
        self.skip = Some(skip);
        self
    }
}

impl SortAst {
    pub fn new(field: impl Into<String>, direction: Option<&str>) -> Self {
        Self {
            field_name: Some(Name { name: field.into() }),
            direction: direction.map(str::to_string),
            location: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Some("ASC"))
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Some("DESC"))
    }
}
