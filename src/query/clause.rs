//! WHERE, LIMIT and SKIP clauses
//!
//! Clauses do not hold references to their parents. Each stores a
//! [`QueryRef`] naming the file and query it belongs to, which is enough
//! to report where an error came from.

use std::fmt;

use crate::ast::{Expr, SourceLocation};
use crate::model::{ModelRegistry, TypeDeclaration};

use super::errors::{QueryError, QueryResult};
use super::validator::WhereValidator;

/// Identifies the file and query a clause belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryRef {
    file: String,
    query: String,
}

impl QueryRef {
    pub fn new(file: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            query: query.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Attaches this owner to an error raised by one of its clauses
    pub fn locate(&self, err: QueryError) -> QueryError {
        err.in_query(&self.query).in_file(&self.file)
    }
}

impl fmt::Display for QueryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.query)
    }
}

/// WHERE clause: one expression tree
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    owner: QueryRef,
    ast: Expr,
}

impl Where {
    pub fn new(owner: QueryRef, ast: Expr) -> Self {
        Self { owner, ast }
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    /// Root of the expression tree, usually a binary expression
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Checks every property, operator and literal against the resource type.
    pub fn validate(
        &self,
        declaration: &TypeDeclaration,
        registry: &dyn ModelRegistry,
    ) -> QueryResult<()> {
        WhereValidator::new(declaration, registry)
            .validate(&self.ast)
            .map_err(|e| self.owner.locate(e.at(self.ast.location())))
    }
}

/// Value of a LIMIT or SKIP clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// Integer written in the query text
    Literal(u64),
    /// Parameter supplied at execution time
    Parameter(String),
}

impl Bound {
    fn from_expr(expr: &Expr, clause: &str) -> QueryResult<Self> {
        match expr {
            Expr::Literal(literal) => literal.value.as_u64().map(Bound::Literal).ok_or_else(|| {
                QueryError::invalid_input(format!(
                    "{} must be a non-negative integer, got {}",
                    clause, literal.value
                ))
                .at(literal.location.as_ref())
            }),
            Expr::Identifier(ident) => match ident.parameter() {
                Some(name) => Ok(Bound::Parameter(name.to_string())),
                None => Err(QueryError::invalid_input(format!(
                    "{} must be an integer or a parameter, got identifier {}",
                    clause, ident.name
                ))
                .at(ident.location.as_ref())),
            },
            other => Err(QueryError::malformed(format!(
                "{} does not support {} values",
                clause,
                other.node_type()
            ))
            .at(other.location())),
        }
    }

    /// Parameter name, if the bound is supplied at execution time
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Bound::Literal(_) => None,
            Bound::Parameter(name) => Some(name),
        }
    }
}

/// LIMIT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    owner: QueryRef,
    bound: Bound,
    location: Option<SourceLocation>,
}

impl Limit {
    pub fn from_ast(owner: QueryRef, ast: &Expr) -> QueryResult<Self> {
        let bound = Bound::from_expr(ast, "LIMIT").map_err(|e| owner.locate(e))?;
        Ok(Self {
            owner,
            bound,
            location: ast.location().copied(),
        })
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    pub fn bound(&self) -> &Bound {
        &self.bound
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

/// SKIP clause
#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    owner: QueryRef,
    bound: Bound,
    location: Option<SourceLocation>,
}

impl Skip {
    pub fn from_ast(owner: QueryRef, ast: &Expr) -> QueryResult<Self> {
        let bound = Bound::from_expr(ast, "SKIP").map_err(|e| owner.locate(e))?;
        Ok(Self {
            owner,
            bound,
            location: ast.location().copied(),
        })
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    pub fn bound(&self) -> &Bound {
        &self.bound
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}
