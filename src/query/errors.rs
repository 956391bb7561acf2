//! Query error types
//!
//! Error categories:
//! - STRUCTURAL: malformed or incomplete AST input
//! - MODEL: query references something the type registry cannot resolve
//! - QUERY: well-formed query that is semantically invalid for its types
//!
//! Every error is fatal for the query (or file) being processed; the
//! first error aborts validation or compilation.

use std::fmt;

use thiserror::Error;

use crate::ast::SourceLocation;
use crate::model::ModelError;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Structural,
    Model,
    Query,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Structural => write!(f, "STRUCTURAL"),
            ErrorCategory::Model => write!(f, "MODEL"),
            ErrorCategory::Query => write!(f, "QUERY"),
        }
    }
}

/// What went wrong, with the structured details needed for diagnostics
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryErrorKind {
    // ==================
    // Structural Errors
    // ==================
    /// Required input missing or unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// AST could not be decoded or has an unexpected shape
    #[error("Malformed query AST: {0}")]
    MalformedAst(String),

    // ==================
    // Model Errors
    // ==================
    /// Registry lookup failure (unknown type, missing nested property)
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Selected type is a concept, enum or event
    #[error("Type {type_name} is a {kind}. Can only select assets, participants and transactions.")]
    NotQueryable { type_name: String, kind: String },

    /// Query name used twice in one file
    #[error("Duplicate query name {name}")]
    DuplicateQuery { name: String },

    /// Property path missing on the selected type
    #[error("Property {property} not found on type {type_name}")]
    PropertyNotFound { property: String, type_name: String },

    /// WHERE or ORDER BY used without a resource type to resolve against
    #[error("A resource type is required to resolve {clause} properties")]
    ResourceRequired { clause: &'static str },

    // ==================
    // Query Errors
    // ==================
    #[error("Property {property} cannot be compared using the {operator} operator. The type of the property is {field_type}.")]
    IncompatibleOperator {
        property: String,
        field_type: String,
        operator: String,
    },

    #[error("Property {property} cannot be compared with {value} ({value_type}). The type of the property is {field_type}.")]
    IncompatibleType {
        property: String,
        field_type: String,
        value: String,
        value_type: String,
    },

    #[error("Property {property} is an enum and cannot be compared with {value} ({value_type}). Use the enum value as a string.")]
    IncompatibleEnum {
        property: String,
        value: String,
        value_type: String,
    },

    #[error("Property {property} is a relationship and cannot be compared with {value} ({value_type}). Use the identifier of the related resource as a string.")]
    IncompatibleRelationship {
        property: String,
        value: String,
        value_type: String,
    },

    #[error("Property {property} of type {field_type} cannot be compared with a literal value.")]
    UnsupportedType { property: String, field_type: String },

    #[error("Unsupported property type {property}. Parameters can only be bound to primitive, enum or relationship properties.")]
    UnsupportedParameterType { property: String },

    #[error("ORDER BY criteria must share one direction: {first} and {conflicting} are mixed")]
    MixedSortDirections { first: String, conflicting: String },

    #[error("A CONTAINS expression cannot be nested within another CONTAINS expression")]
    NestedContains,

    #[error("A property name is required on one side of a CONTAINS expression")]
    ContainsWithoutProperty,
}

impl QueryErrorKind {
    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorKind::InvalidInput(_) => "QRY_INVALID_INPUT",
            QueryErrorKind::MalformedAst(_) => "QRY_MALFORMED_AST",
            QueryErrorKind::Model(e) => e.code(),
            QueryErrorKind::NotQueryable { .. } => "QRY_TYPE_NOT_QUERYABLE",
            QueryErrorKind::DuplicateQuery { .. } => "QRY_DUPLICATE_QUERY",
            QueryErrorKind::PropertyNotFound { .. } => "QRY_PROPERTY_NOT_FOUND",
            QueryErrorKind::ResourceRequired { .. } => "QRY_RESOURCE_REQUIRED",
            QueryErrorKind::IncompatibleOperator { .. } => "QRY_INCOMPATIBLE_OPERATOR",
            QueryErrorKind::IncompatibleType { .. } => "QRY_INCOMPATIBLE_TYPE",
            QueryErrorKind::IncompatibleEnum { .. } => "QRY_INCOMPATIBLE_ENUM",
            QueryErrorKind::IncompatibleRelationship { .. } => "QRY_INCOMPATIBLE_RELATIONSHIP",
            QueryErrorKind::UnsupportedType { .. } => "QRY_UNSUPPORTED_TYPE",
            QueryErrorKind::UnsupportedParameterType { .. } => "QRY_UNSUPPORTED_PARAMETER_TYPE",
            QueryErrorKind::MixedSortDirections { .. } => "QRY_MIXED_SORT_DIRECTIONS",
            QueryErrorKind::NestedContains => "QRY_NESTED_CONTAINS",
            QueryErrorKind::ContainsWithoutProperty => "QRY_CONTAINS_WITHOUT_PROPERTY",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryErrorKind::InvalidInput(_) | QueryErrorKind::MalformedAst(_) => {
                ErrorCategory::Structural
            }
            QueryErrorKind::Model(_)
            | QueryErrorKind::NotQueryable { .. }
            | QueryErrorKind::DuplicateQuery { .. }
            | QueryErrorKind::PropertyNotFound { .. }
            | QueryErrorKind::ResourceRequired { .. } => ErrorCategory::Model,
            _ => ErrorCategory::Query,
        }
    }
}

/// Query error with the file, query and source location it arose in
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    kind: QueryErrorKind,
    file: Option<String>,
    query: Option<String>,
    location: Option<SourceLocation>,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind) -> Self {
        Self {
            kind,
            file: None,
            query: None,
            location: None,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::InvalidInput(reason.into()))
    }

    /// Create a malformed AST error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::MalformedAst(reason.into()))
    }

    /// Attaches the owning file, unless one is already recorded
    pub fn in_file(mut self, file: &str) -> Self {
        self.file.get_or_insert_with(|| file.to_string());
        self
    }

    /// Attaches the owning query, unless one is already recorded
    pub fn in_query(mut self, query: &str) -> Self {
        self.query.get_or_insert_with(|| query.to_string());
        self
    }

    /// Attaches a source location, unless a more precise one is recorded
    pub fn at(mut self, location: Option<&SourceLocation>) -> Self {
        if self.location.is_none() {
            self.location = location.copied();
        }
        self
    }

    pub fn kind(&self) -> &QueryErrorKind {
        &self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category(), self.code(), self.kind)?;
        if let Some(file) = &self.file {
            write!(f, " File '{}'", file)?;
        }
        if let Some(query) = &self.query {
            write!(f, " query '{}'", query)?;
        }
        if let Some(location) = &self.location {
            write!(f, " {}", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

impl From<QueryErrorKind> for QueryError {
    fn from(kind: QueryErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ModelError> for QueryError {
    fn from(e: ModelError) -> Self {
        Self::new(QueryErrorKind::Model(e))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;

    #[test]
    fn test_categories() {
        assert_eq!(
            QueryError::invalid_input("missing select").category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            QueryError::new(QueryErrorKind::DuplicateQuery { name: "Q1".into() }).category(),
            ErrorCategory::Model
        );
        assert_eq!(
            QueryError::new(QueryErrorKind::NestedContains).category(),
            ErrorCategory::Query
        );
    }

    #[test]
    fn test_context_is_not_overwritten() {
        let err = QueryError::new(QueryErrorKind::NestedContains)
            .in_query("Q1")
            .in_file("test.qry")
            .in_query("Outer")
            .in_file("other.qry");
        assert_eq!(err.query(), Some("Q1"));
        assert_eq!(err.file(), Some("test.qry"));
    }

    #[test]
    fn test_error_display() {
        let location = SourceLocation {
            start: Position { offset: 0, line: 3, column: 5 },
            end: Position { offset: 20, line: 3, column: 25 },
        };
        let err = QueryError::new(QueryErrorKind::IncompatibleOperator {
            property: "booleanProperty".into(),
            field_type: "Boolean".into(),
            operator: ">".into(),
        })
        .in_query("Q1")
        .in_file("test.qry")
        .at(Some(&location));

        let display = err.to_string();
        assert!(display.starts_with("[QUERY] QRY_INCOMPATIBLE_OPERATOR"));
        assert!(display.contains("Property booleanProperty cannot be compared using the > operator"));
        assert!(display.contains("File 'test.qry' query 'Q1' line 3 column 5"));
    }

    #[test]
    fn test_model_error_passthrough() {
        let err: QueryError = ModelError::TypeNotFound("org.acme.Missing".into()).into();
        assert_eq!(err.code(), "QRY_MODEL_TYPE_NOT_FOUND");
        assert_eq!(err.kind().to_string(), "Type org.acme.Missing not found");
    }
}
