//! WHERE expression validation
//!
//! Checks every property a WHERE clause references against the selected
//! type, that the operator applied to it is legal, and that any literal it
//! is compared with has a compatible type.
//!
//! `CONTAINS` opens a scope: property names inside the right-hand side
//! are resolved relative to the array property named on one side, so
//! `meows CONTAINS (woof == "x")` checks `meows.woof`. Scopes are
//! discovered in a first pass with condition checks disabled, then a
//! nested condition is walked again with the scope in place. Any other
//! property path on the far side resolves against the selected type.
//! Nesting one `CONTAINS` inside another is rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::ast::{BinaryExpression, Expr, Literal, Operator};
use crate::model::{
    ModelError, ModelRegistry, PrimitiveType, PropertyDescriptor, PropertyKind, TypeDeclaration,
};

use super::errors::{QueryError, QueryErrorKind, QueryResult};

/// Maps a failed property lookup to a query error naming the path as written.
///
/// Navigation and registry errors pass through unchanged.
pub(crate) fn unresolved_property(
    err: ModelError,
    path: &str,
    declaration: &TypeDeclaration,
) -> QueryError {
    match err {
        ModelError::PropertyNotFound { .. } => QueryError::new(QueryErrorKind::PropertyNotFound {
            property: path.to_string(),
            type_name: declaration.fully_qualified_name().to_string(),
        }),
        other => other.into(),
    }
}

/// Renders a literal value the way it appears in diagnostics
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolved operand of a binary expression
#[derive(Debug)]
enum Operand<'e> {
    /// Dotted property path, relative to the current scope
    Property(String),
    Parameter,
    Literal(&'e Literal),
    Array,
    /// Nested expression; already visited
    Condition,
}

/// Validates one WHERE expression tree against a resource type.
///
/// A validator is single use: [`WhereValidator::validate`] consumes it.
pub struct WhereValidator<'a> {
    declaration: &'a TypeDeclaration,
    registry: &'a dyn ModelRegistry,
    scopes: Vec<String>,
    validation_disabled: bool,
}

impl<'a> WhereValidator<'a> {
    pub fn new(declaration: &'a TypeDeclaration, registry: &'a dyn ModelRegistry) -> Self {
        Self {
            declaration,
            registry,
            scopes: Vec::new(),
            validation_disabled: false,
        }
    }

    /// Walks the tree, stopping at the first violation
    pub fn validate(mut self, expr: &Expr) -> QueryResult<()> {
        debug!(resource = %self.declaration, "validating where clause");
        self.resolve(expr).map(|_| ())
    }

    fn resolve<'e>(&mut self, expr: &'e Expr) -> QueryResult<Operand<'e>> {
        match expr {
            Expr::Binary(binary) => {
                self.visit_binary(binary)
                    .map_err(|e| e.at(binary.location.as_ref()))?;
                Ok(Operand::Condition)
            }
            Expr::Identifier(ident) => Ok(match ident.parameter() {
                Some(_) => Operand::Parameter,
                None => Operand::Property(ident.name.clone()),
            }),
            Expr::Literal(literal) => Ok(Operand::Literal(literal)),
            Expr::Array(array) => {
                for element in &array.elements {
                    if let Operand::Property(path) = self.resolve(element)? {
                        self.check_property(&path)
                            .map_err(|e| e.at(element.location()))?;
                    }
                }
                Ok(Operand::Array)
            }
            Expr::Member(member) => {
                let object = self.resolve(&member.object)?;
                let property = self.resolve(&member.property)?;
                let path = match (object, property) {
                    (Operand::Property(object), Operand::Property(property)) => {
                        format!("{}.{}", object, property)
                    }
                    _ => {
                        return Err(QueryError::malformed(
                            "Member expressions must be built from property names",
                        )
                        .at(member.location.as_ref()))
                    }
                };
                self.check_property(&path)
                    .map_err(|e| e.at(member.location.as_ref()))?;
                Ok(Operand::Property(path))
            }
        }
    }

    fn visit_binary(&mut self, binary: &BinaryExpression) -> QueryResult<()> {
        match binary.operator {
            Operator::And | Operator::Or => {
                self.resolve(&binary.left)?;
                self.resolve(&binary.right)?;
                Ok(())
            }
            Operator::Contains => self.visit_contains(binary),
            _ => self.visit_condition(binary),
        }
    }

    fn visit_contains(&mut self, binary: &BinaryExpression) -> QueryResult<()> {
        if self.validation_disabled {
            return Err(QueryErrorKind::NestedContains.into());
        }

        // first pass only discovers the scope
        self.validation_disabled = true;
        let left = self.resolve(&binary.left);
        let right = self.resolve(&binary.right);
        self.validation_disabled = false;

        let (scope, other) = match (left?, right?) {
            (Operand::Property(scope), _) => (scope, &*binary.right),
            (_, Operand::Property(scope)) => (scope, &*binary.left),
            _ => return Err(QueryErrorKind::ContainsWithoutProperty.into()),
        };
        self.verify_property(&scope)?;

        // only a nested condition is resolved against the array's elements
        if let Expr::Binary(_) = other {
            debug!(scope = %scope, "entering contains scope");
            self.scopes.push(scope);
            let result = self.resolve(other);
            self.scopes.pop();
            return result.map(|_| ());
        }

        if let Operand::Property(path) = self.resolve(other)? {
            self.verify_property(&path)
                .map_err(|e| e.at(other.location()))?;
        }
        Ok(())
    }

    fn visit_condition(&mut self, binary: &BinaryExpression) -> QueryResult<()> {
        let left = self.resolve(&binary.left)?;
        let right = self.resolve(&binary.right)?;

        if self.validation_disabled {
            return Ok(());
        }

        for (side, other) in [(&left, &right), (&right, &left)] {
            if let Operand::Property(path) = side {
                let property = self.verify_property(path)?;
                self.verify_operator(property, binary.operator)?;
                if let Operand::Literal(literal) = other {
                    self.verify_type_compatibility(property, literal)?;
                }
            }
        }
        Ok(())
    }

    /// Verifies a path outside of a condition; skipped while scopes are
    /// being discovered
    fn check_property(&self, path: &str) -> QueryResult<()> {
        if self.validation_disabled {
            return Ok(());
        }
        self.verify_property(path).map(|_| ())
    }

    /// Resolves a property path, prefixed with the active scope
    fn verify_property(&self, path: &str) -> QueryResult<&'a PropertyDescriptor> {
        let scoped;
        let full_path = if self.scopes.is_empty() {
            path
        } else {
            scoped = format!("{}.{}", self.scopes.join("."), path);
            &scoped
        };

        self.registry
            .resolve_nested_property(self.declaration, full_path)
            .map_err(|e| unresolved_property(e, path, self.declaration))
    }

    fn verify_operator(&self, property: &PropertyDescriptor, operator: Operator) -> QueryResult<()> {
        let valid = match property.primitive_type() {
            Some(PrimitiveType::Boolean) => matches!(operator, Operator::Eq | Operator::Neq),
            _ => operator.is_comparison() || operator == Operator::Contains,
        };

        if valid {
            Ok(())
        } else {
            Err(QueryErrorKind::IncompatibleOperator {
                property: property.name().to_string(),
                field_type: property.type_label(),
                operator: operator.to_string(),
            }
            .into())
        }
    }

    fn verify_type_compatibility(
        &self,
        property: &PropertyDescriptor,
        literal: &Literal,
    ) -> QueryResult<()> {
        let unsupported = || QueryErrorKind::UnsupportedType {
            property: property.name().to_string(),
            field_type: property.type_label(),
        };

        // array literals are not supported
        if property.is_array() {
            return Err(unsupported().into());
        }

        let value = &literal.value;
        match property.kind() {
            PropertyKind::Primitive(primitive) => {
                let compatible = match primitive {
                    PrimitiveType::String => value.is_string(),
                    PrimitiveType::Integer | PrimitiveType::Long | PrimitiveType::Double => {
                        value.is_number()
                    }
                    PrimitiveType::Boolean => value.is_boolean(),
                    PrimitiveType::DateTime => value.as_str().is_some_and(is_date_time),
                };
                if compatible {
                    Ok(())
                } else {
                    Err(QueryErrorKind::IncompatibleType {
                        property: property.name().to_string(),
                        field_type: property.type_label(),
                        value: display_value(value),
                        value_type: literal.type_name().to_string(),
                    }
                    .into())
                }
            }
            PropertyKind::Relationship if !value.is_string() => {
                Err(QueryErrorKind::IncompatibleRelationship {
                    property: property.name().to_string(),
                    value: display_value(value),
                    value_type: literal.type_name().to_string(),
                }
                .into())
            }
            PropertyKind::Enum if !value.is_string() => Err(QueryErrorKind::IncompatibleEnum {
                property: property.name().to_string(),
                value: display_value(value),
                value_type: literal.type_name().to_string(),
            }
            .into()),
            PropertyKind::Relationship | PropertyKind::Enum => Ok(()),
            PropertyKind::Object => Err(unsupported().into()),
        }
    }
}

/// Accepts RFC 3339 and ISO 8601 offset timestamps, local date-times
/// and plain dates
fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
