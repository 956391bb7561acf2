//! Parameter manifest extraction
//!
//! Walks WHERE, ORDER BY, LIMIT and SKIP (in that order) and lists every
//! `_$parameter` reference with the primitive type it will be bound as.
//! A parameter compared with a property takes the property's type; enums
//! and relationships bind as strings. LIMIT and SKIP parameters are
//! integers. The same parameter used twice is listed twice.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{BinaryExpression, Expr, Operator};
use crate::model::{ModelRegistry, PrimitiveType, PropertyKind, TypeDeclaration};
use crate::query::{
    ClauseKind, ClauseVisitor, Limit, OrderBy, Query, QueryError, QueryErrorKind, QueryResult,
    Skip, Where,
};

use super::index::property_path;

/// One entry of a parameter manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: PrimitiveType,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, parameter_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }
}

/// Operand of a condition, as far as parameter typing is concerned
enum Operand<'e> {
    Parameter(&'e str),
    Property(String),
    Values(&'e [Expr]),
    Condition(&'e BinaryExpression),
    Other,
}

impl<'e> Operand<'e> {
    fn of(expr: &'e Expr) -> Self {
        match expr {
            Expr::Identifier(ident) => match ident.parameter() {
                Some(name) => Operand::Parameter(name),
                None => Operand::Property(ident.name.clone()),
            },
            Expr::Member(_) => property_path(expr).map_or(Operand::Other, Operand::Property),
            Expr::Array(array) => Operand::Values(&array.elements),
            Expr::Binary(binary) => Operand::Condition(binary),
            Expr::Literal(_) => Operand::Other,
        }
    }
}

/// Infers the parameter manifest of one query.
///
/// The query is expected to be validated; an analyzer is single use.
pub struct QueryAnalyzer<'a> {
    query: &'a Query,
    registry: &'a dyn ModelRegistry,
    declaration: Option<&'a TypeDeclaration>,
    scope: Option<String>,
}

impl<'a> QueryAnalyzer<'a> {
    pub fn new(query: &'a Query, registry: &'a dyn ModelRegistry) -> Self {
        Self {
            query,
            registry,
            declaration: None,
            scope: None,
        }
    }

    /// Lists every parameter reference in clause order
    pub fn analyze(mut self) -> QueryResult<Vec<ParameterSpec>> {
        let query = self.query;
        self.declaration = query.select().resource_type(self.registry)?;

        let parameters: Vec<ParameterSpec> = query
            .select()
            .accept(
                &mut self,
                &[
                    ClauseKind::Where,
                    ClauseKind::OrderBy,
                    ClauseKind::Limit,
                    ClauseKind::Skip,
                ],
            )?
            .into_iter()
            .flatten()
            .collect();

        debug!(query = %query.owner(), parameters = parameters.len(), "analyzed parameters");
        Ok(parameters)
    }

    fn analyze_expr(&mut self, expr: &Expr) -> QueryResult<Vec<ParameterSpec>> {
        match expr {
            Expr::Binary(binary) => self.analyze_binary(binary),
            _ => Ok(Vec::new()),
        }
    }

    fn analyze_binary(&mut self, binary: &BinaryExpression) -> QueryResult<Vec<ParameterSpec>> {
        match binary.operator {
            Operator::And | Operator::Or => {
                let mut parameters = self.analyze_expr(&binary.left)?;
                parameters.extend(self.analyze_expr(&binary.right)?);
                Ok(parameters)
            }
            Operator::Contains => self.analyze_contains(binary),
            _ => self.analyze_condition(binary),
        }
    }

    fn analyze_condition(&mut self, binary: &BinaryExpression) -> QueryResult<Vec<ParameterSpec>> {
        match (Operand::of(&binary.left), Operand::of(&binary.right)) {
            (Operand::Property(path), Operand::Parameter(name))
            | (Operand::Parameter(name), Operand::Property(path)) => {
                Ok(vec![ParameterSpec::new(name, self.parameter_type(&path)?)])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// A parameter tested for membership takes the array's element type;
    /// a condition on the other side is analyzed inside the array's scope.
    fn analyze_contains(&mut self, binary: &BinaryExpression) -> QueryResult<Vec<ParameterSpec>> {
        let (path, other) = match (Operand::of(&binary.left), Operand::of(&binary.right)) {
            (Operand::Property(path), other) | (other, Operand::Property(path)) => (path, other),
            _ => return Err(QueryErrorKind::ContainsWithoutProperty.into()),
        };

        match other {
            Operand::Parameter(name) => {
                Ok(vec![ParameterSpec::new(name, self.parameter_type(&path)?)])
            }
            Operand::Values(elements) => {
                let mut parameters = Vec::new();
                for element in elements {
                    if let Operand::Parameter(name) = Operand::of(element) {
                        parameters.push(ParameterSpec::new(name, self.parameter_type(&path)?));
                    }
                }
                Ok(parameters)
            }
            Operand::Condition(condition) => {
                let scope = self.scoped(&path);
                let outer = self.scope.replace(scope);
                let result = self.analyze_binary(condition);
                self.scope = outer;
                result
            }
            Operand::Property(_) | Operand::Other => Ok(Vec::new()),
        }
    }

    fn scoped(&self, path: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}.{}", scope, path),
            None => path.to_string(),
        }
    }

    /// Type a parameter compared with `path` is bound as
    fn parameter_type(&self, path: &str) -> QueryResult<PrimitiveType> {
        let declaration = self
            .declaration
            .ok_or(QueryErrorKind::ResourceRequired { clause: "WHERE" })?;
        let path = self.scoped(path);

        let property = self.registry.resolve_nested_property(declaration, &path)?;
        match property.kind() {
            PropertyKind::Primitive(primitive) => Ok(primitive),
            PropertyKind::Enum | PropertyKind::Relationship => Ok(PrimitiveType::String),
            PropertyKind::Object => Err(QueryError::new(QueryErrorKind::UnsupportedParameterType {
                property: format!("{}.{}", declaration.fully_qualified_name(), path),
            })),
        }
    }
}

impl ClauseVisitor for QueryAnalyzer<'_> {
    type Output = Vec<ParameterSpec>;

    fn visit_where(&mut self, clause: &Where) -> QueryResult<Vec<ParameterSpec>> {
        self.analyze_expr(clause.ast())
            .map_err(|e| clause.owner().locate(e.at(clause.ast().location())))
    }

    fn visit_order_by(&mut self, _clause: &OrderBy) -> QueryResult<Vec<ParameterSpec>> {
        Ok(Vec::new())
    }

    fn visit_limit(&mut self, clause: &Limit) -> QueryResult<Vec<ParameterSpec>> {
        Ok(clause
            .bound()
            .parameter()
            .map(|name| ParameterSpec::new(name, PrimitiveType::Integer))
            .into_iter()
            .collect())
    }

    fn visit_skip(&mut self, clause: &Skip) -> QueryResult<Vec<ParameterSpec>> {
        Ok(clause
            .bound()
            .parameter()
            .map(|name| ParameterSpec::new(name, PrimitiveType::Integer))
            .into_iter()
            .collect())
    }
}
