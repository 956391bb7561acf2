//! Expression AST nodes for WHERE clauses
//!
//! Node shapes mirror the JSON emitted by the query parser:
//! every node carries a `type` tag and an optional source `location`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::SourceLocation;

/// Marker prefix that turns an identifier into a query parameter reference.
pub const PARAMETER_PREFIX: &str = "_$";

/// Returns the parameter name if `identifier` is a parameter reference.
pub fn parameter_name(identifier: &str) -> Option<&str> {
    identifier
        .strip_prefix(PARAMETER_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Binary operators understood by the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Contains => "CONTAINS",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Eq => "==",
            Operator::Neq => "!=",
        }
    }

    /// AND / OR: both operands are sub-expressions
    pub fn is_combinator(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    /// Scalar comparison between a property and a value
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte | Operator::Eq | Operator::Neq
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WHERE clause expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryExpression),
    #[serde(rename = "Identifier")]
    Identifier(Identifier),
    #[serde(rename = "Literal")]
    Literal(Literal),
    #[serde(rename = "MemberExpression")]
    Member(MemberExpression),
    #[serde(rename = "ArrayExpression")]
    Array(ArrayExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub operator: Operator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Identifier {
    /// Parameter name, if this identifier is a parameter reference
    pub fn parameter(&self) -> Option<&str> {
        parameter_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Literal {
    /// Name of the literal's runtime type, as reported in diagnostics.
    ///
    /// `null`, arrays and objects all report as "object".
    pub fn type_name(&self) -> &'static str {
        match self.value {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Expr>,
    pub property: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayExpression {
    pub elements: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Expr {
    /// Create a binary expression
    pub fn binary(operator: Operator, left: Expr, right: Expr) -> Self {
        Expr::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            location: None,
        })
    }

    /// Create an identifier (property name or `_$parameter`)
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(Identifier {
            name: name.into(),
            location: None,
        })
    }

    /// Create a literal
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(Literal {
            value: value.into(),
            location: None,
        })
    }

    /// Create a member expression from a dotted path, e.g. `a.b.c`
    pub fn path(path: &str) -> Self {
        let mut segments = path.split('.');
        let first = Expr::ident(segments.next().unwrap_or_default());
        segments.fold(first, |object, segment| {
            Expr::Member(MemberExpression {
                object: Box::new(object),
                property: Box::new(Expr::ident(segment)),
                location: None,
            })
        })
    }

    /// Create an array expression
    pub fn array(elements: Vec<Expr>) -> Self {
        Expr::Array(ArrayExpression {
            elements,
            location: None,
        })
    }

    /// Node tag as emitted by the parser
    pub fn node_type(&self) -> &'static str {
        match self {
            Expr::Binary(_) => "BinaryExpression",
            Expr::Identifier(_) => "Identifier",
            Expr::Literal(_) => "Literal",
            Expr::Member(_) => "MemberExpression",
            Expr::Array(_) => "ArrayExpression",
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Expr::Binary(node) => node.location.as_ref(),
            Expr::Identifier(node) => node.location.as_ref(),
            Expr::Literal(node) => node.location.as_ref(),
            Expr::Member(node) => node.location.as_ref(),
            Expr::Array(node) => node.location.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_marker() {
        assert_eq!(parameter_name("_$limit"), Some("limit"));
        assert_eq!(parameter_name("value"), None);
        assert_eq!(parameter_name("_$"), None);
    }

    #[test]
    fn test_deserialize_condition() {
        let expr: Expr = serde_json::from_value(json!({
            "type": "BinaryExpression",
            "operator": "==",
            "left": { "type": "Identifier", "name": "value" },
            "right": { "type": "Literal", "value": "Green hat" }
        }))
        .unwrap();

        assert_eq!(
            expr,
            Expr::binary(Operator::Eq, Expr::ident("value"), Expr::literal("Green hat"))
        );
    }

    #[test]
    fn test_unknown_node_rejected() {
        let result: Result<Expr, _> = serde_json::from_value(json!({ "type": "Unknown" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_path_builds_member_chain() {
        let expr = Expr::path("address.city");
        match expr {
            Expr::Member(member) => {
                assert_eq!(*member.object, Expr::ident("address"));
                assert_eq!(*member.property, Expr::ident("city"));
            }
            other => panic!("unexpected node {}", other.node_type()),
        }
    }

    #[test]
    fn test_literal_type_names() {
        assert_eq!(Literal { value: json!("x"), location: None }.type_name(), "string");
        assert_eq!(Literal { value: json!(1.5), location: None }.type_name(), "number");
        assert_eq!(Literal { value: json!(true), location: None }.type_name(), "boolean");
        assert_eq!(Literal { value: json!(null), location: None }.type_name(), "object");
    }

    #[test]
    fn test_operator_classes() {
        assert!(Operator::And.is_combinator());
        assert!(!Operator::Contains.is_comparison());
        assert!(Operator::Neq.is_comparison());
        assert_eq!(Operator::Gte.to_string(), ">=");
    }
}
