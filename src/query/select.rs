//! SELECT statement

use tracing::debug;

use crate::ast::{SelectAst, SourceLocation};
use crate::model::{ModelRegistry, TypeDeclaration};

use super::clause::{Limit, QueryRef, Skip, Where};
use super::errors::{QueryError, QueryErrorKind, QueryResult};
use super::order_by::OrderBy;
use super::visitor::{Clause, ClauseKind, ClauseVisitor};

/// A SELECT statement with its optional clauses
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    owner: QueryRef,
    resource: Option<String>,
    from: Option<String>,
    where_clause: Option<Where>,
    order_by: Option<OrderBy>,
    limit: Option<Limit>,
    skip: Option<Skip>,
    location: Option<SourceLocation>,
}

impl Select {
    /// Builds the statement from its AST. Structural checks only; the
    /// registry is not consulted until [`Select::validate`].
    pub fn from_ast(owner: QueryRef, ast: &SelectAst) -> QueryResult<Self> {
        let where_clause = ast
            .where_clause
            .as_ref()
            .map(|expr| Where::new(owner.clone(), expr.clone()));
        let order_by = ast
            .order_by
            .as_deref()
            .map(|sorts| OrderBy::from_ast(owner.clone(), sorts))
            .transpose()?;
        let limit = ast
            .limit
            .as_ref()
            .map(|expr| Limit::from_ast(owner.clone(), expr))
            .transpose()?;
        let skip = ast
            .skip
            .as_ref()
            .map(|expr| Skip::from_ast(owner.clone(), expr))
            .transpose()?;

        Ok(Self {
            resource: ast.resource.clone().filter(|r| !r.is_empty()),
            from: ast.from.clone(),
            where_clause,
            order_by,
            limit,
            skip,
            location: ast.location,
            owner,
        })
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    /// Fully-qualified name of the selected type
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Registry override named by `FROM`
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn where_clause(&self) -> Option<&Where> {
        self.where_clause.as_ref()
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn skip(&self) -> Option<&Skip> {
        self.skip.as_ref()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Resolves the selected type, rejecting types that have no registry
    pub fn resource_type<'r>(
        &self,
        registry: &'r dyn ModelRegistry,
    ) -> QueryResult<Option<&'r TypeDeclaration>> {
        let Some(resource) = self.resource() else {
            return Ok(None);
        };

        let declaration = registry
            .resolve_resource_type(resource)
            .map_err(|e| self.owner.locate(QueryError::from(e).at(self.location())))?;

        if !declaration.kind().is_queryable() {
            return Err(self.owner.locate(
                QueryError::new(QueryErrorKind::NotQueryable {
                    type_name: declaration.fully_qualified_name().to_string(),
                    kind: declaration.kind().to_string(),
                })
                .at(self.location()),
            ));
        }
        Ok(Some(declaration))
    }

    /// Validates the resource type and every clause against it
    pub fn validate(&self, registry: &dyn ModelRegistry) -> QueryResult<()> {
        let Some(declaration) = self.resource_type(registry)? else {
            let clause = if self.where_clause.is_some() {
                Some("WHERE")
            } else if self.order_by.is_some() {
                Some("ORDER BY")
            } else {
                None
            };
            return match clause {
                Some(clause) => Err(self.owner.locate(
                    QueryError::new(QueryErrorKind::ResourceRequired { clause })
                        .at(self.location()),
                )),
                None => Ok(()),
            };
        };

        debug!(query = %self.owner, resource = %declaration, "validating select");

        if let Some(where_clause) = &self.where_clause {
            where_clause.validate(declaration, registry)?;
        }
        if let Some(order_by) = &self.order_by {
            order_by.validate(declaration, registry)?;
        }
        Ok(())
    }

    /// Dispatches the present clauses to `visitor` in the given order.
    ///
    /// Absent clauses are skipped; outputs are returned in visiting order.
    pub fn accept<V: ClauseVisitor>(
        &self,
        visitor: &mut V,
        order: &[ClauseKind],
    ) -> QueryResult<Vec<V::Output>> {
        let mut outputs = Vec::with_capacity(order.len());
        for kind in order {
            let output = match kind {
                ClauseKind::Where => self.where_clause.as_ref().map(|c| c.accept(visitor)),
                ClauseKind::OrderBy => self.order_by.as_ref().map(|c| c.accept(visitor)),
                ClauseKind::Limit => self.limit.as_ref().map(|c| c.accept(visitor)),
                ClauseKind::Skip => self.skip.as_ref().map(|c| c.accept(visitor)),
            };
            if let Some(output) = output {
                outputs.push(output?);
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Operator, SortAst};
    use crate::model::{DeclarationKind, ModelManager, PrimitiveType, PropertyDescriptor};

    fn owner() -> QueryRef {
        QueryRef::new("test.qry", "Q1")
    }

    fn registry() -> ModelManager {
        ModelManager::from_declarations([
            TypeDeclaration::new("org.acme.Vehicle", DeclarationKind::Asset)
                .with_property(PropertyDescriptor::primitive("vin", PrimitiveType::String)),
            TypeDeclaration::new("org.acme.Engine", DeclarationKind::Concept),
        ])
        .unwrap()
    }

    struct Recorder;

    impl ClauseVisitor for Recorder {
        type Output = &'static str;

        fn visit_where(&mut self, _: &Where) -> QueryResult<&'static str> {
            Ok("where")
        }
        fn visit_order_by(&mut self, _: &OrderBy) -> QueryResult<&'static str> {
            Ok("orderBy")
        }
        fn visit_limit(&mut self, _: &Limit) -> QueryResult<&'static str> {
            Ok("limit")
        }
        fn visit_skip(&mut self, _: &Skip) -> QueryResult<&'static str> {
            Ok("skip")
        }
    }

    #[test]
    fn test_accept_follows_requested_order() {
        let ast = SelectAst::resource("org.acme.Vehicle")
            .with_where(Expr::binary(Operator::Eq, Expr::ident("vin"), Expr::literal("1")))
            .with_sort(SortAst::asc("vin"))
            .with_skip(Expr::literal(2));
        let select = Select::from_ast(owner(), &ast).unwrap();

        let visited = select
            .accept(
                &mut Recorder,
                &[ClauseKind::OrderBy, ClauseKind::Where, ClauseKind::Limit, ClauseKind::Skip],
            )
            .unwrap();
        assert_eq!(visited, vec!["orderBy", "where", "skip"]);
    }

    #[test]
    fn test_concept_not_queryable() {
        let select = Select::from_ast(owner(), &SelectAst::resource("org.acme.Engine")).unwrap();
        let err = select.validate(&registry()).unwrap_err();
        assert_eq!(err.code(), "QRY_TYPE_NOT_QUERYABLE");
        assert!(err
            .to_string()
            .contains("Can only select assets, participants and transactions"));
    }

    #[test]
    fn test_unknown_resource() {
        let select = Select::from_ast(owner(), &SelectAst::resource("org.acme.Boat")).unwrap();
        let err = select.validate(&registry()).unwrap_err();
        assert_eq!(err.code(), "QRY_MODEL_TYPE_NOT_FOUND");
        assert_eq!(err.file(), Some("test.qry"));
    }

    #[test]
    fn test_resource_required_for_where() {
        let ast = SelectAst::default()
            .with_where(Expr::binary(Operator::Eq, Expr::ident("vin"), Expr::literal("1")));
        let select = Select::from_ast(owner(), &ast).unwrap();
        let err = select.validate(&registry()).unwrap_err();
        assert_eq!(err.kind(), &QueryErrorKind::ResourceRequired { clause: "WHERE" });

        let bare = Select::from_ast(owner(), &SelectAst::default().with_limit(Expr::literal(1)))
            .unwrap();
        assert!(bare.validate(&registry()).is_ok());
    }
}
