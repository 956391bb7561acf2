//! Named query declaration

use crate::ast::{QueryAst, SourceLocation};
use crate::model::ModelRegistry;

use super::clause::QueryRef;
use super::errors::{QueryError, QueryResult};
use super::select::Select;

/// A named query owning one SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    owner: QueryRef,
    description: Option<String>,
    select: Select,
    location: Option<SourceLocation>,
}

impl Query {
    /// Builds a query declared in the file `file`
    pub fn from_ast(file: &str, ast: &QueryAst) -> QueryResult<Self> {
        let located = |e: QueryError| e.in_file(file).at(ast.location.as_ref());

        if file.is_empty() {
            return Err(located(QueryError::invalid_input("Query requires an owning file")));
        }
        let name = match &ast.identifier {
            Some(identifier) if !identifier.name.is_empty() => identifier.name.as_str(),
            _ => return Err(located(QueryError::invalid_input("Query requires a name"))),
        };
        let select_ast = ast.select.as_ref().ok_or_else(|| {
            located(QueryError::invalid_input("Query requires a SELECT statement")).in_query(name)
        })?;

        let owner = QueryRef::new(file, name);
        let select = Select::from_ast(owner.clone(), select_ast)
            .map_err(|e| owner.locate(e.at(ast.location.as_ref())))?;

        Ok(Self {
            owner,
            description: ast.description.clone(),
            select,
            location: ast.location,
        })
    }

    pub fn name(&self) -> &str {
        self.owner.query()
    }

    /// Identifier of the file the query was declared in
    pub fn file(&self) -> &str {
        self.owner.file()
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn validate(&self, registry: &dyn ModelRegistry) -> QueryResult<()> {
        self.select
            .validate(registry)
            .map_err(|e| self.owner.locate(e.at(self.location())))
    }
}
