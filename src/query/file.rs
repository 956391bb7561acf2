//! Query file: the queries declared in one source file

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::ast::{QueryAst, QueryFileAst};
use crate::model::ModelRegistry;

use super::definition::Query;
use super::errors::{QueryError, QueryErrorKind, QueryResult};

/// Queries of one file, in declaration order
#[derive(Clone)]
pub struct QueryFile {
    identifier: String,
    registry: Arc<dyn ModelRegistry>,
    queries: Vec<Query>,
}

impl std::fmt::Debug for QueryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFile")
            .field("identifier", &self.identifier)
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}

impl QueryFile {
    /// Builds the file from its parsed AST. Names are not checked for
    /// uniqueness until [`QueryFile::validate`].
    pub fn new(
        identifier: impl Into<String>,
        registry: Arc<dyn ModelRegistry>,
        ast: &QueryFileAst,
    ) -> QueryResult<Self> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(QueryError::invalid_input("Query file requires an identifier"));
        }

        let queries = ast
            .queries
            .iter()
            .map(|query| Query::from_ast(&identifier, query))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self {
            identifier,
            registry,
            queries,
        })
    }

    /// Builds the file from the parser's JSON output
    pub fn from_json(
        identifier: impl Into<String>,
        registry: Arc<dyn ModelRegistry>,
        source: &str,
    ) -> QueryResult<Self> {
        let identifier = identifier.into();
        let ast: QueryFileAst = serde_json::from_str(source).map_err(|e| {
            warn!(file = %identifier, error = %e, "rejected query file");
            QueryError::malformed(format!("Invalid query file JSON: {}", e)).in_file(&identifier)
        })?;
        Self::new(identifier, registry, &ast)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn registry(&self) -> &dyn ModelRegistry {
        self.registry.as_ref()
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Looks up a query by name
    pub fn query(&self, name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.name() == name)
    }

    /// Appends a query built from `ast`
    pub fn add_query(&mut self, ast: &QueryAst) -> QueryResult<&Query> {
        let query = Query::from_ast(&self.identifier, ast)?;
        self.queries.push(query);
        Ok(&self.queries[self.queries.len() - 1])
    }

    /// Checks query names are unique, then validates each query
    pub fn validate(&self) -> QueryResult<()> {
        let mut names = HashSet::new();
        for query in &self.queries {
            if !names.insert(query.name()) {
                return Err(QueryError::new(QueryErrorKind::DuplicateQuery {
                    name: query.name().to_string(),
                })
                .in_file(&self.identifier)
                .at(query.location()));
            }
        }

        for query in &self.queries {
            query.validate(self.registry())?;
        }

        info!(file = %self.identifier, queries = self.queries.len(), "validated query file");
        Ok(())
    }
}
