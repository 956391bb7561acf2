//! Holds the registry and the active query file

use std::sync::Arc;

use tracing::info;

use crate::model::ModelRegistry;

use super::errors::QueryResult;
use super::file::QueryFile;

/// Owns a registry and at most one validated query file
pub struct QueryManager {
    registry: Arc<dyn ModelRegistry>,
    query_file: Option<QueryFile>,
}

impl QueryManager {
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self {
        Self {
            registry,
            query_file: None,
        }
    }

    pub fn registry(&self) -> &dyn ModelRegistry {
        self.registry.as_ref()
    }

    /// Parses a query file against this manager's registry.
    ///
    /// The file is not validated and not installed.
    pub fn create_query_file(&self, identifier: &str, source: &str) -> QueryResult<QueryFile> {
        QueryFile::from_json(identifier, Arc::clone(&self.registry), source)
    }

    /// Validates and installs `file`, replacing any previous one.
    ///
    /// On error the current file is kept.
    pub fn set_query_file(&mut self, file: QueryFile) -> QueryResult<()> {
        file.validate()?;
        info!(file = %file.identifier(), "installed query file");
        self.query_file = Some(file);
        Ok(())
    }

    pub fn query_file(&self) -> Option<&QueryFile> {
        self.query_file.as_ref()
    }

    pub fn clear_query_file(&mut self) {
        self.query_file = None;
    }
}
