//! Composite index compilation
//!
//! Every index starts with the three discriminator fields that scope a
//! document to its class and registry. Fields from ORDER BY come next,
//! then the properties WHERE references. The document store requires a
//! uniform direction across a composite index, so a descending ORDER BY
//! rewrites every field (discriminators included) to `{field: "desc"}`.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::ast::Expr;
use crate::query::{
    ClauseKind, ClauseVisitor, Limit, OrderBy, Query, QueryFile, QueryManager, QueryResult, Skip,
    SortDirection, Where,
};

/// Fields every index is prefixed with. The `$` is escaped for the
/// downstream index engine.
pub const DISCRIMINATOR_FIELDS: [&str; 3] = ["\\$class", "\\$registryType", "\\$registryId"];

/// Index document type
pub const INDEX_TYPE: &str = "json";

/// One field of a composite index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexField {
    /// Field with no explicit direction, serialized as a bare string
    Plain(String),
    /// Field with an explicit direction, serialized as `{field: direction}`
    Directed {
        field: String,
        direction: SortDirection,
    },
}

impl IndexField {
    pub fn name(&self) -> &str {
        match self {
            IndexField::Plain(field) => field,
            IndexField::Directed { field, .. } => field,
        }
    }

    pub fn direction(&self) -> Option<SortDirection> {
        match self {
            IndexField::Plain(_) => None,
            IndexField::Directed { direction, .. } => Some(*direction),
        }
    }
}

impl Serialize for IndexField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IndexField::Plain(field) => serializer.serialize_str(field),
            IndexField::Directed { field, direction } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, direction.as_str())?;
                map.end()
            }
        }
    }
}

/// `index` member of an index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub fields: Vec<IndexField>,
}

/// Compiled index for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    pub name: String,
    pub ddoc: String,
    #[serde(rename = "type")]
    pub index_type: String,
    pub index: IndexSpec,
}

/// Insertion-ordered field set; re-adding a field replaces it in place
#[derive(Debug, Default)]
struct FieldAccumulator {
    fields: Vec<IndexField>,
    positions: HashMap<String, usize>,
    direction: Option<SortDirection>,
}

impl FieldAccumulator {
    fn add(&mut self, field: IndexField) {
        if self.direction.is_none() {
            self.direction = field.direction();
        }

        match self.positions.get(field.name()) {
            Some(&position) => self.fields[position] = field,
            None => {
                self.positions
                    .insert(field.name().to_string(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    fn into_fields(self) -> Vec<IndexField> {
        let mut fields: Vec<IndexField> = DISCRIMINATOR_FIELDS
            .iter()
            .map(|field| IndexField::Plain(field.to_string()))
            .chain(self.fields)
            .collect();

        if self.direction == Some(SortDirection::Desc) {
            for field in &mut fields {
                if let IndexField::Plain(name) = field {
                    let name = std::mem::take(name);
                    *field = IndexField::Directed {
                        field: name,
                        direction: SortDirection::Desc,
                    };
                }
            }
        }
        fields
    }
}

/// Compiles validated queries into composite index definitions
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexCompiler;

impl IndexCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles one query. The query is expected to be validated.
    pub fn compile(&self, query: &Query) -> QueryResult<IndexDefinition> {
        let additions = query.select().accept(
            &mut IndexCompiler,
            &[
                ClauseKind::OrderBy,
                ClauseKind::Where,
                ClauseKind::Limit,
                ClauseKind::Skip,
            ],
        )?;

        let mut accumulator = FieldAccumulator::default();
        for field in additions.into_iter().flatten() {
            accumulator.add(field);
        }
        let fields = accumulator.into_fields();
        debug!(query = %query.owner(), fields = fields.len(), "compiled index");

        Ok(IndexDefinition {
            name: query.name().to_string(),
            ddoc: format!("{}Doc", query.name()),
            index_type: INDEX_TYPE.to_string(),
            index: IndexSpec { fields },
        })
    }

    /// Compiles every query of a file, in declaration order
    pub fn compile_file(&self, file: &QueryFile) -> QueryResult<Vec<IndexDefinition>> {
        file.queries().iter().map(|query| self.compile(query)).collect()
    }

    /// Compiles the manager's query file; empty when none is installed
    pub fn compile_manager(&self, manager: &QueryManager) -> QueryResult<Vec<IndexDefinition>> {
        match manager.query_file() {
            Some(file) => self.compile_file(file),
            None => Ok(Vec::new()),
        }
    }
}

impl ClauseVisitor for IndexCompiler {
    type Output = Vec<IndexField>;

    fn visit_where(&mut self, clause: &Where) -> QueryResult<Vec<IndexField>> {
        let mut paths = Vec::new();
        collect_paths(clause.ast(), &mut paths);
        Ok(paths.into_iter().map(IndexField::Plain).collect())
    }

    fn visit_order_by(&mut self, clause: &OrderBy) -> QueryResult<Vec<IndexField>> {
        Ok(clause
            .sort_criteria()
            .iter()
            .map(|sort| IndexField::Directed {
                field: sort.property_path().to_string(),
                direction: sort.direction(),
            })
            .collect())
    }

    fn visit_limit(&mut self, _clause: &Limit) -> QueryResult<Vec<IndexField>> {
        Ok(Vec::new())
    }

    fn visit_skip(&mut self, _clause: &Skip) -> QueryResult<Vec<IndexField>> {
        Ok(Vec::new())
    }
}

/// Collects referenced property paths left to right. Parameters and
/// literals contribute nothing.
fn collect_paths(expr: &Expr, paths: &mut Vec<String>) {
    match expr {
        Expr::Binary(binary) => {
            collect_paths(&binary.left, paths);
            collect_paths(&binary.right, paths);
        }
        Expr::Identifier(ident) => {
            if ident.parameter().is_none() {
                paths.push(ident.name.clone());
            }
        }
        Expr::Member(_) => {
            if let Some(path) = property_path(expr) {
                paths.push(path);
            }
        }
        Expr::Array(array) => {
            for element in &array.elements {
                collect_paths(element, paths);
            }
        }
        Expr::Literal(_) => {}
    }
}

/// Dotted path named by an identifier or member chain
pub(crate) fn property_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) if ident.parameter().is_none() => Some(ident.name.clone()),
        Expr::Member(member) => {
            let object = property_path(&member.object)?;
            let property = property_path(&member.property)?;
            Some(format!("{}.{}", object, property))
        }
        _ => None,
    }
}
