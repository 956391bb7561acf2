//! ORDER BY clause
//!
//! A composite index serves one sort direction only, so every criterion
//! in an ORDER BY must use the same direction.

use std::fmt;

use crate::ast::{SortAst, SourceLocation};
use crate::model::{ModelRegistry, TypeDeclaration};

use super::clause::QueryRef;
use super::errors::{QueryError, QueryErrorKind, QueryResult};
use super::validator::unresolved_property;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `ASC` / `DESC` (case-insensitive); absent means ascending
    pub fn parse(direction: Option<&str>) -> QueryResult<Self> {
        match direction {
            None => Ok(SortDirection::Asc),
            Some(d) if d.eq_ignore_ascii_case("ASC") => Ok(SortDirection::Asc),
            Some(d) if d.eq_ignore_ascii_case("DESC") => Ok(SortDirection::Desc),
            Some(d) => Err(QueryError::invalid_input(format!(
                "Invalid sort direction '{}'. Expected ASC or DESC.",
                d
            ))),
        }
    }

    /// Lowercase form used in index definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

/// A single sort criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    owner: QueryRef,
    property_path: String,
    direction: SortDirection,
    location: Option<SourceLocation>,
}

impl Sort {
    pub fn from_ast(owner: QueryRef, ast: &SortAst) -> QueryResult<Self> {
        let located = |e: QueryError| owner.locate(e.at(ast.location.as_ref()));

        let property_path = match &ast.field_name {
            Some(field) if !field.name.is_empty() => field.name.clone(),
            _ => return Err(located(QueryError::invalid_input("Sort requires a field name"))),
        };
        let direction = SortDirection::parse(ast.direction.as_deref()).map_err(located)?;

        Ok(Self {
            owner,
            property_path,
            direction,
            location: ast.location,
        })
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    /// Dotted property path being sorted on
    pub fn property_path(&self) -> &str {
        &self.property_path
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Checks the property path exists on the resource type
    pub fn validate(
        &self,
        declaration: &TypeDeclaration,
        registry: &dyn ModelRegistry,
    ) -> QueryResult<()> {
        registry
            .resolve_nested_property(declaration, &self.property_path)
            .map(|_| ())
            .map_err(|e| {
                self.owner.locate(
                    unresolved_property(e, &self.property_path, declaration).at(self.location()),
                )
            })
    }
}

/// ORDER BY clause: sort criteria in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    owner: QueryRef,
    sort_criteria: Vec<Sort>,
}

impl OrderBy {
    pub fn from_ast(owner: QueryRef, ast: &[SortAst]) -> QueryResult<Self> {
        if ast.is_empty() {
            return Err(owner.locate(QueryError::invalid_input(
                "ORDER BY requires at least one sort criterion",
            )));
        }

        let sort_criteria = ast
            .iter()
            .map(|sort| Sort::from_ast(owner.clone(), sort))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self {
            owner,
            sort_criteria,
        })
    }

    pub fn owner(&self) -> &QueryRef {
        &self.owner
    }

    pub fn sort_criteria(&self) -> &[Sort] {
        &self.sort_criteria
    }

    /// Direction of the first criterion
    pub fn direction(&self) -> SortDirection {
        self.sort_criteria
            .first()
            .map(Sort::direction)
            .unwrap_or_default()
    }

    /// Checks each sort property exists and that all directions agree
    pub fn validate(
        &self,
        declaration: &TypeDeclaration,
        registry: &dyn ModelRegistry,
    ) -> QueryResult<()> {
        let direction = self.direction();
        for sort in &self.sort_criteria {
            sort.validate(declaration, registry)?;

            if sort.direction() != direction {
                return Err(self.owner.locate(
                    QueryError::new(QueryErrorKind::MixedSortDirections {
                        first: direction.to_string(),
                        conflicting: sort.direction().to_string(),
                    })
                    .at(sort.location()),
                ));
            }
        }
        Ok(())
    }
}
