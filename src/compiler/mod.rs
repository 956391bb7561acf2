//! Compiler backends over validated queries
//!
//! - `IndexCompiler`: composite index definition per query
//! - `QueryAnalyzer`: typed parameter manifest per query
//!
//! The backends are independent of each other. Both expect queries that
//! have passed `validate()`.

mod analyzer;
mod index;

pub use analyzer::{ParameterSpec, QueryAnalyzer};
pub use index::{
    IndexCompiler, IndexDefinition, IndexField, IndexSpec, DISCRIMINATOR_FIELDS, INDEX_TYPE,
};
