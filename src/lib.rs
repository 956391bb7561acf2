//! qryc - schema-aware query compiler
//!
//! Validates parsed `SELECT ... WHERE ... ORDER BY ... LIMIT ... SKIP`
//! queries against a typed resource model and compiles them into
//! composite index definitions and typed parameter manifests.

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod model;
pub mod query;
