//! Type registry subsystem
//!
//! The query compiler resolves resource types and property paths through
//! the read-only [`ModelRegistry`] interface. [`ModelManager`] is the
//! in-memory implementation, loaded from JSON model files.
//!
//! # Resolution rules
//!
//! - Resource types are looked up by fully-qualified name
//! - Property paths are dotted; each segment may be inherited from a super type
//! - Only concepts and relationships can be navigated into

mod errors;
mod manager;
mod registry;
mod types;

pub use errors::{ModelError, ModelResult};
pub use manager::ModelManager;
pub use registry::ModelRegistry;
pub use types::{
    DeclarationDef, DeclarationKind, ModelFile, PrimitiveType, PropertyDef, PropertyDescriptor,
    PropertyKind, TypeDeclaration,
};
