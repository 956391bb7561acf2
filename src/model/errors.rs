//! # Model Errors
//!
//! Error types for the type registry.

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading model files or resolving types and properties
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// No declaration with this fully-qualified name
    #[error("Type {0} not found")]
    TypeNotFound(String),

    /// Two declarations share a fully-qualified name
    #[error("Type {0} is declared more than once")]
    DuplicateType(String),

    /// A path segment names no property on the current type
    #[error("Property {property} does not exist on {type_name}")]
    PropertyNotFound { property: String, type_name: String },

    /// A non-leaf path segment cannot be navigated into
    #[error("Property {property} is a primitive or enum. Invalid property path: {path}")]
    NotNavigable { property: String, path: String },

    /// A super-type chain leads back to the declaration it started from
    #[error("Type {0} has a cyclic super type chain")]
    CyclicSuperType(String),

    /// Model file could not be read or parsed
    #[error("Malformed model file '{source_name}': {reason}")]
    MalformedModel { source_name: String, reason: String },
}

impl ModelError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::MalformedModel {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::TypeNotFound(_) => "QRY_MODEL_TYPE_NOT_FOUND",
            ModelError::DuplicateType(_) => "QRY_MODEL_DUPLICATE_TYPE",
            ModelError::PropertyNotFound { .. } => "QRY_MODEL_PROPERTY_NOT_FOUND",
            ModelError::NotNavigable { .. } => "QRY_MODEL_INVALID_PATH",
            ModelError::CyclicSuperType(_) => "QRY_MODEL_CYCLIC_SUPER_TYPE",
            ModelError::MalformedModel { .. } => "QRY_MODEL_MALFORMED",
        }
    }
}
