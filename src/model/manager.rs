//! In-memory type registry loaded from JSON model files
//!
//! Model files are linked as they are added: every referenced type must
//! be declared, and properties pointing at enums are classified as such.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::debug;

use super::errors::{ModelError, ModelResult};
use super::registry::ModelRegistry;
use super::types::{DeclarationKind, ModelFile, PropertyKind, TypeDeclaration};

/// Registry of type declarations indexed by fully-qualified name.
///
/// BTreeMap keeps iteration order deterministic.
#[derive(Debug, Clone, Default)]
pub struct ModelManager {
    types: BTreeMap<String, TypeDeclaration>,
}

impl ModelManager {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from already-constructed declarations.
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = TypeDeclaration>,
    ) -> ModelResult<Self> {
        let mut manager = Self::new();
        manager.add_declarations(declarations)?;
        Ok(manager)
    }

    /// Adds a parsed model file and re-links the registry.
    pub fn add_model_file(&mut self, file: ModelFile) -> ModelResult<()> {
        debug!(namespace = %file.namespace, "adding model file");
        self.add_declarations(file.into_declarations())
    }

    /// Parses and adds a model file from JSON text.
    pub fn add_model_json(&mut self, source_name: &str, content: &str) -> ModelResult<()> {
        let file: ModelFile = serde_json::from_str(content)
            .map_err(|e| ModelError::malformed(source_name, format!("Invalid JSON: {}", e)))?;
        self.add_model_file(file)
    }

    /// Loads a model file from disk.
    pub fn load_file(&mut self, path: &Path) -> ModelResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            ModelError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;
        self.add_model_json(&path.display().to_string(), &content)
    }

    /// Adds declarations atomically: on error the registry is unchanged.
    pub fn add_declarations(
        &mut self,
        declarations: impl IntoIterator<Item = TypeDeclaration>,
    ) -> ModelResult<()> {
        let mut types = self.types.clone();
        for declaration in declarations {
            let name = declaration.fully_qualified_name().to_string();
            if types.contains_key(&name) {
                return Err(ModelError::DuplicateType(name));
            }
            types.insert(name, declaration);
        }

        link(&mut types)?;
        self.types = types;
        Ok(())
    }

    /// Number of declared types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates declarations in name order
    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.values()
    }
}

impl ModelRegistry for ModelManager {
    fn get_type(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }
}

/// Checks every reference resolves and classifies enum-typed properties.
fn link(types: &mut BTreeMap<String, TypeDeclaration>) -> ModelResult<()> {
    let enums: Vec<String> = types
        .values()
        .filter(|decl| decl.kind() == DeclarationKind::Enum)
        .map(|decl| decl.fully_qualified_name().to_string())
        .collect();

    let mut missing = None;
    for declaration in types.values() {
        if let Some(super_type) = declaration.super_type() {
            if !types.contains_key(super_type) {
                missing = Some(super_type.to_string());
                break;
            }
        }
        let unresolved = declaration
            .own_properties()
            .iter()
            .filter(|p| !p.is_primitive())
            .find(|p| !types.contains_key(p.declared_type()));
        if let Some(property) = unresolved {
            missing = Some(property.declared_type().to_string());
            break;
        }
    }
    if let Some(name) = missing {
        return Err(ModelError::TypeNotFound(name));
    }

    for declaration in types.values() {
        let mut seen = HashSet::new();
        let mut current = Some(declaration);
        while let Some(decl) = current {
            if !seen.insert(decl.fully_qualified_name()) {
                return Err(ModelError::CyclicSuperType(
                    declaration.fully_qualified_name().to_string(),
                ));
            }
            current = decl.super_type().and_then(|name| types.get(name));
        }
    }

    for declaration in types.values_mut() {
        for property in declaration.own_properties_mut() {
            if property.kind() == PropertyKind::Object
                && enums.iter().any(|name| name == property.declared_type())
            {
                property.set_kind(PropertyKind::Enum);
            }
        }
    }

    Ok(())
}
