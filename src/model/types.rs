//! Type declarations consumed by the query compiler
//!
//! Supported primitive types:
//! - String, Integer, Long, Double, Boolean, DateTime
//!
//! Everything else is a reference to another declaration: a concept
//! (embedded object), an enum, or a relationship to a resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive property types, also used as parameter types in manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Integer,
    Long,
    Double,
    Boolean,
    DateTime,
}

impl PrimitiveType {
    /// Parses a primitive type name as written in model files
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(PrimitiveType::String),
            "Integer" => Some(PrimitiveType::Integer),
            "Long" => Some(PrimitiveType::Long),
            "Double" => Some(PrimitiveType::Double),
            "Boolean" => Some(PrimitiveType::Boolean),
            "DateTime" => Some(PrimitiveType::DateTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "String",
            PrimitiveType::Integer => "Integer",
            PrimitiveType::Long => "Long",
            PrimitiveType::Double => "Double",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::DateTime => "DateTime",
        }
    }

    /// Integer, Long and Double
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Integer | PrimitiveType::Long | PrimitiveType::Double
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a top-level declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Asset,
    Participant,
    Transaction,
    Event,
    Concept,
    Enum,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Asset => "asset",
            DeclarationKind::Participant => "participant",
            DeclarationKind::Transaction => "transaction",
            DeclarationKind::Event => "event",
            DeclarationKind::Concept => "concept",
            DeclarationKind::Enum => "enum",
        }
    }

    /// Only assets, participants and transactions live in registries
    pub fn is_queryable(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Asset | DeclarationKind::Participant | DeclarationKind::Transaction
        )
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a property's value is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Scalar primitive value
    Primitive(PrimitiveType),
    /// Enum value, stored as its string name
    Enum,
    /// Reference to a resource, stored as its identifier string
    Relationship,
    /// Embedded concept or other structured value
    Object,
}

/// A declared property on a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
    declared_type: String,
    array: bool,
    kind: PropertyKind,
}

impl PropertyDescriptor {
    /// Create a primitive property
    pub fn primitive(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            declared_type: primitive.as_str().to_string(),
            array: false,
            kind: PropertyKind::Primitive(primitive),
        }
    }

    /// Create a property holding an embedded concept
    pub fn object(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::reference(name, type_name, PropertyKind::Object)
    }

    /// Create an enum-typed property
    pub fn enumeration(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::reference(name, type_name, PropertyKind::Enum)
    }

    /// Create a relationship to another resource
    pub fn relationship(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::reference(name, type_name, PropertyKind::Relationship)
    }

    fn reference(name: impl Into<String>, type_name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            declared_type: type_name.into(),
            array: false,
            kind,
        }
    }

    /// Marks the property as an array of its declared type
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primitive name, or fully-qualified name of the referenced declaration
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(_))
    }

    pub fn is_enum(&self) -> bool {
        self.kind == PropertyKind::Enum
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == PropertyKind::Relationship
    }

    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self.kind {
            PropertyKind::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    /// Declared type with an `[]` suffix for arrays, for diagnostics
    pub fn type_label(&self) -> String {
        if self.array {
            format!("{}[]", self.declared_type)
        } else {
            self.declared_type.clone()
        }
    }

    pub(crate) fn set_kind(&mut self, kind: PropertyKind) {
        self.kind = kind;
    }
}

/// A declared type (asset, participant, transaction, event, concept or enum)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    fully_qualified_name: String,
    kind: DeclarationKind,
    super_type: Option<String>,
    properties: Vec<PropertyDescriptor>,
}

impl TypeDeclaration {
    pub fn new(fully_qualified_name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            kind,
            super_type: None,
            properties: Vec::new(),
        }
    }

    /// Adds a property
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Sets the fully-qualified super type
    pub fn with_super_type(mut self, super_type: impl Into<String>) -> Self {
        self.super_type = Some(super_type.into());
        self
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fully_qualified_name
    }

    /// Namespace portion of the fully-qualified name
    pub fn namespace(&self) -> &str {
        self.fully_qualified_name
            .rsplit_once('.')
            .map_or("", |(namespace, _)| namespace)
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn super_type(&self) -> Option<&str> {
        self.super_type.as_deref()
    }

    /// Properties declared directly on this type (not inherited)
    pub fn own_properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a property declared directly on this type
    pub fn own_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub(crate) fn own_properties_mut(&mut self) -> &mut [PropertyDescriptor] {
        &mut self.properties
    }
}

impl fmt::Display for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name)
    }
}

// =============================================================================
// Model file format
// =============================================================================

/// A model file as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub namespace: String,
    #[serde(default)]
    pub declarations: Vec<DeclarationDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationDef {
    pub name: String,
    pub kind: DeclarationKind,
    #[serde(default)]
    pub super_type: Option<String>,
    #[serde(default)]
    pub identified_by: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Enum values
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub relationship: bool,
}

impl ModelFile {
    /// Converts the file into declarations with qualified type names.
    ///
    /// Enum-typed properties are classified as objects until the registry
    /// links them against the declarations it knows about.
    pub fn into_declarations(self) -> Vec<TypeDeclaration> {
        let namespace = self.namespace;
        self.declarations
            .into_iter()
            .map(|def| {
                let mut declaration =
                    TypeDeclaration::new(qualify(&namespace, &def.name), def.kind);
                declaration.super_type = def.super_type.map(|name| qualify(&namespace, &name));
                declaration.properties = def
                    .properties
                    .into_iter()
                    .map(|prop| prop.into_descriptor(&namespace))
                    .collect();
                declaration
            })
            .collect()
    }
}

impl PropertyDef {
    fn into_descriptor(self, namespace: &str) -> PropertyDescriptor {
        let descriptor = match PrimitiveType::from_name(&self.type_name) {
            Some(primitive) if !self.relationship => PropertyDescriptor::primitive(self.name, primitive),
            _ if self.relationship => {
                PropertyDescriptor::relationship(self.name, qualify(namespace, &self.type_name))
            }
            _ => PropertyDescriptor::object(self.name, qualify(namespace, &self.type_name)),
        };
        if self.array {
            descriptor.array()
        } else {
            descriptor
        }
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if name.contains('.') || namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}
