//! Read-only type registry interface used by query validation and compilation

use super::errors::{ModelError, ModelResult};
use super::types::{PropertyDescriptor, PropertyKind, TypeDeclaration};

/// Type registry consulted by the query compiler.
///
/// The compiler never mutates the registry. Implementors only need to
/// provide [`ModelRegistry::get_type`]; property lookup and path
/// navigation are derived from it.
pub trait ModelRegistry {
    /// Looks up a declaration by fully-qualified name
    fn get_type(&self, name: &str) -> Option<&TypeDeclaration>;

    /// Resolves the type a query selects from
    fn resolve_resource_type(&self, name: &str) -> ModelResult<&TypeDeclaration> {
        self.get_type(name)
            .ok_or_else(|| ModelError::TypeNotFound(name.to_string()))
    }

    /// Looks up a property on a declaration, including inherited properties
    fn get_property<'a>(
        &'a self,
        declaration: &'a TypeDeclaration,
        name: &str,
    ) -> Option<&'a PropertyDescriptor> {
        let mut current = Some(declaration);
        while let Some(decl) = current {
            if let Some(property) = decl.own_property(name) {
                return Some(property);
            }
            current = decl.super_type().and_then(|super_type| self.get_type(super_type));
        }
        None
    }

    /// Resolves a dotted property path, e.g. `address.phoneDetails.phoneNumber`.
    ///
    /// Every non-leaf segment must be a concept or relationship; arrays
    /// navigate into their element type.
    fn resolve_nested_property<'a>(
        &'a self,
        declaration: &'a TypeDeclaration,
        path: &str,
    ) -> ModelResult<&'a PropertyDescriptor> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = declaration;

        for (n, segment) in segments.iter().enumerate() {
            let property = self.get_property(current, segment).ok_or_else(|| {
                ModelError::PropertyNotFound {
                    property: segment.to_string(),
                    type_name: current.fully_qualified_name().to_string(),
                }
            })?;

            if n == segments.len() - 1 {
                return Ok(property);
            }

            match property.kind() {
                PropertyKind::Primitive(_) | PropertyKind::Enum => {
                    return Err(ModelError::NotNavigable {
                        property: segment.to_string(),
                        path: path.to_string(),
                    });
                }
                PropertyKind::Object | PropertyKind::Relationship => {
                    current = self.resolve_resource_type(property.declared_type())?;
                }
            }
        }

        // split() always yields at least one segment
        Err(ModelError::PropertyNotFound {
            property: path.to_string(),
            type_name: declaration.fully_qualified_name().to_string(),
        })
    }
}
