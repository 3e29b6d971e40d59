//! RegistryBuilder for constructing an immutable Registry.

use crate::{ChildNodeDef, NodeTypeDef, PropertyDef, Registry, TemplateNode};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Unknown super type: {0}")]
    UnknownSuperType(String),

    #[error("Unknown type {type_name} referenced by {referenced_by}")]
    UnknownReferencedType {
        type_name: String,
        referenced_by: String,
    },

    #[error("Invalid pattern for property {property} on type {type_name}: {message}")]
    InvalidPattern {
        type_name: String,
        property: String,
        message: String,
    },
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Types being built.
    types: HashMap<String, NodeTypeDef>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition.
    pub fn add_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder {
            builder: self,
            def: NodeTypeDef::new(name),
        }
    }

    /// Build the immutable Registry.
    ///
    /// Child types, auto-created children and templates may name types that
    /// were added later, so they are only checked here.
    pub fn build(self) -> Result<Registry, RegistryError> {
        for type_def in self.types.values() {
            for allowed in &type_def.allowed_child_types {
                self.check_known(allowed, &type_def.name)?;
            }
            for child in &type_def.child_nodes {
                self.check_known(&child.type_name, &type_def.name)?;
                for allowed in child.allowed_child_types.iter().flatten() {
                    self.check_known(allowed, &type_def.name)?;
                }
            }
            self.check_template(&type_def.template, &type_def.name)?;
        }

        Ok(Registry::new(self.types))
    }

    fn check_known(&self, type_name: &str, referenced_by: &str) -> Result<(), RegistryError> {
        if self.types.contains_key(type_name) {
            Ok(())
        } else {
            Err(RegistryError::UnknownReferencedType {
                type_name: type_name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_template(
        &self,
        template: &[TemplateNode],
        referenced_by: &str,
    ) -> Result<(), RegistryError> {
        for node in template {
            self.check_known(&node.type_name, referenced_by)?;
            self.check_template(&node.children, referenced_by)?;
        }
        Ok(())
    }
}

/// Builder for a type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    def: NodeTypeDef,
}

impl<'a> TypeBuilder<'a> {
    /// Add a super type by name.
    pub fn extends(mut self, super_type: impl Into<String>) -> Self {
        self.def.super_types.push(super_type.into());
        self
    }

    /// Add a property.
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.def.properties.insert(property.name.clone(), property);
        self
    }

    /// Allow a child type (and its sub types).
    pub fn allow_child(mut self, child_type: impl Into<String>) -> Self {
        self.def.allowed_child_types.push(child_type.into());
        self
    }

    /// Add an auto-created child.
    pub fn child_node(mut self, child: ChildNodeDef) -> Self {
        self.def.child_nodes.push(child);
        self
    }

    /// Add a template node.
    pub fn template(mut self, node: TemplateNode) -> Self {
        self.def.template.push(node);
        self
    }

    /// Mark as abstract.
    pub fn abstract_type(mut self) -> Self {
        self.def.is_abstract = true;
        self
    }

    /// Finish building this type.
    pub fn done(mut self) -> Result<(), RegistryError> {
        // Check for duplicate name
        if self.builder.types.contains_key(&self.def.name) {
            return Err(RegistryError::DuplicateTypeName(self.def.name));
        }

        // Super types must already exist, which also rules out inheritance cycles
        for super_type in &self.def.super_types {
            if !self.builder.types.contains_key(super_type) {
                return Err(RegistryError::UnknownSuperType(super_type.clone()));
            }
        }

        for property in self.def.properties.values_mut() {
            if let Some(pattern) = &property.pattern {
                let compiled =
                    regex_lite::Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern {
                        type_name: self.def.name.clone(),
                        property: property.name.clone(),
                        message: e.to_string(),
                    })?;
                property.matcher = Some(compiled);
            }
        }

        self.builder.types.insert(self.def.name.clone(), self.def);
        Ok(())
    }
}
