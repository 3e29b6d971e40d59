//! The Registry - immutable schema lookup.

use crate::{ChildNodeDef, NodeTypeDef, PropertyDef, TemplateNode};
use std::collections::{HashMap, HashSet};

/// Read access to node type schemas.
///
/// Consumers (tree, normalizer, validator) only depend on this trait, so the
/// schema can come from any source that can answer these lookups.
pub trait TypeSchemaProvider: Send + Sync {
    /// Get a type definition by name.
    fn node_type(&self, type_name: &str) -> Option<&NodeTypeDef>;

    /// Get a property definition, including inherited properties.
    fn property(&self, type_name: &str, property: &str) -> Option<&PropertyDef>;

    /// Get all property definitions of a type, including inherited ones.
    fn properties(&self, type_name: &str) -> Vec<&PropertyDef>;

    /// Check whether nodes of `child_type` may be placed below `parent_type`.
    fn allows_child(&self, parent_type: &str, child_type: &str) -> bool;

    /// Get all auto-created children of a type, including inherited ones.
    fn child_nodes(&self, type_name: &str) -> Vec<&ChildNodeDef>;

    /// Check the constraint the grand parent type declares for its
    /// auto-created child `child_name`. `None` if it declares none.
    fn allows_grandchild(
        &self,
        grandparent_type: &str,
        child_name: &str,
        grandchild_type: &str,
    ) -> Option<bool>;

    /// Template of a type (own, or inherited from the nearest super type).
    fn template(&self, type_name: &str) -> &[TemplateNode];

    /// Check whether a type exists.
    fn has_type(&self, type_name: &str) -> bool {
        self.node_type(type_name).is_some()
    }
}

/// The Registry provides runtime lookup of node type definitions.
/// It is immutable after construction.
#[derive(Debug, Default)]
pub struct Registry {
    /// Node type definitions by name.
    types: HashMap<String, NodeTypeDef>,
}

impl Registry {
    /// Create a registry (use RegistryBuilder for construction).
    pub(crate) fn new(types: HashMap<String, NodeTypeDef>) -> Self {
        Self { types }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type(&self, name: &str) -> Option<&NodeTypeDef> {
        self.types.get(name)
    }

    // ==================== Subtype Queries ====================

    /// Check if `sub` is `super_type` or inherits from it.
    pub fn is_subtype(&self, sub: &str, super_type: &str) -> bool {
        if sub == super_type {
            return true;
        }
        let mut seen = HashSet::new();
        self.has_ancestor(sub, super_type, &mut seen)
    }

    fn has_ancestor<'a>(
        &'a self,
        type_name: &str,
        target: &str,
        seen: &mut HashSet<&'a str>,
    ) -> bool {
        let Some(type_def) = self.types.get(type_name) else {
            return false;
        };
        for parent in &type_def.super_types {
            if parent == target {
                return true;
            }
            if seen.insert(parent.as_str()) && self.has_ancestor(parent, target, seen) {
                return true;
            }
        }
        false
    }

    /// Collect the type and all its super types, nearest first.
    fn lineage(&self, type_name: &str) -> Vec<&NodeTypeDef> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = vec![type_name];

        while !queue.is_empty() {
            let current = queue.remove(0);
            if !seen.insert(current) {
                continue;
            }
            if let Some(type_def) = self.types.get(current) {
                result.push(type_def);
                queue.extend(type_def.super_types.iter().map(String::as_str));
            }
        }
        result
    }

    /// All allowed child types of a type, including inherited ones.
    pub fn allowed_child_types(&self, type_name: &str) -> Vec<&str> {
        let mut result = Vec::new();
        for type_def in self.lineage(type_name) {
            for allowed in &type_def.allowed_child_types {
                if !result.contains(&allowed.as_str()) {
                    result.push(allowed.as_str());
                }
            }
        }
        result
    }

    /// Get a child node definition from a type, including inherited ones.
    pub fn get_child_node(&self, type_name: &str, child_name: &str) -> Option<&ChildNodeDef> {
        self.lineage(type_name)
            .into_iter()
            .find_map(|t| t.get_child_node(child_name))
    }

    fn permits(&self, allowed: &[&str], child_type: &str) -> bool {
        allowed.iter().any(|a| self.is_subtype(child_type, a))
    }
}

impl TypeSchemaProvider for Registry {
    fn node_type(&self, type_name: &str) -> Option<&NodeTypeDef> {
        self.types.get(type_name)
    }

    fn property(&self, type_name: &str, property: &str) -> Option<&PropertyDef> {
        self.lineage(type_name)
            .into_iter()
            .find_map(|t| t.get_property(property))
    }

    fn properties(&self, type_name: &str) -> Vec<&PropertyDef> {
        let mut result: Vec<&PropertyDef> = Vec::new();
        let mut seen = HashSet::new();
        // Nearest definition wins
        for type_def in self.lineage(type_name) {
            let mut own: Vec<_> = type_def.properties.values().collect();
            own.sort_by(|a, b| a.name.cmp(&b.name));
            for prop in own {
                if seen.insert(prop.name.as_str()) {
                    result.push(prop);
                }
            }
        }
        result
    }

    fn allows_child(&self, parent_type: &str, child_type: &str) -> bool {
        let allowed = self.allowed_child_types(parent_type);
        self.permits(&allowed, child_type)
    }

    fn child_nodes(&self, type_name: &str) -> Vec<&ChildNodeDef> {
        let mut result: Vec<&ChildNodeDef> = Vec::new();
        let mut lineage = self.lineage(type_name);
        // Inherited children first, so a sub type's own children come last
        lineage.reverse();
        for type_def in lineage {
            for child in &type_def.child_nodes {
                if let Some(pos) = result.iter().position(|c| c.name == child.name) {
                    result[pos] = child;
                } else {
                    result.push(child);
                }
            }
        }
        result
    }

    fn allows_grandchild(
        &self,
        grandparent_type: &str,
        child_name: &str,
        grandchild_type: &str,
    ) -> Option<bool> {
        let child_def = self.get_child_node(grandparent_type, child_name)?;
        let allowed = child_def.allowed_child_types.as_ref()?;
        let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
        Some(self.permits(&allowed, grandchild_type))
    }

    fn template(&self, type_name: &str) -> &[TemplateNode] {
        self.lineage(type_name)
            .into_iter()
            .find(|t| !t.template.is_empty())
            .map(|t| t.template.as_slice())
            .unwrap_or(&[])
    }
}
