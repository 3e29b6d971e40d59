//! Schema definition types.

use canopy_core::Properties;
use regex_lite::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Declared type names that denote a reference to an external media asset.
pub const DEFAULT_ASSET_TYPES: &[&str] = &[
    "Asset",
    "Image",
    "ImageInterface",
    "Document",
    "Video",
    "Audio",
];

/// Property definition within a node type.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// Declared value type (`string`, `integer`, `Image`, `array<Asset>`, ...).
    pub type_name: String,
    /// Default value applied when a node is created without the property.
    pub default: Option<Value>,
    /// Regex that string values must match.
    pub pattern: Option<String>,
    /// `pattern`, compiled when the owning type is registered.
    pub(crate) matcher: Option<Regex>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default: None,
            pattern: None,
            matcher: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.matcher = None;
        self
    }

    /// Compiled pattern, present once the type is part of a registry.
    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }
}

/// Returns `T` for a declared type of the form `array<T>`.
pub fn array_element_type(type_name: &str) -> Option<&str> {
    type_name
        .strip_prefix("array<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
}

/// An auto-created (tethered) child declared by a node type.
#[derive(Debug, Clone)]
pub struct ChildNodeDef {
    /// Fixed node name of the child.
    pub name: String,
    /// Node type of the child.
    pub type_name: String,
    /// Child types allowed below this child; overrides the child type's own list.
    pub allowed_child_types: Option<Vec<String>>,
}

impl ChildNodeDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            allowed_child_types: None,
        }
    }

    pub fn allowing(mut self, child_types: &[&str]) -> Self {
        self.allowed_child_types = Some(child_types.iter().map(|t| t.to_string()).collect());
        self
    }
}

/// A node created from a type's template when an instance is created.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    /// Node name; generated when absent.
    pub name: Option<String>,
    /// Node type.
    pub type_name: String,
    /// Initial properties.
    pub properties: Properties,
    /// Nested template children.
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            name: None,
            type_name: type_name.into(),
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_child(mut self, child: TemplateNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Node type definition.
#[derive(Debug, Clone)]
pub struct NodeTypeDef {
    /// Fully qualified type name (`Vendor.Package:Content.Text`).
    pub name: String,
    /// Super types this type inherits properties and constraints from.
    pub super_types: Vec<String>,
    /// Property definitions.
    pub properties: HashMap<String, PropertyDef>,
    /// Types allowed as direct children (sub types included).
    pub allowed_child_types: Vec<String>,
    /// Auto-created children, in creation order.
    pub child_nodes: Vec<ChildNodeDef>,
    /// Template children created after the auto-created ones.
    pub template: Vec<TemplateNode>,
    /// Whether this type is abstract (cannot be instantiated directly).
    pub is_abstract: bool,
}

impl NodeTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_types: Vec::new(),
            properties: HashMap::new(),
            allowed_child_types: Vec::new(),
            child_nodes: Vec::new(),
            template: Vec::new(),
            is_abstract: false,
        }
    }

    /// Get a property definition declared directly on this type.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    /// Get a child node definition declared directly on this type.
    pub fn get_child_node(&self, name: &str) -> Option<&ChildNodeDef> {
        self.child_nodes.iter().find(|c| c.name == name)
    }

    /// The type name without its namespace, e.g. `Text` for `Acme.Site:Content.Text`.
    pub fn local_name(&self) -> &str {
        local_type_name(&self.name)
    }
}

/// Strips the namespace (before `:`) and any dotted prefix from a type name.
pub fn local_type_name(type_name: &str) -> &str {
    let without_namespace = type_name.rsplit(':').next().unwrap_or(type_name);
    without_namespace
        .rsplit('.')
        .next()
        .unwrap_or(without_namespace)
}
