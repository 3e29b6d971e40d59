//! Engine configuration.

use canopy_core::LIVE_WORKSPACE;
use canopy_registry::{array_element_type, DEFAULT_ASSET_TYPES};
use serde::Deserialize;
use thiserror::Error;

/// Errors loading an engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings of the patch engine.
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```toml
/// default_workspace = "live"
/// asset_types = ["Image", "Document"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workspace used when a request names none.
    pub default_workspace: String,
    /// Properties starting with this prefix are internal.
    pub reserved_property_prefix: String,
    /// Internal properties callers may still set (boolean flags).
    pub editable_internal_properties: Vec<String>,
    /// Declared property types holding an asset identifier.
    pub asset_types: Vec<String>,
    /// Depth cap when collecting created descendants.
    pub max_created_depth: usize,
    /// Length of the random suffix of generated node names.
    pub name_suffix_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_workspace: LIVE_WORKSPACE.to_string(),
            reserved_property_prefix: "_".to_string(),
            editable_internal_properties: vec!["_hidden".to_string()],
            asset_types: DEFAULT_ASSET_TYPES.iter().map(|t| t.to_string()).collect(),
            max_created_depth: 32,
            name_suffix_length: 4,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from TOML, filling in defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn is_asset_type(&self, type_name: &str) -> bool {
        self.asset_types.iter().any(|t| t == type_name)
    }

    /// `array<T>` where T is an asset type.
    pub fn is_asset_array_type(&self, type_name: &str) -> bool {
        array_element_type(type_name).is_some_and(|element| self.is_asset_type(element))
    }

    pub fn is_internal_property(&self, name: &str) -> bool {
        !self.reserved_property_prefix.is_empty()
            && name.starts_with(&self.reserved_property_prefix)
    }

    pub fn is_editable_internal_property(&self, name: &str) -> bool {
        self.editable_internal_properties.iter().any(|p| p == name)
    }

    /// Whether a property appears in created-node reports.
    pub fn is_reported_property(&self, name: &str) -> bool {
        !self.is_internal_property(name) || self.is_editable_internal_property(name)
    }
}
