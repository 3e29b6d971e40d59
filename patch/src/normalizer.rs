//! Property normalization.
//!
//! Callers may describe an asset either by its identifier or by a richer
//! descriptor object carrying an `identifier` field. The tree only stores the
//! identifier, so descriptors are collapsed before validation and again
//! before writing. Normalization is pure and idempotent.

use canopy_core::Properties;
use canopy_registry::TypeSchemaProvider;
use serde_json::Value;

use crate::config::EngineConfig;

/// Rewrites patch properties into the shape the tree stores.
pub struct PropertyNormalizer<'a> {
    schema: &'a dyn TypeSchemaProvider,
    config: &'a EngineConfig,
}

impl<'a> PropertyNormalizer<'a> {
    pub fn new(schema: &'a dyn TypeSchemaProvider, config: &'a EngineConfig) -> Self {
        Self { schema, config }
    }

    /// Normalize a property map against the declared properties of `type_name`.
    pub fn normalize(&self, properties: &Properties, type_name: &str) -> Properties {
        properties
            .iter()
            .map(|(name, value)| (name.clone(), self.normalize_value(type_name, name, value)))
            .collect()
    }

    fn normalize_value(&self, type_name: &str, name: &str, value: &Value) -> Value {
        let Some(def) = self.schema.property(type_name, name) else {
            return value.clone();
        };

        if self.config.is_asset_type(&def.type_name) {
            return asset_identifier(value).unwrap_or_else(|| value.clone());
        }

        match value {
            Value::Array(items) if self.config.is_asset_array_type(&def.type_name) => Value::Array(
                items
                    .iter()
                    .map(|item| asset_identifier(item).unwrap_or_else(|| item.clone()))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

/// The `identifier` of an asset descriptor object.
fn asset_identifier(value: &Value) -> Option<Value> {
    match value.as_object()?.get("identifier")? {
        Value::String(id) => Some(Value::String(id.clone())),
        _ => None,
    }
}
