//! Request decoding.

use canopy_core::{Dimensions, WorkspaceName};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::EngineConfig;

/// Errors decoding a request body. The whole request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("request body must contain a 'patches' array")]
    MissingPatches,

    #[error("malformed request: {message}")]
    Malformed { message: String },
}

impl RequestError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Status code the HTTP layer answers with.
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// A decoded patch request.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRequest {
    pub workspace: WorkspaceName,
    pub dimensions: Dimensions,
    pub dry_run: bool,
    /// Raw patch records, parsed by the executor.
    pub patches: Vec<Value>,
}

/// One dimension may be given as a single value or a list of values.
#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionValues {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    workspace: Option<String>,
    #[serde(default)]
    dimensions: Option<BTreeMap<String, DimensionValues>>,
    #[serde(default)]
    dry_run: Option<bool>,
    patches: Vec<Value>,
}

impl PatchRequest {
    /// Decode a request body, applying defaults for optional fields.
    pub fn from_value(body: &Value, config: &EngineConfig) -> Result<Self, RequestError> {
        let fields = body.as_object().ok_or(RequestError::NotAnObject)?;
        if !fields.get("patches").is_some_and(Value::is_array) {
            return Err(RequestError::MissingPatches);
        }

        let raw = RawRequest::deserialize(body)
            .map_err(|e| RequestError::malformed(e.to_string()))?;

        let workspace = raw
            .workspace
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| config.default_workspace.clone());
        let dimensions = raw
            .dimensions
            .unwrap_or_default()
            .into_iter()
            .map(|(name, values)| {
                let values = match values {
                    DimensionValues::One(value) => vec![value],
                    DimensionValues::Many(values) => values,
                };
                (name, values)
            })
            .collect();

        Ok(Self {
            workspace: WorkspaceName::new(workspace),
            dimensions,
            dry_run: raw.dry_run.unwrap_or(false),
            patches: raw.patches,
        })
    }
}
