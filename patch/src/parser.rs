//! Patch parser.
//!
//! Decodes untyped patch records into typed [`Patch`] values. The first
//! malformed record aborts the batch.

use canopy_core::{NodeId, Properties};
use serde_json::{Map, Value};

use crate::patch::{Patch, Position};
use crate::result::{PatchError, UNKNOWN_OPERATION};

/// Parse an ordered batch of patch records.
pub fn parse_patches(records: &[Value]) -> Result<Vec<Patch>, PatchError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_patch(index, record))
        .collect()
}

/// Parse one patch record.
pub fn parse_patch(index: usize, record: &Value) -> Result<Patch, PatchError> {
    let Some(fields) = record.as_object() else {
        return Err(PatchError::parse(
            index,
            UNKNOWN_OPERATION,
            None,
            "patch must be an object",
        ));
    };
    let reader = FieldReader { index, fields };

    let operation = match fields.get("operation") {
        Some(Value::String(op)) => op.as_str(),
        Some(_) => {
            return Err(reader.error(UNKNOWN_OPERATION, "field 'operation' must be a string"));
        }
        None => {
            return Err(reader.error(UNKNOWN_OPERATION, "missing required field 'operation'"));
        }
    };

    match operation {
        "createNode" => Ok(Patch::CreateNode {
            reference_node_id: reader.node_id(operation, "parentNodeId")?,
            position: reader.position(operation)?,
            type_name: reader.required_str(operation, "nodeType")?.to_string(),
            node_name: reader.optional_str(operation, "nodeName")?.map(str::to_string),
            properties: reader.properties(operation, false)?,
        }),
        "updateNode" => Ok(Patch::UpdateNode {
            node_id: reader.node_id(operation, "nodeId")?,
            properties: reader.properties(operation, true)?,
        }),
        "moveNode" => Ok(Patch::MoveNode {
            node_id: reader.node_id(operation, "nodeId")?,
            target_node_id: reader.node_id(operation, "targetNodeId")?,
            position: reader.position(operation)?,
        }),
        "deleteNode" => Ok(Patch::DeleteNode {
            node_id: reader.node_id(operation, "nodeId")?,
        }),
        other => Err(reader.error(other, format!("unknown operation '{}'", other))),
    }
}

/// Typed access to the fields of one record.
struct FieldReader<'a> {
    index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    /// The node id the record names first, for error context.
    fn subject(&self) -> Option<NodeId> {
        ["nodeId", "parentNodeId"]
            .iter()
            .find_map(|key| self.fields.get(*key)?.as_str())
            .map(NodeId::from)
    }

    fn error(&self, operation: &str, message: impl Into<String>) -> PatchError {
        PatchError::parse(self.index, operation, self.subject(), message)
    }

    fn optional_str(&self, operation: &str, key: &str) -> Result<Option<&'a str>, PatchError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.error(operation, format!("field '{}' must be a string", key))),
        }
    }

    fn required_str(&self, operation: &str, key: &str) -> Result<&'a str, PatchError> {
        match self.optional_str(operation, key)? {
            Some(s) if !s.is_empty() => Ok(s),
            Some(_) => Err(self.error(operation, format!("field '{}' must not be empty", key))),
            None => Err(self.error(operation, format!("missing required field '{}'", key))),
        }
    }

    fn node_id(&self, operation: &str, key: &str) -> Result<NodeId, PatchError> {
        self.required_str(operation, key).map(NodeId::from)
    }

    fn position(&self, operation: &str) -> Result<Position, PatchError> {
        match self.optional_str(operation, "position")? {
            None => Ok(Position::default()),
            Some(s) => Position::parse(s).ok_or_else(|| {
                self.error(
                    operation,
                    format!("invalid position '{}', expected into, before or after", s),
                )
            }),
        }
    }

    fn properties(&self, operation: &str, required: bool) -> Result<Properties, PatchError> {
        match self.fields.get("properties") {
            Some(Value::Object(map)) => Ok(map.clone()),
            None | Some(Value::Null) if !required => Ok(Properties::new()),
            None => Err(self.error(operation, "missing required field 'properties'")),
            Some(_) => Err(self.error(operation, "field 'properties' must be an object")),
        }
    }
}
