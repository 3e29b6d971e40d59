//! Patch validator.
//!
//! Checks a patch against the current tree and type schema without mutating
//! anything. Every patch of a batch is validated before the first executes.

use canopy_core::{value_type_name, NodeId, Properties};
use canopy_registry::TypeSchemaProvider;
use canopy_tree::{is_valid_node_name, NodeView, TreeAccessor, TreeContext};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::normalizer::PropertyNormalizer;
use crate::patch::{Patch, Position};
use crate::result::{PatchError, Violation};

/// Where a positioned node ends up.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The node's parent.
    pub parent: NodeView,
    /// The sibling the node is inserted before; last when `None`.
    pub succeeding_sibling: Option<NodeId>,
}

/// Derive the parent and sibling slot for `position` relative to `reference`.
///
/// `moving` is skipped when looking for the sibling following the reference,
/// so a node moved after its own predecessor stays where it is.
pub fn resolve_placement(
    tree: &dyn TreeAccessor,
    ctx: &TreeContext,
    reference: &NodeView,
    position: Position,
    moving: Option<&NodeId>,
) -> Result<Placement, Violation> {
    if position == Position::Into {
        return Ok(Placement {
            parent: reference.clone(),
            succeeding_sibling: None,
        });
    }

    let parent = tree
        .parent_of(ctx, &reference.id)
        .ok_or_else(|| Violation::NoParent(reference.id.clone()))?;

    let succeeding_sibling = match position {
        Position::Before => Some(reference.id.clone()),
        _ => tree
            .children(ctx, &parent.id)
            .into_iter()
            .map(|child| child.id)
            .skip_while(|id| id != &reference.id)
            .skip(1)
            .find(|id| Some(id) != moving),
    };

    Ok(Placement {
        parent,
        succeeding_sibling,
    })
}

/// Validates patches against a tree context.
pub struct PatchValidator<'a> {
    tree: &'a dyn TreeAccessor,
    schema: &'a dyn TypeSchemaProvider,
    config: &'a EngineConfig,
    normalizer: PropertyNormalizer<'a>,
}

impl<'a> PatchValidator<'a> {
    pub fn new(
        tree: &'a dyn TreeAccessor,
        schema: &'a dyn TypeSchemaProvider,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            tree,
            schema,
            config,
            normalizer: PropertyNormalizer::new(schema, config),
        }
    }

    /// Validate one patch of a batch.
    pub fn validate(
        &self,
        patch: &Patch,
        index: usize,
        ctx: &TreeContext,
    ) -> Result<(), PatchError> {
        let operation = patch.operation_name();
        let fail = |node: &NodeId, violation: Violation| {
            PatchError::validation(index, operation, node, violation)
        };

        match patch {
            Patch::CreateNode {
                reference_node_id,
                position,
                type_name,
                node_name,
                properties,
            } => {
                let reference = self
                    .find(ctx, reference_node_id)
                    .map_err(|v| fail(reference_node_id, v))?;
                self.validate_create(
                    ctx,
                    &reference,
                    *position,
                    type_name,
                    node_name.as_deref(),
                    properties,
                )
                .map_err(|v| fail(reference_node_id, v))
            }

            Patch::UpdateNode {
                node_id,
                properties,
            } => {
                let node = self.find(ctx, node_id).map_err(|v| fail(node_id, v))?;
                let normalized = self.normalizer.normalize(properties, &node.type_name);
                self.validate_properties(ctx, &normalized, &node.type_name)
                    .map_err(|v| fail(node_id, v))
            }

            Patch::MoveNode {
                node_id,
                target_node_id,
                position,
            } => {
                let node = self.find(ctx, node_id).map_err(|v| fail(node_id, v))?;
                let target = self
                    .find(ctx, target_node_id)
                    .map_err(|v| fail(target_node_id, v))?;
                self.validate_move(ctx, &node, &target, *position)
                    .map_err(|v| fail(node_id, v))
            }

            Patch::DeleteNode { node_id } => {
                let node = self.find(ctx, node_id).map_err(|v| fail(node_id, v))?;
                check_detachable(&node).map_err(|v| fail(node_id, v))
            }
        }
    }

    fn find(&self, ctx: &TreeContext, id: &NodeId) -> Result<NodeView, Violation> {
        self.tree
            .find_node(ctx, id)
            .ok_or_else(|| Violation::NodeNotFound(id.clone()))
    }

    fn validate_create(
        &self,
        ctx: &TreeContext,
        reference: &NodeView,
        position: Position,
        type_name: &str,
        node_name: Option<&str>,
        properties: &Properties,
    ) -> Result<(), Violation> {
        let node_type = self
            .schema
            .node_type(type_name)
            .ok_or_else(|| Violation::TypeNotFound(type_name.to_string()))?;
        if node_type.is_abstract {
            return Err(Violation::AbstractType(type_name.to_string()));
        }

        let placement = resolve_placement(self.tree, ctx, reference, position, None)?;
        if !self.tree.type_permits_child(ctx, &placement.parent, type_name) {
            return Err(Violation::child_not_allowed(
                &placement.parent.type_name,
                type_name,
            ));
        }

        if let Some(name) = node_name {
            if !is_valid_node_name(name) {
                return Err(Violation::InvalidNodeName(name.to_string()));
            }
            if self.tree.has_child_named(ctx, &placement.parent.id, name) {
                return Err(Violation::DuplicateNodeName {
                    parent: placement.parent.id.clone(),
                    name: name.to_string(),
                });
            }
        }

        let normalized = self.normalizer.normalize(properties, type_name);
        self.validate_properties(ctx, &normalized, type_name)
    }

    fn validate_move(
        &self,
        ctx: &TreeContext,
        node: &NodeView,
        target: &NodeView,
        position: Position,
    ) -> Result<(), Violation> {
        if node.id == target.id {
            return Err(Violation::SelfReference(node.id.clone()));
        }
        check_detachable(node)?;

        let placement = resolve_placement(self.tree, ctx, target, position, Some(&node.id))?;
        if self
            .tree
            .is_descendant_or_self(ctx, &placement.parent.id, &node.id)
        {
            return Err(Violation::MoveIntoOwnSubtree {
                node: node.id.clone(),
            });
        }
        if !self
            .tree
            .type_permits_child(ctx, &placement.parent, &node.type_name)
        {
            return Err(Violation::child_not_allowed(
                &placement.parent.type_name,
                &node.type_name,
            ));
        }

        // The node keeps its name, which must stay unique below the new parent
        let same_parent = node.parent_id.as_ref() == Some(&placement.parent.id);
        if !same_parent && self.tree.has_child_named(ctx, &placement.parent.id, &node.name) {
            return Err(Violation::DuplicateNodeName {
                parent: placement.parent.id.clone(),
                name: node.name.clone(),
            });
        }

        Ok(())
    }

    /// Validate normalized properties against the declared properties of a type.
    ///
    /// Reports the first offending property.
    pub fn validate_properties(
        &self,
        ctx: &TreeContext,
        properties: &Properties,
        type_name: &str,
    ) -> Result<(), Violation> {
        for (name, value) in properties {
            if self.config.is_internal_property(name) {
                if !self.config.is_editable_internal_property(name) {
                    return Err(Violation::InternalProperty(name.clone()));
                }
                if !(value.is_null() || value.is_boolean()) {
                    return Err(Violation::invalid_property_type(
                        name,
                        "boolean",
                        value_type_name(value),
                    ));
                }
                continue;
            }

            let def = self
                .schema
                .property(type_name, name)
                .ok_or_else(|| Violation::undeclared_property(type_name, name))?;

            // null clears a property
            if value.is_null() {
                continue;
            }

            self.check_value_type(ctx, name, &def.type_name, value)?;

            if let (Some(matcher), Some(s)) = (def.matcher(), value.as_str()) {
                if !matcher.is_match(s) {
                    return Err(Violation::pattern_mismatch(name, matcher.as_str()));
                }
            }
        }
        Ok(())
    }

    fn check_value_type(
        &self,
        ctx: &TreeContext,
        name: &str,
        declared: &str,
        value: &Value,
    ) -> Result<(), Violation> {
        let mismatch = || Violation::invalid_property_type(name, declared, value_type_name(value));

        let ok = match declared {
            "string" | "DateTime" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "float" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "reference" => {
                let target = value.as_str().ok_or_else(mismatch)?;
                self.check_reference(ctx, name, target)?;
                true
            }
            "references" => {
                let targets = value.as_array().ok_or_else(mismatch)?;
                for target in targets {
                    let target = target.as_str().ok_or_else(mismatch)?;
                    self.check_reference(ctx, name, target)?;
                }
                true
            }
            asset if self.config.is_asset_type(asset) => value.is_string(),
            array if self.config.is_asset_array_type(array) => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            other if other.starts_with("array<") => value.is_array(),
            // Declared object types are opaque to the engine
            _ => true,
        };

        if ok {
            Ok(())
        } else {
            Err(mismatch())
        }
    }

    fn check_reference(
        &self,
        ctx: &TreeContext,
        name: &str,
        target: &str,
    ) -> Result<(), Violation> {
        if self.tree.find_node(ctx, &NodeId::from(target)).is_some() {
            Ok(())
        } else {
            Err(Violation::reference_not_found(name, target))
        }
    }
}

/// The root and auto-created children stay where the schema put them.
fn check_detachable(node: &NodeView) -> Result<(), Violation> {
    if node.is_root() {
        return Err(Violation::RootNode(node.id.clone()));
    }
    if node.tethered {
        return Err(Violation::TetheredNode(node.id.clone()));
    }
    Ok(())
}
