//! Canopy Registry
//!
//! Immutable node type schema: declared properties, allowed child types,
//! auto-created children and templates.
//!
//! - `RegistryBuilder` constructs and validates a `Registry`
//! - `TypeSchemaProvider` is the read-only lookup trait consumed by the tree
//!   and the patch engine

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, RegistryError, TypeBuilder};
pub use registry::{Registry, TypeSchemaProvider};
pub use types::*;
