//! Canopy Core Types
//!
//! This crate provides the foundational types shared by the content tree and
//! the patch engine:
//! - Identity types (NodeId)
//! - Addressing types (WorkspaceName, Dimensions)
//! - Property maps (the Properties alias and the `props!` macro)
//! - Common error types

mod dimension;
mod error;
mod id;
mod value;

pub use dimension::*;
pub use error::*;
pub use id::*;
pub use value::*;

#[doc(hidden)]
pub use serde_json;
