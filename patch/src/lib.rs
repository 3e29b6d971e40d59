//! Canopy Patch
//!
//! Applies batches of declarative patches (create, update, move, delete) to
//! the content tree with all-or-nothing semantics.
//!
//! Responsibilities:
//! - Parse untyped patch records into typed operations
//! - Normalize loosely typed property values (asset descriptors)
//! - Validate the whole batch against the tree and schema before executing
//! - Execute inside one transaction; commit, or roll back on failure or dry run
//! - Report every created node, including auto-created descendants

mod config;
mod executor;
mod normalizer;
mod parser;
mod patch;
mod request;
mod response;
mod result;
mod validator;


pub use config::{ConfigError, EngineConfig};
pub use executor::PatchExecutor;
pub use normalizer::PropertyNormalizer;
pub use parser::{parse_patch, parse_patches};
pub use patch::{Patch, Position};
pub use request::{PatchRequest, RequestError};
pub use response::PatchResponse;
pub use result::{
    CreatedNodeInfo, PatchError, PatchErrorKind, PatchOutcome, PatchResult, Violation,
    UNKNOWN_OPERATION,
};
pub use validator::{resolve_placement, PatchValidator, Placement};
