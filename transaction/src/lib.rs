//! Canopy Transaction
//!
//! Unit-of-work boundary around content tree changes.
//!
//! Responsibilities:
//! - Implement BEGIN/COMMIT/ROLLBACK over a content repository
//! - Undo every change made since BEGIN on ROLLBACK

mod error;
mod manager;

pub use error::{TransactionError, TransactionResult};
pub use manager::{SnapshotTransaction, TransactionBoundary, TransactionState};
