//! Transaction error types.

use thiserror::Error;

/// Transaction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// No transaction is active.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// Transaction is already active.
    #[error("transaction already active")]
    AlreadyActive,

    /// The underlying store refused the commit.
    #[error("commit failed: {message}")]
    CommitFailed { message: String },
}

impl TransactionError {
    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::CommitFailed {
            message: message.into(),
        }
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
