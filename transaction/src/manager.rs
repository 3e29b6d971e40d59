//! Transaction boundary over a content repository.

use canopy_tree::{ContentRepository, RepositorySnapshot};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{TransactionError, TransactionResult};

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction is active.
    Inactive,
    /// Transaction is active.
    Active,
    /// Transaction is being committed.
    Committing,
    /// Transaction is being rolled back.
    RollingBack,
}

/// A unit of work around tree changes.
///
/// Changes made between `begin` and `rollback` are undone as a whole.
/// Changes made between `begin` and `commit` become visible as a whole.
pub trait TransactionBoundary: Send + Sync {
    /// Begin a new transaction.
    fn begin(&self) -> TransactionResult<()>;

    /// Commit the current transaction.
    fn commit(&self) -> TransactionResult<()>;

    /// Roll back the current transaction.
    fn rollback(&self) -> TransactionResult<()>;

    /// Current state.
    fn state(&self) -> TransactionState;

    /// Check if a transaction is active.
    fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }
}

struct Inner {
    state: TransactionState,
    snapshot: Option<RepositorySnapshot>,
}

/// Transaction boundary that applies changes directly to the repository and
/// restores a snapshot taken at `begin` on rollback.
///
/// This is a single-writer model: one transaction at a time per repository.
pub struct SnapshotTransaction {
    repository: ContentRepository,
    inner: Mutex<Inner>,
}

impl SnapshotTransaction {
    /// Create a boundary over a repository.
    pub fn new(repository: ContentRepository) -> Self {
        Self {
            repository,
            inner: Mutex::new(Inner {
                state: TransactionState::Inactive,
                snapshot: None,
            }),
        }
    }
}

impl std::fmt::Debug for SnapshotTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotTransaction")
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

impl TransactionBoundary for SnapshotTransaction {
    fn begin(&self) -> TransactionResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == TransactionState::Active {
            return Err(TransactionError::AlreadyActive);
        }

        inner.snapshot = Some(self.repository.snapshot());
        inner.state = TransactionState::Active;
        debug!("transaction started");

        Ok(())
    }

    fn commit(&self) -> TransactionResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != TransactionState::Active {
            return Err(TransactionError::NoActiveTransaction);
        }

        // Changes are already applied, drop the undo snapshot
        inner.state = TransactionState::Committing;
        inner.snapshot = None;
        inner.state = TransactionState::Inactive;
        debug!("transaction committed");

        Ok(())
    }

    fn rollback(&self) -> TransactionResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != TransactionState::Active {
            return Err(TransactionError::NoActiveTransaction);
        }

        inner.state = TransactionState::RollingBack;
        if let Some(snapshot) = inner.snapshot.take() {
            self.repository.restore(snapshot);
        }
        inner.state = TransactionState::Inactive;
        debug!("transaction rolled back");

        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.inner.lock().state
    }
}
