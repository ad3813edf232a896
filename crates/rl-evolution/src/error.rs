use crate::diff::DiffError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Another `migrate_to` call is already running against this manager
    /// (spec.md §4.L step 1's coarse in-process lock).
    #[error("a migration is already in progress")]
    AlreadyInProgress,
    /// No configured migration's `from_version` matches the current
    /// version while still making progress toward the target (spec.md
    /// §4.L step 3).
    #[error("no migration path to the requested target version")]
    NoMigrationPath,
    /// A `lightweight_migration` found the target schema unsafe relative to
    /// the source schema (spec.md §4.K).
    #[error("schema evolution validation failed: {0:?}")]
    Validation(Vec<DiffError>),
    #[error("store not registered: {0}")]
    StoreNotFound(String),
    #[error(transparent)]
    Store(#[from] rl_store::Error),
    #[error(transparent)]
    Txn(#[from] rl_txn::Error),
    #[error(transparent)]
    Tuple(#[from] rl_tuple::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
