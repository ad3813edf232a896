use thiserror::Error;

/// Errors surfaced by a [`crate::Transaction`]. This is a small, closed set:
/// the KV store itself is out of scope (spec.md §1) and real backends will
/// have far richer error taxonomies, but every caller in this workspace only
/// ever needs to distinguish "retry me" from "something is actually wrong".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Optimistic concurrency detected a conflicting write since this
    /// transaction's read version. Retryable.
    #[error("transaction conflict")]
    Conflict,
    /// The transaction's configured timeout elapsed. Retryable.
    #[error("transaction timed out")]
    Timeout,
    /// The transaction was already committed or cancelled.
    #[error("transaction already closed")]
    AlreadyClosed,
    #[error("internal KV error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a caller should retry the whole transaction (§5, §7 retry
    /// policy: retryable KV errors are retried with exponential backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict | Error::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
