use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Any operation attempted after [`crate::TransactionContext::commit`]
    /// or [`crate::TransactionContext::cancel`] has already consumed the
    /// context.
    #[error("transaction context already closed")]
    AlreadyClosed,
    #[error(transparent)]
    Kv(#[from] rl_kv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
