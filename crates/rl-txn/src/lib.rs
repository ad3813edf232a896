//! Transaction context (spec.md §4.D): wraps one KV transaction with
//! commit hooks, a typed metadata scratchpad, and RAII-scoped lifecycle.

mod context;
mod error;

pub use context::TransactionContext;
pub use error::{Error, Result};
