//! Buffered unit of work over a single record store (spec.md §4.M).
//!
//! A [`ModelContext`] is the user-facing layer above [`rl_store::RecordStore`]:
//! it queues `insert`/`delete` calls without touching the KV store, then
//! flushes every queued operation inside one atomic transaction on
//! [`ModelContext::save`]. Single-type-per-context (spec.md §4.M) falls out
//! of `ModelContext<T>` being generic over one `Record` type, the same way
//! `rl-store`'s `RecordStore<T>` enforces it.

mod context;
mod error;

pub use context::ModelContext;
pub use error::{Error, Result};
