//! Online indexer (spec.md §4.H): drives one index from `DISABLED` through
//! `WRITEONLY`/`BUILDING` to `READABLE` by walking every applicable record
//! type's primary-key range in bounded batches and invoking each
//! maintainer's `build_from_scan` path, recording progress in a persistent
//! [`RangeSet`] at keyspace `6` so a build can resume after a crash or a
//! retryable KV error.
//!
//! Depends on `rl-store` for [`rl_store::BuildTarget`], the object-safe view
//! of a [`rl_store::RecordStore`] this crate drives without knowing the
//! concrete record type; depends on `rl-index` only for the vector index's
//! sidecar layout ([`rl_index::flat_scan`]'s entries), which the HNSW batch
//! build reads to construct its graph.

mod hnsw;
mod indexer;
mod options;
mod range_set;

pub use hnsw::{build_hnsw_graph, HnswGraph};
pub use indexer::{BuildOutcome, IndexBuilder};
pub use options::BuildOptions;
pub use range_set::RangeSet;

pub type Result<T> = rl_store::Result<T>;
