//! Index maintainers (spec.md §4.G): concrete [`rl_store::IndexMaintainer`]
//! implementations for every [`rl_schema::IndexKind`], plus the query-side
//! helpers ([`spatial::covering_range`], [`vector::flat_scan`]) each kind
//! needs beyond plain insert/update/delete.
//!
//! Depends on `rl-store` (not the other way around) so `rl-store` can
//! dispatch through the `IndexMaintainer` trait without knowing about any
//! concrete index kind.

mod count;
mod error;
mod minmax;
mod rank;
mod spatial;
mod sum;
mod value;
mod vector;

pub use count::CountIndexMaintainer;
pub use minmax::MinMaxIndexMaintainer;
pub use rank::RankIndexMaintainer;
pub use spatial::{covering_range, morton_code, SpatialIndexMaintainer};
pub use sum::SumIndexMaintainer;
pub use value::ValueIndexMaintainer;
pub use vector::{flat_scan, VectorIndexMaintainer};

use rl_schema::IndexKind;
use rl_store::MaintainerRegistry;
use std::sync::Arc;

/// A [`MaintainerRegistry`] with the default maintainer registered for every
/// index kind. [`IndexKind::Min`] and [`IndexKind::Max`] share
/// [`MinMaxIndexMaintainer`], configured via [`MinMaxIndexMaintainer::min`]/
/// [`MinMaxIndexMaintainer::max`].
pub fn default_registry() -> MaintainerRegistry {
    MaintainerRegistry::new()
        .register(IndexKind::Value, Arc::new(ValueIndexMaintainer::new()))
        .register(IndexKind::Count, Arc::new(CountIndexMaintainer::new()))
        .register(IndexKind::Sum, Arc::new(SumIndexMaintainer::new()))
        .register(IndexKind::Min, Arc::new(MinMaxIndexMaintainer::min()))
        .register(IndexKind::Max, Arc::new(MinMaxIndexMaintainer::max()))
        .register(IndexKind::Rank, Arc::new(RankIndexMaintainer::new()))
        .register(IndexKind::Spatial, Arc::new(SpatialIndexMaintainer::new()))
        .register(IndexKind::Vector, Arc::new(VectorIndexMaintainer::new()))
}
