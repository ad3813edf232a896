//! A FoundationDB Record Layer style record store atop an ordered
//! transactional key-value store (spec.md §1-§2): tuple encoding, a
//! versioned schema registry, key expressions, a typed record store with
//! secondary indexes, an online indexer, a cost-based query planner, and
//! schema evolution / migration tooling, wired together behind one typed
//! `Options` struct and one error vocabulary (spec.md §6).
//!
//! This crate is a thin facade: every concept below is implemented in its
//! own crate (`rl-type`, `rl-tuple`, `rl-kv`, `rl-expr`, `rl-schema`,
//! `rl-txn`, `rl-store`, `rl-index`, `rl-indexer`, `rl-planner`,
//! `rl-evolution`, `rl-model`) and re-exported here so a caller depends on
//! one crate instead of twelve.

mod error;
mod options;

pub use error::{Error, Result};
pub use options::{BatchOptions, Options, RetryOptions};

// Tuple encoding and key-range subspaces (spec.md §4.A).
pub use rl_tuple::{decode, encode, strinc, Subspace};

// Tagged, totally ordered scalar values (spec.md §4.A).
pub use rl_type::{TupleValue, ValueType};

// The key-value transaction abstraction this crate is built on (spec.md §1,
// out of scope to implement) plus the in-memory reference implementation
// every crate in this workspace tests against.
pub use rl_kv::{Kv, MemoryKv, Transaction};

// Key expressions (spec.md §4.C).
pub use rl_expr::{FieldAccessor, KeyExpression, MapAccessor, RangeBound, Visitor};

// Schema registry (spec.md §4.B).
pub use rl_schema::{
    FieldDescriptor, FormerIndex, IndexDefinition, IndexKind, IndexOptions, Record, RecordType, Schema,
    SchemaBuilder, VectorStrategy,
};

// Transaction context (spec.md §4.D).
pub use rl_txn::TransactionContext;

// Record store, index-state manager, and the maintainer/build-target traits
// the rest of the workspace drives a store through (spec.md §4.E-§4.G).
pub use rl_store::{
    BuildTarget, IndexMaintainer, IndexState, IndexStateManager, MaintainerRegistry, QueryBuilder, RecordStore,
    RowKind, ScanIterator,
};

// Concrete index maintainers (spec.md §4.G).
pub use rl_index::{
    covering_range, default_registry, flat_scan, morton_code, CountIndexMaintainer, MinMaxIndexMaintainer,
    RankIndexMaintainer, SpatialIndexMaintainer, SumIndexMaintainer, ValueIndexMaintainer, VectorIndexMaintainer,
};

// Online indexer (spec.md §4.H).
pub use rl_indexer::{build_hnsw_graph, BuildOptions, BuildOutcome, HnswGraph, IndexBuilder, RangeSet};

// Query planner, cost estimator, and statistics manager (spec.md §4.I-§4.J).
pub use rl_planner::{
    candidate_plans, choose_plan, compute_cache_key, estimate_cost, estimate_dnf_terms, filter_selectivity, rewrite,
    to_dnf, Bucket, CacheKey, Comparison, Cost, CostWeights, Filter, Histogram, Plan, PlanCache, Query,
    RecordTypeStatistics, SortKey, StatisticsManager, StatisticsPolicy,
};

// Schema evolution validator and migration manager (spec.md §4.K-§4.L).
pub use rl_evolution::{
    add_index_migration, diff, lightweight_migration, remove_index_migration, DiffError, Migration, MigrationContext,
    MigrationManager, StoreRegistry, Version,
};

// Model context: the buffered unit of work (spec.md §4.M).
pub use rl_model::ModelContext;
