use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;
use std::collections::HashMap;
use std::sync::Arc;

/// The capability set a concrete index maintainer implements (spec.md
/// §4.G): `apply_insert`, `apply_update`, `apply_delete`, `build_from_scan`.
/// Defined here (in `rl-store`) rather than in `rl-index` so the record
/// store can dispatch into maintainers without depending on their concrete
/// implementations -- `rl-index` depends on `rl-store` to implement this
/// trait, not the other way around.
///
/// Every method receives `index_subspace`, the maintainer's own subspace
/// (`record_store_subspace.child([IndexEntry.tag(), subspace_key])`), so a
/// maintainer never has to know about [`crate::row_kind::RowKind`] itself.
/// `key_values` is the root expression evaluated against the record;
/// `primary_key` is the record's own primary key tuple.
///
/// `apply_insert`/`apply_update` return the primary key of a record *evicted*
/// from the index, if any -- today only the unique value index's
/// `ReplaceOnDuplicate` option produces one. A maintainer only owns its own
/// index subspace, not the record row itself, so eviction is a request: the
/// caller (`RecordStore`) deletes the evicted record in full, cascading
/// through every index it participates in, not just this one.
pub trait IndexMaintainer: Send + Sync {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>>;

    fn apply_update(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        old_key_values: &[TupleValue],
        new_key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>>;

    fn apply_delete(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()>;

    /// Idempotent build-path write used by the online indexer (spec.md
    /// §4.H): must produce the same key/value as `apply_insert` would for
    /// the same input, so replaying an already-built range is a no-op.
    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()>;
}

/// Maps an [`rl_schema::IndexKind`] to the maintainer implementation that
/// handles it. Populated by the caller (typically with the maintainers
/// `rl-index` provides) and shared across every [`crate::RecordStore`] that
/// needs it.
#[derive(Clone, Default)]
pub struct MaintainerRegistry {
    by_kind: HashMap<rl_schema::IndexKind, Arc<dyn IndexMaintainer>>,
}

impl MaintainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: rl_schema::IndexKind, maintainer: Arc<dyn IndexMaintainer>) -> Self {
        self.by_kind.insert(kind, maintainer);
        self
    }

    pub fn get(&self, kind: rl_schema::IndexKind) -> Option<&Arc<dyn IndexMaintainer>> {
        self.by_kind.get(&kind)
    }
}
