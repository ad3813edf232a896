use crate::error::Result;
use crossbeam_skiplist::SkipMap;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;
use std::sync::Arc;

/// Rank index (spec.md §4.G): an ordered stream of `(group, value,
/// primary_key)` entries, each durably written to `index_subspace`, mirrored
/// into an in-process [`SkipMap`] so `rank_of`/`value_at_rank` don't have to
/// round-trip the KV store. The mirror is only ever updated from a
/// [`TransactionContext::add_post_commit_hook`], so a cancelled or rolled-back
/// transaction never desyncs it from the durable entries.
///
/// `rank_of`/`value_at_rank` walk the skiplist's ordered iterator rather than
/// indexing into it directly: `crossbeam_skiplist::SkipMap` has no built-in
/// order-statistics support, so both are O(n) in this reference
/// implementation, not the O(log n) spec.md calls for. A production rank
/// index would pair the skiplist with a Fenwick tree or an indexed
/// skip-list variant over the same keys.
pub struct RankIndexMaintainer {
    mirror: Arc<SkipMap<Vec<u8>, ()>>,
}

impl RankIndexMaintainer {
    pub fn new() -> Self {
        Self { mirror: Arc::new(SkipMap::new()) }
    }

    fn group_key<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a [TupleValue] {
        let n = index.options().group_prefix_columns.min(key_values.len());
        &key_values[..n]
    }

    fn value<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a TupleValue {
        let n = index.options().group_prefix_columns;
        key_values.get(n).unwrap_or(&TupleValue::Null)
    }

    fn entry_tuple(&self, group: &[TupleValue], value: &TupleValue, primary_key: &[TupleValue]) -> Vec<TupleValue> {
        let mut tuple = group.to_vec();
        tuple.push(value.clone());
        tuple.extend_from_slice(primary_key);
        tuple
    }

    /// Rebuilds the in-process mirror from durable entries, for use after
    /// process start (the mirror itself is never persisted).
    pub fn rehydrate(&self, ctx: &mut TransactionContext, index_subspace: &Subspace) -> Result<()> {
        let (begin, end) = index_subspace.range();
        for (key, _) in ctx.range(&begin, &end, false)? {
            self.mirror.insert(key, ());
        }
        Ok(())
    }

    /// Count of entries within `group` strictly ordered before `value` (ties
    /// broken by primary key, lowest first). O(n) in the group's size.
    pub fn rank_of(&self, index_subspace: &Subspace, group: &[TupleValue], value: &TupleValue) -> usize {
        let group_prefix = Subspace::from_prefix(index_subspace.pack(group));
        let boundary_tuple = {
            let mut t = group.to_vec();
            t.push(value.clone());
            t
        };
        let boundary = index_subspace.pack(&boundary_tuple);
        let (begin, _) = group_prefix.range();
        self.mirror.range(begin..boundary).count()
    }

    /// The primary key at `rank` within `group` (0-indexed ascending), if
    /// the group has that many entries.
    pub fn value_at_rank(&self, index_subspace: &Subspace, group: &[TupleValue], rank: usize) -> Option<Vec<TupleValue>> {
        let group_prefix = Subspace::from_prefix(index_subspace.pack(group));
        let (begin, end) = group_prefix.range();
        let entry = self.mirror.range(begin..end).nth(rank)?;
        index_subspace.unpack(entry.key()).ok()
    }
}

impl Default for RankIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for RankIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let group = self.group_key(index, key_values).to_vec();
        let value = self.value(index, key_values).clone();
        let entry = self.entry_tuple(&group, &value, primary_key);
        let key = index_subspace.pack(&entry);
        ctx.set(&key, &[])?;
        let mirror = self.mirror.clone();
        ctx.add_post_commit_hook(move || {
            mirror.insert(key, ());
        });
        Ok(None)
    }

    fn apply_update(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        old_key_values: &[TupleValue],
        new_key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let old_group = self.group_key(index, old_key_values).to_vec();
        let new_group = self.group_key(index, new_key_values).to_vec();
        let old_value = self.value(index, old_key_values).clone();
        let new_value = self.value(index, new_key_values).clone();
        if old_group == new_group && old_value == new_value {
            return Ok(None);
        }
        self.apply_delete(ctx, index, index_subspace, old_key_values, primary_key)?;
        self.apply_insert(ctx, index, index_subspace, new_key_values, primary_key)?;
        Ok(None)
    }

    fn apply_delete(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let group = self.group_key(index, key_values).to_vec();
        let value = self.value(index, key_values).clone();
        let entry = self.entry_tuple(&group, &value, primary_key);
        let key = index_subspace.pack(&entry);
        ctx.clear(&key)?;
        let mirror = self.mirror.clone();
        ctx.add_post_commit_hook(move || {
            mirror.remove(&key);
        });
        Ok(())
    }

    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        self.apply_insert(ctx, index, index_subspace, key_values, primary_key).map(|_| ())
    }
}
