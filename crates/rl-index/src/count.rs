use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

/// Count index (spec.md §4.G): `index_subspace.pack(group_key)` holds a
/// little-endian `i64` counter maintained via [`TransactionContext::atomic_add`],
/// so concurrent writers to the same group never conflict with each other.
pub struct CountIndexMaintainer;

impl CountIndexMaintainer {
    pub fn new() -> Self {
        Self
    }

    fn group_key<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a [TupleValue] {
        let n = index.options().group_prefix_columns.min(key_values.len());
        &key_values[..n]
    }
}

impl Default for CountIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for CountIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let key = index_subspace.pack(self.group_key(index, key_values));
        ctx.atomic_add(&key, 1)?;
        Ok(None)
    }

    fn apply_update(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        old_key_values: &[TupleValue],
        new_key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let old_group = self.group_key(index, old_key_values);
        let new_group = self.group_key(index, new_key_values);
        if old_group == new_group {
            return Ok(None);
        }
        ctx.atomic_add(&index_subspace.pack(old_group), -1)?;
        ctx.atomic_add(&index_subspace.pack(new_group), 1)?;
        Ok(None)
    }

    fn apply_delete(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<()> {
        let key = index_subspace.pack(self.group_key(index, key_values));
        ctx.atomic_add(&key, -1)?;
        Ok(())
    }

    /// Online build path (spec.md §4.H): the indexer's `RangeSet` guarantees
    /// a given primary key is never scanned twice *by the build itself*, so
    /// re-running an interrupted build is safe. It does not, by itself,
    /// guard against a record that a live `WRITEONLY` writer inserts into a
    /// primary-key range the build has not reached yet: that insert already
    /// ran `apply_insert`'s `+1`, and the build's own scan will reach the
    /// same row later and add another `+1`, double-counting it. See
    /// SPEC_FULL.md's note on this under §4.H for the accepted scope of this
    /// limitation.
    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<()> {
        let key = index_subspace.pack(self.group_key(index, key_values));
        ctx.atomic_add(&key, 1)?;
        Ok(())
    }
}

pub(crate) fn decode_counter(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    i64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_expr::KeyExpression;
    use rl_kv::{Kv, MemoryKv};
    use rl_schema::{IndexDefinition, IndexKind, IndexOptions};

    fn index() -> IndexDefinition {
        IndexDefinition::new("count_by_city", IndexKind::Count, KeyExpression::field("city"), 2)
            .with_options(IndexOptions::grouped(1))
    }

    fn subspace() -> Subspace {
        Subspace::from_prefix(vec![0xbb])
    }

    #[test]
    fn counts_per_group_independently() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = CountIndexMaintainer::new();
        let idx = index();
        let sub = subspace();
        let paris = vec![TupleValue::Str("paris".into())];
        let berlin = vec![TupleValue::Str("berlin".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &paris, &[TupleValue::I64(1)]).unwrap();
        maintainer.apply_insert(&mut ctx, &idx, &sub, &paris, &[TupleValue::I64(2)]).unwrap();
        maintainer.apply_insert(&mut ctx, &idx, &sub, &berlin, &[TupleValue::I64(3)]).unwrap();

        let paris_count = ctx.get(&sub.pack(&paris)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        let berlin_count = ctx.get(&sub.pack(&berlin)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        assert_eq!(paris_count, 2);
        assert_eq!(berlin_count, 1);
    }

    #[test]
    fn update_moves_count_between_groups() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = CountIndexMaintainer::new();
        let idx = index();
        let sub = subspace();
        let paris = vec![TupleValue::Str("paris".into())];
        let berlin = vec![TupleValue::Str("berlin".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &paris, &[TupleValue::I64(1)]).unwrap();
        maintainer.apply_update(&mut ctx, &idx, &sub, &paris, &berlin, &[TupleValue::I64(1)]).unwrap();

        let paris_count = ctx.get(&sub.pack(&paris)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        let berlin_count = ctx.get(&sub.pack(&berlin)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        assert_eq!(paris_count, 0);
        assert_eq!(berlin_count, 1);
    }

    #[test]
    fn delete_decrements_group() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = CountIndexMaintainer::new();
        let idx = index();
        let sub = subspace();
        let paris = vec![TupleValue::Str("paris".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &paris, &[TupleValue::I64(1)]).unwrap();
        maintainer.apply_delete(&mut ctx, &idx, &sub, &paris, &[TupleValue::I64(1)]).unwrap();
        let count = ctx.get(&sub.pack(&paris)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        assert_eq!(count, 0);
    }
}
