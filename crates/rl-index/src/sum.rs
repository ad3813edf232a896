use crate::count::decode_counter;
use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

/// Sum index (spec.md §4.G): groups the same way a count index does, but
/// atomically adds a numeric trailing column instead of a constant `1`.
/// `atomic_add` is blind addition with no overflow check of its own, so this
/// maintainer reads the current total first -- that read is a genuine
/// conflict-detectable operation (unlike `atomic_add` itself), so a
/// concurrent writer racing this overflow check is caught at commit time,
/// not silently lost.
pub struct SumIndexMaintainer;

impl SumIndexMaintainer {
    pub fn new() -> Self {
        Self
    }

    fn group_key<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a [TupleValue] {
        let n = index.options().group_prefix_columns.min(key_values.len());
        &key_values[..n]
    }

    fn summand(&self, index: &IndexDefinition, key_values: &[TupleValue]) -> Result<i64> {
        let n = index.options().group_prefix_columns;
        match key_values.get(n) {
            Some(TupleValue::I64(v)) => Ok(*v),
            Some(TupleValue::F64(v)) => Ok(*v as i64),
            Some(other) => Err(rl_store::Error::Maintainer(format!(
                "sum index {} expects a numeric value column, found {:?}",
                index.name(),
                other.value_type()
            ))),
            None => Ok(0),
        }
    }

    fn checked_delta(&self, ctx: &mut TransactionContext, index: &IndexDefinition, key: &[u8], delta: i64) -> Result<()> {
        let current = ctx.get(key)?.map(|b| decode_counter(&b)).unwrap_or(0);
        current
            .checked_add(delta)
            .ok_or_else(|| rl_store::Error::Maintainer(format!("sum index {} overflowed i64", index.name())))?;
        ctx.atomic_add(key, delta)?;
        Ok(())
    }
}

impl Default for SumIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for SumIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let key = index_subspace.pack(self.group_key(index, key_values));
        let delta = self.summand(index, key_values)?;
        self.checked_delta(ctx, index, &key, delta)?;
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
        let old_value = self.summand(index, old_key_values)?;
        let new_value = self.summand(index, new_key_values)?;
        if old_group == new_group {
            if old_value != new_value {
                self.checked_delta(ctx, index, &index_subspace.pack(old_group), new_value - old_value)?;
            }
            return Ok(None);
        }
        self.checked_delta(ctx, index, &index_subspace.pack(old_group), -old_value)?;
        self.checked_delta(ctx, index, &index_subspace.pack(new_group), new_value)?;
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
        let delta = self.summand(index, key_values)?;
        self.checked_delta(ctx, index, &key, -delta)?;
        Ok(())
    }

    /// Online build path (spec.md §4.H): shares the count index's
    /// known double-count gap against a concurrent `WRITEONLY` insert into a
    /// not-yet-built primary-key range (see `count::CountIndexMaintainer::build_from_scan`
    /// and SPEC_FULL.md's note under §4.H).
    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        _primary_key: &[TupleValue],
    ) -> Result<()> {
        let key = index_subspace.pack(self.group_key(index, key_values));
        let delta = self.summand(index, key_values)?;
        self.checked_delta(ctx, index, &key, delta)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_expr::KeyExpression;
    use rl_kv::{Kv, MemoryKv};
    use rl_schema::{IndexDefinition, IndexKind, IndexOptions};

    fn index() -> IndexDefinition {
        IndexDefinition::new("revenue_by_region", IndexKind::Sum, KeyExpression::field("region"), 3)
            .with_options(IndexOptions::grouped(1))
    }

    fn subspace() -> Subspace {
        Subspace::from_prefix(vec![0xcc])
    }

    #[test]
    fn sums_the_trailing_value_per_group() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = SumIndexMaintainer::new();
        let idx = index();
        let sub = subspace();
        let emea = |amount: i64| vec![TupleValue::Str("emea".into()), TupleValue::I64(amount)];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &emea(100), &[TupleValue::I64(1)]).unwrap();
        maintainer.apply_insert(&mut ctx, &idx, &sub, &emea(50), &[TupleValue::I64(2)]).unwrap();

        let group_key = [TupleValue::Str("emea".into())];
        let total = ctx.get(&sub.pack(&group_key)).unwrap().map(|b| decode_counter(&b)).unwrap_or(0);
        assert_eq!(total, 150);
    }

    #[test]
    fn overflow_is_rejected_before_mutating() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = SumIndexMaintainer::new();
        let idx = index();
        let sub = subspace();
        let group_key = vec![TupleValue::Str("emea".into())];
        ctx.set(&sub.pack(&group_key), &i64::MAX.to_le_bytes()).unwrap();

        let row = vec![TupleValue::Str("emea".into()), TupleValue::I64(1)];
        let err = maintainer.apply_insert(&mut ctx, &idx, &sub, &row, &[TupleValue::I64(1)]).unwrap_err();
        assert!(matches!(err, rl_store::Error::Maintainer(_)));
        let total = ctx.get(&sub.pack(&group_key)).unwrap().map(|b| decode_counter(&b)).unwrap();
        assert_eq!(total, i64::MAX);
    }
}
