use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

/// Value index (spec.md §4.G): one entry per record at
/// `index_subspace.pack(key_values ++ primary_key)`. `unique` rejects a
/// second record evaluating to the same `key_values`; `replace_on_duplicate`
/// (requires `unique`) evicts the conflicting owner instead of failing.
pub struct ValueIndexMaintainer;

impl ValueIndexMaintainer {
    pub fn new() -> Self {
        Self
    }

    /// Entries sharing `key_values` form a contiguous range under the
    /// sub-prefix `index_subspace.pack(key_values)`, since every entry's
    /// remaining bytes are just the appended primary-key tuple.
    fn conflicting_owner(
        &self,
        ctx: &mut TransactionContext,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<u8>>> {
        let value_prefix = Subspace::from_prefix(index_subspace.pack(key_values));
        let (begin, end) = value_prefix.range();
        let rows = ctx.range(&begin, &end, false)?;
        for (key, _) in rows {
            let tuple = index_subspace.unpack(&key)?;
            let owner_pk = &tuple[key_values.len()..];
            if owner_pk != primary_key {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn write_unique_checked(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let mut evicted = None;
        if index.options().unique {
            if let Some(conflicting_key) = self.conflicting_owner(ctx, index_subspace, key_values, primary_key)? {
                let tuple = index_subspace.unpack(&conflicting_key)?;
                let conflicting_primary_key = tuple[key_values.len()..].to_vec();
                if !index.options().replace_on_duplicate {
                    return Err(rl_store::Error::UniquenessViolation {
                        index: index.name().to_string(),
                        conflicting_primary_key,
                    });
                }
                evicted = Some(conflicting_primary_key);
                ctx.clear(&conflicting_key)?;
            }
        }
        let mut entry = key_values.to_vec();
        entry.extend_from_slice(primary_key);
        ctx.set(&index_subspace.pack(&entry), &[])?;
        Ok(evicted)
    }
}

impl Default for ValueIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for ValueIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        self.write_unique_checked(ctx, index, index_subspace, key_values, primary_key)
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
        if old_key_values == new_key_values {
            return Ok(None);
        }
        let mut old_entry = old_key_values.to_vec();
        old_entry.extend_from_slice(primary_key);
        ctx.clear(&index_subspace.pack(&old_entry))?;
        self.write_unique_checked(ctx, index, index_subspace, new_key_values, primary_key)
    }

    fn apply_delete(
        &self,
        ctx: &mut TransactionContext,
        _index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let mut entry = key_values.to_vec();
        entry.extend_from_slice(primary_key);
        ctx.clear(&index_subspace.pack(&entry))?;
        Ok(())
    }

    /// Idempotent insert without the uniqueness veto: the online indexer
    /// (spec.md §4.H) scans existing production data in primary-key order,
    /// and a uniqueness conflict discovered mid-build is a data integrity
    /// problem to surface separately, not something this write path silently
    /// resolves by evicting one of two already-committed records.
    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        _index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let mut entry = key_values.to_vec();
        entry.extend_from_slice(primary_key);
        ctx.set(&index_subspace.pack(&entry), &[])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_expr::KeyExpression;
    use rl_kv::{Kv, MemoryKv};
    use rl_schema::{IndexDefinition, IndexKind, IndexOptions};

    fn index(unique: bool, replace: bool) -> IndexDefinition {
        IndexDefinition::new("by_email", IndexKind::Value, KeyExpression::field("email"), 1)
            .with_options(IndexOptions { unique, replace_on_duplicate: replace, ..IndexOptions::default() })
    }

    fn subspace() -> Subspace {
        Subspace::from_prefix(vec![0xaa])
    }

    #[test]
    fn non_unique_allows_duplicate_values() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = ValueIndexMaintainer::new();
        let idx = index(false, false);
        let sub = subspace();
        let key_values = vec![TupleValue::Str("a@example.com".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(1)]).unwrap();
        let evicted =
            maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(2)]).unwrap();
        assert!(evicted.is_none());
    }

    #[test]
    fn unique_rejects_duplicate_without_replace() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = ValueIndexMaintainer::new();
        let idx = index(true, false);
        let sub = subspace();
        let key_values = vec![TupleValue::Str("a@example.com".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(1)]).unwrap();
        let err = maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(2)]).unwrap_err();
        match err {
            rl_store::Error::UniquenessViolation { index, conflicting_primary_key } => {
                assert_eq!(index, "by_email");
                assert_eq!(conflicting_primary_key, vec![TupleValue::I64(1)]);
            }
            other => panic!("expected UniquenessViolation, got {other:?}"),
        }
    }

    #[test]
    fn unique_with_replace_evicts_previous_owner() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = ValueIndexMaintainer::new();
        let idx = index(true, true);
        let sub = subspace();
        let key_values = vec![TupleValue::Str("a@example.com".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(1)]).unwrap();
        let evicted =
            maintainer.apply_insert(&mut ctx, &idx, &sub, &key_values, &[TupleValue::I64(2)]).unwrap();
        assert_eq!(evicted, Some(vec![TupleValue::I64(1)]));
    }

    #[test]
    fn update_changing_key_values_moves_the_entry() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let maintainer = ValueIndexMaintainer::new();
        let idx = index(false, false);
        let sub = subspace();
        let pk = vec![TupleValue::I64(1)];
        let old = vec![TupleValue::Str("old@example.com".into())];
        let new = vec![TupleValue::Str("new@example.com".into())];
        maintainer.apply_insert(&mut ctx, &idx, &sub, &old, &pk).unwrap();
        maintainer.apply_update(&mut ctx, &idx, &sub, &old, &new, &pk).unwrap();

        let (begin, end) = sub.range();
        let rows = ctx.range(&begin, &end, false).unwrap();
        assert_eq!(rows.len(), 1);
        let tuple = sub.unpack(&rows[0].0).unwrap();
        assert_eq!(&tuple[..1], &new[..]);
    }
}
