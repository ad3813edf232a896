use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

const MEMBER_TAG: i64 = 0;
const SUMMARY_TAG: i64 = 1;

/// Min/max index (spec.md §4.G): maintains, per group, both an ordered set
/// of per-record member entries (`MEMBER_TAG, group, value, primary_key`)
/// and a single summary entry (`SUMMARY_TAG, group`) holding the current
/// extremum's `(value, primary_key)` encoding.
///
/// Insertion only ever needs the summary to move towards the extremum, so it
/// uses [`TransactionContext::atomic_byte_min`]/`atomic_byte_max` directly --
/// correct because the tuple codec is order-preserving, so byte-min/max over
/// the encoded `(value, primary_key)` pair is exactly value-min/max with the
/// primary key breaking ties. Deletion can't undo an atomic op, so it falls
/// back to the "read-modify-write with conflict detection" path spec.md
/// allows: only when the deleted record *was* the extremum does it rescan
/// the group's remaining members to find the new one.
pub struct MinMaxIndexMaintainer {
    is_min: bool,
}

impl MinMaxIndexMaintainer {
    pub fn min() -> Self {
        Self { is_min: true }
    }

    pub fn max() -> Self {
        Self { is_min: false }
    }

    fn group_key<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a [TupleValue] {
        let n = index.options().group_prefix_columns.min(key_values.len());
        &key_values[..n]
    }

    fn value<'a>(&self, index: &IndexDefinition, key_values: &'a [TupleValue]) -> &'a TupleValue {
        let n = index.options().group_prefix_columns;
        key_values.get(n).unwrap_or(&TupleValue::Null)
    }

    fn member_tuple(&self, group: &[TupleValue], value: &TupleValue, primary_key: &[TupleValue]) -> Vec<TupleValue> {
        let mut tuple = vec![TupleValue::I64(MEMBER_TAG)];
        tuple.extend_from_slice(group);
        tuple.push(value.clone());
        tuple.extend_from_slice(primary_key);
        tuple
    }

    fn summary_key(&self, index_subspace: &Subspace, group: &[TupleValue]) -> Vec<u8> {
        let mut tuple = vec![TupleValue::I64(SUMMARY_TAG)];
        tuple.extend_from_slice(group);
        index_subspace.pack(&tuple)
    }

    fn candidate(&self, value: &TupleValue, primary_key: &[TupleValue]) -> Vec<u8> {
        let mut tuple = vec![value.clone()];
        tuple.extend_from_slice(primary_key);
        rl_tuple::encode(&tuple)
    }

    fn insert_member(
        &self,
        ctx: &mut TransactionContext,
        index_subspace: &Subspace,
        group: &[TupleValue],
        value: &TupleValue,
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let member = self.member_tuple(group, value, primary_key);
        ctx.set(&index_subspace.pack(&member), &[])?;
        let summary_key = self.summary_key(index_subspace, group);
        let candidate = self.candidate(value, primary_key);
        if self.is_min {
            ctx.atomic_byte_min(&summary_key, &candidate)?;
        } else {
            ctx.atomic_byte_max(&summary_key, &candidate)?;
        }
        Ok(())
    }

    fn remove_member(
        &self,
        ctx: &mut TransactionContext,
        index_subspace: &Subspace,
        group: &[TupleValue],
        value: &TupleValue,
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let member = self.member_tuple(group, value, primary_key);
        ctx.clear(&index_subspace.pack(&member))?;

        let summary_key = self.summary_key(index_subspace, group);
        let Some(summary_bytes) = ctx.get(&summary_key)? else { return Ok(()) };
        let deleted_candidate = self.candidate(value, primary_key);
        if summary_bytes != deleted_candidate {
            return Ok(());
        }

        let member_prefix_tuple = {
            let mut t = vec![TupleValue::I64(MEMBER_TAG)];
            t.extend_from_slice(group);
            t
        };
        let member_prefix = Subspace::from_prefix(index_subspace.pack(&member_prefix_tuple));
        let (begin, end) = member_prefix.range();
        let rows = ctx.range(&begin, &end, !self.is_min)?;
        match rows.first() {
            None => {
                ctx.clear(&summary_key)?;
            }
            Some((key, _)) => {
                let full = index_subspace.unpack(key)?;
                let rest = &full[1 + group.len()..];
                ctx.set(&summary_key, &rl_tuple::encode(rest))?;
            }
        }
        Ok(())
    }
}

impl IndexMaintainer for MinMaxIndexMaintainer {
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
        self.insert_member(ctx, index_subspace, &group, &value, primary_key)?;
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
        self.remove_member(ctx, index_subspace, &old_group, &old_value, primary_key)?;
        self.insert_member(ctx, index_subspace, &new_group, &new_value, primary_key)?;
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
        self.remove_member(ctx, index_subspace, &group, &value, primary_key)
    }

    fn build_from_scan(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        let group = self.group_key(index, key_values).to_vec();
        let value = self.value(index, key_values).clone();
        self.insert_member(ctx, index_subspace, &group, &value, primary_key)
    }
}
