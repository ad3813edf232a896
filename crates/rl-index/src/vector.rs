use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

/// Vector index (spec.md §4.G): inline maintenance is limited to keeping a
/// dense-array sidecar entry per record (`index_subspace.pack(primary_key)`
/// -> the raw coordinates, encoded with the tuple codec). Building the
/// actual similarity-search structure -- an HNSW graph, per
/// [`rl_schema::VectorStrategy::HnswBatch`] -- is the online indexer's job
/// (spec.md §4.H), run once as a distinct post-build step over the sidecar
/// entries this maintainer writes, not something this maintainer does
/// itself. [`VectorStrategy::FlatScan`] needs no separate build step at all:
/// [`flat_scan`] queries the sidecar entries directly.
pub struct VectorIndexMaintainer;

impl VectorIndexMaintainer {
    pub fn new() -> Self {
        Self
    }

    fn sidecar_key(&self, index_subspace: &Subspace, primary_key: &[TupleValue]) -> Vec<u8> {
        index_subspace.pack(primary_key)
    }

    fn check_dimensions(&self, index: &IndexDefinition, key_values: &[TupleValue]) -> Result<()> {
        if key_values.len() != index.options().vector_dimensions {
            return Err(rl_store::Error::Maintainer(format!(
                "vector index {} expects {} dimensions, got {}",
                index.name(),
                index.options().vector_dimensions,
                key_values.len()
            )));
        }
        Ok(())
    }
}

impl Default for VectorIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for VectorIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        self.check_dimensions(index, key_values)?;
        ctx.set(&self.sidecar_key(index_subspace, primary_key), &rl_tuple::encode(key_values))?;
        Ok(None)
    }

    fn apply_update(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        _old_key_values: &[TupleValue],
        new_key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        self.check_dimensions(index, new_key_values)?;
        ctx.set(&self.sidecar_key(index_subspace, primary_key), &rl_tuple::encode(new_key_values))?;
        Ok(None)
    }

    fn apply_delete(
        &self,
        ctx: &mut TransactionContext,
        _index: &IndexDefinition,
        index_subspace: &Subspace,
        _key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<()> {
        ctx.clear(&self.sidecar_key(index_subspace, primary_key))?;
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
        self.check_dimensions(index, key_values)?;
        ctx.set(&self.sidecar_key(index_subspace, primary_key), &rl_tuple::encode(key_values))?;
        Ok(())
    }
}

fn euclidean_distance(a: &[TupleValue], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut sum = 0.0;
    for (av, bv) in a.iter().zip(b) {
        let av = match av {
            TupleValue::F64(f) => *f,
            TupleValue::I64(i) => *i as f64,
            _ => return None,
        };
        sum += (av - bv).powi(2);
    }
    Some(sum.sqrt())
}

/// [`rl_schema::VectorStrategy::FlatScan`]'s query path (spec.md §4.G): an
/// exact O(n) scan over every sidecar entry, returning the `k` primary keys
/// closest to `query_vector` by Euclidean distance, nearest first.
pub fn flat_scan(
    ctx: &mut TransactionContext,
    index_subspace: &Subspace,
    query_vector: &[f64],
    k: usize,
) -> Result<Vec<(Vec<TupleValue>, f64)>> {
    let (begin, end) = index_subspace.range();
    let rows = ctx.range(&begin, &end, false)?;
    let mut scored = Vec::with_capacity(rows.len());
    for (key, value) in rows {
        let primary_key = index_subspace.unpack(&key)?;
        let vector = rl_tuple::decode(&value)?;
        if let Some(distance) = euclidean_distance(&vector, query_vector) {
            scored.push((primary_key, distance));
        }
    }
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    Ok(scored)
}
