use rl_store::Result;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;
use std::collections::HashMap;

/// A simplified, single-layer approximation of an HNSW graph: every node
/// keeps the `m` nearest neighbors found by a brute-force distance pass over
/// the full corpus. Built once as a batch step over the dense-array sidecar
/// entries `rl-index`'s vector maintainer writes inline -- the `HnswBatch`
/// build path (spec.md §4.H/§4.G) that maintainer explicitly defers to the
/// online indexer rather than doing itself.
///
/// This is not a full multi-layer HNSW: there is no layer assignment and no
/// entry-point-based greedy descent, only the flat nearest-neighbor graph a
/// base layer would be. [`VectorStrategy::FlatScan`](rl_schema::VectorStrategy::FlatScan)
/// needs no graph at all and stays on `rl_index::flat_scan`'s exact O(n)
/// path; this graph exists only for indexes configured with
/// [`VectorStrategy::HnswBatch`](rl_schema::VectorStrategy::HnswBatch).
pub struct HnswGraph {
    neighbors: HashMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl HnswGraph {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// The primary keys of `primary_key`'s stored neighbors, nearest first.
    pub fn neighbors_of(&self, primary_key: &[TupleValue]) -> Result<Vec<Vec<TupleValue>>> {
        let key = rl_tuple::encode(primary_key);
        match self.neighbors.get(&key) {
            None => Ok(Vec::new()),
            Some(encoded) => encoded.iter().map(|b| rl_tuple::decode(b).map_err(Into::into)).collect(),
        }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

fn as_f64(value: &TupleValue) -> f64 {
    match value {
        TupleValue::F64(f) => *f,
        TupleValue::I64(i) => *i as f64,
        _ => 0.0,
    }
}

/// Reads every sidecar entry under `index_subspace` and builds an
/// [`HnswGraph`] keeping each point's `m` nearest neighbors by Euclidean
/// distance. `O(n^2)` in the number of points, same as `rl_index::flat_scan`
/// per query -- appropriate for the batch build path, which runs once, not
/// per query.
pub fn build_hnsw_graph(ctx: &mut TransactionContext, index_subspace: &Subspace, m: usize) -> Result<HnswGraph> {
    let (begin, end) = index_subspace.range();
    let rows = ctx.range(&begin, &end, false)?;
    let mut points = Vec::with_capacity(rows.len());
    for (key, value) in &rows {
        let primary_key = index_subspace.unpack(key)?;
        let vector = rl_tuple::decode(value)?;
        let coords: Vec<f64> = vector.iter().map(as_f64).collect();
        points.push((primary_key, coords));
    }

    let mut neighbors = HashMap::with_capacity(points.len());
    for (i, (pk_i, coords_i)) in points.iter().enumerate() {
        let mut distances: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, (_, coords_j))| (j, euclidean(coords_i, coords_j)))
            .collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(m);
        let list = distances.into_iter().map(|(j, _)| rl_tuple::encode(&points[j].0)).collect();
        neighbors.insert(rl_tuple::encode(pk_i), list);
    }
    Ok(HnswGraph { neighbors })
}
