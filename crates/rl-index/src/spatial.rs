use crate::error::Result;
use rl_schema::IndexDefinition;
use rl_store::IndexMaintainer;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

fn normalize(value: f64, range: (f64, f64)) -> f64 {
    ((value - range.0) / (range.1 - range.0)).clamp(0.0, 1.0)
}

fn quantize(normalized: f64, bits: u8) -> u64 {
    let max = (1u64 << bits) - 1;
    (normalized * max as f64).round() as u64
}

/// Interleaves the low `bits` bits of each coordinate into a single Morton
/// (Z-order) code, bit `i` of dimension `d` landing at output bit
/// `i * dimensions + d`.
fn interleave(coords: &[u64], bits: u8) -> u64 {
    let mut code = 0u64;
    for bit in 0..bits as u32 {
        for (dim, coord) in coords.iter().enumerate() {
            let set = (coord >> bit) & 1;
            code |= set << (bit as usize * coords.len() + dim);
        }
    }
    code
}

/// Encodes a 2D or 3D point (spec.md §4.G: longitude/latitude[, altitude])
/// into a Morton code, normalizing each axis into `[0,1]` before quantizing
/// to `spatial_level` bits and interleaving.
pub fn morton_code(options: &rl_schema::IndexOptions, coords: &[f64]) -> Result<i64> {
    if coords.len() != options.spatial_dimensions as usize {
        return Err(rl_store::Error::Maintainer(format!(
            "spatial index expects {} coordinates, got {}",
            options.spatial_dimensions,
            coords.len()
        )));
    }
    let mut normalized = vec![normalize(coords[0], LONGITUDE_RANGE), normalize(coords[1], LATITUDE_RANGE)];
    if coords.len() == 3 {
        let altitude_range = options
            .altitude_range
            .ok_or_else(|| rl_store::Error::Maintainer("3D spatial index requires an altitude_range".into()))?;
        normalized.push(normalize(coords[2], altitude_range));
    }
    let quantized: Vec<u64> = normalized.iter().map(|n| quantize(*n, options.spatial_level)).collect();
    let code = interleave(&quantized, options.spatial_level);
    Ok(code as i64)
}

/// A single covering Morton range `[min, max]` for a bounding box, computed
/// from the codes of its corners. This is a conservative, not a tight,
/// decomposition: a real Z-order range query recursively splits on
/// LITMAX/BIGMIN to produce several tight ranges; this returns one range
/// that is guaranteed to contain every matching point at the cost of
/// over-fetching quadrants the box doesn't actually touch.
pub fn covering_range(options: &rl_schema::IndexOptions, min_coords: &[f64], max_coords: &[f64]) -> Result<(i64, i64)> {
    let dims = options.spatial_dimensions as usize;
    let mut corners = Vec::with_capacity(1 << dims);
    for mask in 0..(1usize << dims) {
        let mut corner = Vec::with_capacity(dims);
        for d in 0..dims {
            corner.push(if mask & (1 << d) != 0 { max_coords[d] } else { min_coords[d] });
        }
        corners.push(corner);
    }
    let codes: Result<Vec<i64>> = corners.iter().map(|c| morton_code(options, c)).collect();
    let codes = codes?;
    Ok((codes.iter().copied().min().unwrap(), codes.iter().copied().max().unwrap()))
}

/// Spatial index (spec.md §4.G): one entry per record at
/// `index_subspace.pack([morton_code, primary_key...])`.
pub struct SpatialIndexMaintainer;

impl SpatialIndexMaintainer {
    pub fn new() -> Self {
        Self
    }

    fn code(&self, index: &IndexDefinition, key_values: &[TupleValue]) -> Result<i64> {
        let coords: Result<Vec<f64>> = key_values
            .iter()
            .map(|v| match v {
                TupleValue::F64(f) => Ok(*f),
                TupleValue::I64(i) => Ok(*i as f64),
                other => Err(rl_store::Error::Maintainer(format!(
                    "spatial index {} expects numeric coordinates, found {:?}",
                    index.name(),
                    other.value_type()
                ))),
            })
            .collect();
        morton_code(index.options(), &coords?)
    }

    fn entry(&self, code: i64, primary_key: &[TupleValue]) -> Vec<TupleValue> {
        let mut tuple = vec![TupleValue::I64(code)];
        tuple.extend_from_slice(primary_key);
        tuple
    }
}

impl Default for SpatialIndexMaintainer {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexMaintainer for SpatialIndexMaintainer {
    fn apply_insert(
        &self,
        ctx: &mut TransactionContext,
        index: &IndexDefinition,
        index_subspace: &Subspace,
        key_values: &[TupleValue],
        primary_key: &[TupleValue],
    ) -> Result<Option<Vec<TupleValue>>> {
        let code = self.code(index, key_values)?;
        ctx.set(&index_subspace.pack(&self.entry(code, primary_key)), &[])?;
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
        let old_code = self.code(index, old_key_values)?;
        let new_code = self.code(index, new_key_values)?;
        if old_code == new_code {
            return Ok(None);
        }
        ctx.clear(&index_subspace.pack(&self.entry(old_code, primary_key)))?;
        ctx.set(&index_subspace.pack(&self.entry(new_code, primary_key)), &[])?;
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
        let code = self.code(index, key_values)?;
        ctx.clear(&index_subspace.pack(&self.entry(code, primary_key)))?;
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
        let code = self.code(index, key_values)?;
        ctx.set(&index_subspace.pack(&self.entry(code, primary_key)), &[])?;
        Ok(())
    }
}
