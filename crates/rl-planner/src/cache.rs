// Plan cache (spec.md §4.I): a canonical, order-independent key derived
// from a query's structure (not from memory-address stringification, the
// redesign flag spec.md §9 calls out), keyed per record type.

use crate::filter::{Comparison, Filter, Query, SortKey};
use crate::plan::Plan;
use parking_lot::RwLock;
use rl_type::TupleValue;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A deterministic hash of a query's canonical byte encoding. Two
/// structurally equal queries -- including `And`/`Or` children supplied in
/// a different order -- always produce the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

/// Builds the canonical byte encoding of `query` and hashes it with a
/// fixed-seed hasher so the key is stable across process restarts (unlike
/// `HashMap`'s randomized `RandomState`).
pub fn compute_cache_key(query: &Query) -> CacheKey {
    let mut bytes = Vec::new();
    encode_str(&query.record_type, &mut bytes);
    match &query.filter {
        Some(f) => {
            bytes.push(1);
            encode_filter(f, &mut bytes);
        }
        None => bytes.push(0),
    }
    bytes.extend((query.sort.len() as u32).to_le_bytes());
    for key in &query.sort {
        encode_sort_key(key, &mut bytes);
    }
    match query.limit {
        Some(n) => {
            bytes.push(1);
            bytes.extend((n as u64).to_le_bytes());
        }
        None => bytes.push(0),
    }

    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    CacheKey(hasher.finish())
}

fn encode_str(s: &str, out: &mut Vec<u8>) {
    out.extend((s.len() as u32).to_le_bytes());
    out.extend(s.as_bytes());
}

fn encode_sort_key(key: &SortKey, out: &mut Vec<u8>) {
    encode_str(&key.field, out);
    out.push(key.ascending as u8);
}

fn encode_value(value: &TupleValue, out: &mut Vec<u8>) {
    out.extend(rl_tuple::encode(std::slice::from_ref(value)));
}

fn encode_comparison(comparison: &Comparison, out: &mut Vec<u8>) {
    match comparison {
        Comparison::Eq(v) => {
            out.push(0);
            encode_value(v, out);
        }
        Comparison::Lt(v) => {
            out.push(1);
            encode_value(v, out);
        }
        Comparison::Le(v) => {
            out.push(2);
            encode_value(v, out);
        }
        Comparison::Gt(v) => {
            out.push(3);
            encode_value(v, out);
        }
        Comparison::Ge(v) => {
            out.push(4);
            encode_value(v, out);
        }
        Comparison::StartsWith(prefix) => {
            out.push(5);
            encode_str(prefix, out);
        }
        Comparison::Contains(v) => {
            out.push(6);
            encode_value(v, out);
        }
        Comparison::In(values) => {
            out.push(7);
            let mut encoded: Vec<Vec<u8>> = values.iter().map(|v| rl_tuple::encode(std::slice::from_ref(v))).collect();
            encoded.sort();
            out.extend((encoded.len() as u32).to_le_bytes());
            for e in encoded {
                out.extend((e.len() as u32).to_le_bytes());
                out.extend(e);
            }
        }
    }
}

fn encode_filter(filter: &Filter, out: &mut Vec<u8>) {
    match filter {
        Filter::True => out.push(0),
        Filter::False => out.push(1),
        Filter::Not(inner) => {
            out.push(2);
            encode_filter(inner, out);
        }
        Filter::Field { name, comparison } => {
            out.push(3);
            encode_str(name, out);
            encode_comparison(comparison, out);
        }
        Filter::And(children) => {
            out.push(4);
            encode_commutative(children, out);
        }
        Filter::Or(children) => {
            out.push(5);
            encode_commutative(children, out);
        }
    }
}

/// Encodes each child independently, sorts the resulting byte strings, then
/// concatenates -- the order the caller supplied `And`/`Or` children in
/// does not affect the result.
fn encode_commutative(children: &[Filter], out: &mut Vec<u8>) {
    let mut encoded: Vec<Vec<u8>> = children
        .iter()
        .map(|c| {
            let mut buf = Vec::new();
            encode_filter(c, &mut buf);
            buf
        })
        .collect();
    encoded.sort();
    out.extend((encoded.len() as u32).to_le_bytes());
    for e in encoded {
        out.extend((e.len() as u32).to_le_bytes());
        out.extend(e);
    }
}

/// Caches chosen plans per record type. No size limit or eviction policy is
/// applied -- spec.md §9 leaves this an open question and the source hints
/// at unbounded per-record-type caches; see DESIGN.md.
#[derive(Default)]
pub struct PlanCache {
    entries: RwLock<HashMap<(String, CacheKey), Plan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, record_type: &str, key: CacheKey) -> Option<Plan> {
        self.entries.read().get(&(record_type.to_string(), key)).cloned()
    }

    pub fn insert(&self, record_type: impl Into<String>, key: CacheKey, plan: Plan) {
        self.entries.write().insert((record_type.into(), key), plan);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
