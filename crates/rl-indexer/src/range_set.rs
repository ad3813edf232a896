use rl_store::Result;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;

/// Persistent build progress for one index (spec.md §4.H step 2): a union of
/// non-overlapping half-open `[begin, end)` byte ranges, stored at keyspace
/// `6` as `(index_name, begin_bytes) -> end_bytes` (spec.md §6's persisted
/// state layout). Adjacent and overlapping ranges are coalesced on insert,
/// so the entry count stays proportional to the number of *gaps*, not the
/// number of batches ever run.
pub struct RangeSet {
    subspace: Subspace,
}

impl RangeSet {
    pub fn new(subspace: Subspace) -> Self {
        Self { subspace }
    }

    fn index_prefix(&self, index_name: &str) -> Subspace {
        Subspace::from_prefix(self.subspace.pack(&[TupleValue::Str(index_name.to_string())]))
    }

    /// Every range currently recorded for `index_name`, ordered by `begin`.
    pub fn ranges(&self, ctx: &mut TransactionContext, index_name: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = self.index_prefix(index_name);
        let (begin, end) = prefix.range();
        let rows = ctx.range(&begin, &end, false)?;
        let mut out = Vec::with_capacity(rows.len());
        for (key, value) in rows {
            let tuple = prefix.unpack(&key)?;
            let Some(TupleValue::Bytes(begin_bytes)) = tuple.first() else { continue };
            out.push((begin_bytes.clone(), value));
        }
        out.sort();
        Ok(out)
    }

    /// Merges `[begin, end)` into the recorded set for `index_name`,
    /// coalescing with any overlapping or adjacent range.
    pub fn insert(&self, ctx: &mut TransactionContext, index_name: &str, begin: &[u8], end: &[u8]) -> Result<()> {
        if begin >= end {
            return Ok(());
        }
        let mut ranges = self.ranges(ctx, index_name)?;
        ranges.push((begin.to_vec(), end.to_vec()));
        let merged = coalesce(ranges);

        let prefix = self.index_prefix(index_name);
        let (clear_begin, clear_end) = prefix.range();
        ctx.clear_range(&clear_begin, &clear_end)?;
        for (b, e) in merged {
            let key = prefix.pack(&[TupleValue::Bytes(b)]);
            ctx.set(&key, &e)?;
        }
        Ok(())
    }

    /// Whether `[begin, end)` is fully covered by the recorded ranges.
    pub fn covers(&self, ctx: &mut TransactionContext, index_name: &str, begin: &[u8], end: &[u8]) -> Result<bool> {
        Ok(self.next_uncovered(ctx, index_name, begin, end)?.is_none())
    }

    /// The first uncovered position at or after `from`, within `[from,
    /// limit)`, or `None` if that whole span is already covered. The online
    /// indexer (`IndexBuilder`) uses this as the next batch's start key.
    pub fn next_uncovered(
        &self,
        ctx: &mut TransactionContext,
        index_name: &str,
        from: &[u8],
        limit: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        if from >= limit {
            return Ok(None);
        }
        let ranges = self.ranges(ctx, index_name)?;
        let mut cursor = from.to_vec();
        for (b, e) in ranges {
            if cursor.as_slice() < b.as_slice() {
                break;
            }
            if cursor.as_slice() < e.as_slice() {
                cursor = e;
            }
        }
        if cursor.as_slice() >= limit {
            Ok(None)
        } else {
            Ok(Some(cursor))
        }
    }
}

fn coalesce(mut ranges: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<(Vec<u8>, Vec<u8>)> {
    ranges.sort();
    let mut out: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(ranges.len());
    for (begin, end) in ranges {
        if let Some(last) = out.last_mut() {
            if begin <= last.1 {
                if end > last.1 {
                    last.1 = end;
                }
                continue;
            }
        }
        out.push((begin, end));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_kv::{Kv, MemoryKv};

    fn range_set() -> RangeSet {
        RangeSet::new(Subspace::from_prefix(vec![0x06]))
    }

    #[test]
    fn adjacent_ranges_coalesce_into_one() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[10]).unwrap();
        rs.insert(&mut ctx, "by_city", &[10], &[20]).unwrap();
        let ranges = rs.ranges(&mut ctx, "by_city").unwrap();
        assert_eq!(ranges, vec![(vec![0], vec![20])]);
    }

    #[test]
    fn overlapping_ranges_coalesce() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[15]).unwrap();
        rs.insert(&mut ctx, "by_city", &[10], &[20]).unwrap();
        let ranges = rs.ranges(&mut ctx, "by_city").unwrap();
        assert_eq!(ranges, vec![(vec![0], vec![20])]);
    }

    #[test]
    fn disjoint_ranges_stay_separate() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[5]).unwrap();
        rs.insert(&mut ctx, "by_city", &[10], &[15]).unwrap();
        let ranges = rs.ranges(&mut ctx, "by_city").unwrap();
        assert_eq!(ranges, vec![(vec![0], vec![5]), (vec![10], vec![15])]);
    }

    #[test]
    fn different_index_names_do_not_interfere() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[10]).unwrap();
        rs.insert(&mut ctx, "by_email", &[0], &[5]).unwrap();
        assert_eq!(rs.ranges(&mut ctx, "by_city").unwrap(), vec![(vec![0], vec![10])]);
        assert_eq!(rs.ranges(&mut ctx, "by_email").unwrap(), vec![(vec![0], vec![5])]);
    }

    #[test]
    fn covers_reports_a_fully_built_span() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[10]).unwrap();
        assert!(rs.covers(&mut ctx, "by_city", &[0], &[10]).unwrap());
        assert!(!rs.covers(&mut ctx, "by_city", &[0], &[11]).unwrap());
    }

    #[test]
    fn next_uncovered_finds_the_gap_after_a_built_prefix() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[10]).unwrap();
        let next = rs.next_uncovered(&mut ctx, "by_city", &[0], &[20]).unwrap();
        assert_eq!(next, Some(vec![10]));
    }

    #[test]
    fn next_uncovered_is_none_once_the_whole_span_is_built() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        rs.insert(&mut ctx, "by_city", &[0], &[20]).unwrap();
        assert_eq!(rs.next_uncovered(&mut ctx, "by_city", &[0], &[20]).unwrap(), None);
    }

    #[test]
    fn next_uncovered_starts_at_from_when_nothing_built_yet() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let rs = range_set();
        assert_eq!(rs.next_uncovered(&mut ctx, "by_city", &[5], &[20]).unwrap(), Some(vec![5]));
    }
}
