use crate::error::Result;
use rl_kv::Kv;
use rl_schema::Record;
use rl_txn::TransactionContext;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

/// A long-running scan over every record in a store, internally split into
/// multiple KV transactions across batches (spec.md §4.E). Each call to
/// `next()` that exhausts its buffer opens a fresh transaction, reads one
/// batch with a snapshot range scan, and immediately cancels that
/// transaction -- there is never a transaction held open *between* calls to
/// `next()`, so dropping the iterator at any point (early termination,
/// panic, natural exhaustion) never leaks an open transaction. The `ctx`
/// field exists purely so [`Drop`] has something to cancel if a panic
/// unwinds mid-batch-read.
pub struct ScanIterator<T: Record> {
    kv: Arc<dyn Kv>,
    begin: Vec<u8>,
    end: Vec<u8>,
    batch_size: usize,
    buffer: VecDeque<T>,
    done: bool,
    ctx: Option<TransactionContext>,
    _marker: PhantomData<T>,
}

impl<T: Record> ScanIterator<T> {
    pub(crate) fn new(kv: Arc<dyn Kv>, begin: Vec<u8>, end: Vec<u8>, batch_size: usize) -> Self {
        Self { kv, begin, end, batch_size, buffer: VecDeque::new(), done: false, ctx: None, _marker: PhantomData }
    }

    /// Reads one batch starting at `self.begin`, advancing the continuation
    /// to the last key read plus `0x00` (spec.md §4.E: "using the last key +
    /// `0x00` as continuation"). Returns `false` once the range is
    /// exhausted.
    fn fill_buffer(&mut self) -> Result<bool> {
        let mut ctx = TransactionContext::new(self.kv.begin());
        self.ctx = None;
        let rows = match ctx.range(&self.begin, &self.end, false) {
            Ok(rows) => rows,
            Err(e) => {
                ctx.cancel();
                return Err(e.into());
            }
        };
        if rows.is_empty() {
            ctx.cancel();
            self.done = true;
            return Ok(false);
        }
        let take_n = rows.len().min(self.batch_size);
        let mut last_key = rows[take_n - 1].0.clone();
        for (_, value) in &rows[..take_n] {
            match T::decode(value) {
                Ok(record) => self.buffer.push_back(record),
                Err(e) => {
                    ctx.cancel();
                    return Err(e.into());
                }
            }
        }
        last_key.push(0x00);
        self.begin = last_key;
        ctx.cancel();
        Ok(true)
    }
}

impl<T: Record> Iterator for ScanIterator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            match self.fill_buffer() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<T: Record> Drop for ScanIterator<T> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_kind::RowKind;
    use rl_expr::{FieldAccessor, KeyExpression, MapAccessor};
    use rl_kv::MemoryKv;
    use rl_schema::IndexDefinition;
    use rl_tuple::Subspace;
    use rl_type::TupleValue;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Item {
        id: i64,
    }

    impl Record for Item {
        fn record_name() -> &'static str {
            "Item"
        }
        fn primary_key_expression() -> KeyExpression {
            KeyExpression::field("id")
        }
        fn index_definitions() -> Vec<IndexDefinition> {
            vec![]
        }
        fn accessor(&self) -> Box<dyn FieldAccessor + '_> {
            Box::new(MapAccessor::new().with_field("id", self.id))
        }
    }

    fn record_subspace() -> Subspace {
        Subspace::root().child(&[RowKind::Record.tag()])
    }

    fn seed(kv: &MemoryKv, n: i64) {
        let sub = record_subspace();
        let mut ctx = TransactionContext::new(kv.begin());
        for id in 0..n {
            let item = Item { id };
            let key = sub.pack(&[TupleValue::I64(id)]);
            ctx.set(&key, &item.encode().unwrap()).unwrap();
        }
        ctx.commit().unwrap();
    }

    #[test]
    fn scan_yields_every_record_across_batches() {
        let kv = MemoryKv::new();
        seed(&kv, 10);
        let (begin, end) = record_subspace().range();
        let iter: ScanIterator<Item> = ScanIterator::new(Arc::new(kv), begin, end, 3);
        let items: Vec<Item> = iter.map(|r| r.unwrap()).collect();
        assert_eq!(items.len(), 10);
        let mut ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        ids.sort();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn dropping_iterator_early_does_not_leak_a_transaction() {
        let kv = MemoryKv::new();
        seed(&kv, 20);
        let (begin, end) = record_subspace().range();
        let iter: ScanIterator<Item> = ScanIterator::new(Arc::new(kv.clone()), begin, end, 3);
        {
            let mut iter = iter;
            assert!(iter.next().is_some());
            // dropped here, mid-scan
        }
        // A fresh write transaction must be able to proceed without
        // conflicting against a leaked scan transaction.
        let mut ctx = TransactionContext::new(kv.begin());
        ctx.set(b"probe", b"1").unwrap();
        ctx.commit().unwrap();
    }

    #[test]
    fn empty_range_yields_nothing() {
        let kv = MemoryKv::new();
        let (begin, end) = record_subspace().range();
        let iter: ScanIterator<Item> = ScanIterator::new(Arc::new(kv), begin, end, 5);
        assert_eq!(iter.count(), 0);
    }
}
