use crate::error::{Error, Result};
use rl_kv::Transaction;
use std::any::Any;
use std::collections::HashMap;

type PreCommitHook = Box<dyn FnOnce(&mut dyn Transaction) -> rl_kv::Result<()> + Send>;
type PostCommitHook = Box<dyn FnOnce() + Send>;

/// Wraps one KV transaction (spec.md §4.D). Scoped acquisition discipline:
/// a `TransactionContext` dropped without an explicit [`TransactionContext::commit`]
/// or [`TransactionContext::cancel`] cancels the underlying transaction in
/// [`Drop::drop`], so every exit path -- early return, `?`, panic unwind --
/// releases the KV transaction.
pub struct TransactionContext {
    txn: Option<Box<dyn Transaction>>,
    pre_commit_hooks: Vec<PreCommitHook>,
    post_commit_hooks: Vec<PostCommitHook>,
    metadata: HashMap<String, Box<dyn Any + Send>>,
    closed: bool,
}

impl TransactionContext {
    pub fn new(txn: Box<dyn Transaction>) -> Self {
        Self {
            txn: Some(txn),
            pre_commit_hooks: Vec::new(),
            post_commit_hooks: Vec::new(),
            metadata: HashMap::new(),
            closed: false,
        }
    }

    fn txn_mut(&mut self) -> Result<&mut Box<dyn Transaction>> {
        self.txn.as_mut().ok_or(Error::AlreadyClosed)
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.txn_mut()?.get(key)?)
    }

    pub fn range(&mut self, begin: &[u8], end: &[u8], reverse: bool) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self.txn_mut()?.range(begin, end, reverse)?)
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.txn_mut()?.set(key, value);
        Ok(())
    }

    pub fn clear(&mut self, key: &[u8]) -> Result<()> {
        self.txn_mut()?.clear(key);
        Ok(())
    }

    pub fn clear_range(&mut self, begin: &[u8], end: &[u8]) -> Result<()> {
        self.txn_mut()?.clear_range(begin, end);
        Ok(())
    }

    pub fn atomic_add(&mut self, key: &[u8], delta: i64) -> Result<()> {
        self.txn_mut()?.atomic_add(key, delta);
        Ok(())
    }

    pub fn atomic_byte_min(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.txn_mut()?.atomic_byte_min(key, value);
        Ok(())
    }

    pub fn atomic_byte_max(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.txn_mut()?.atomic_byte_max(key, value);
        Ok(())
    }

    pub fn set_timeout(&mut self, ms: u64) -> Result<()> {
        self.txn_mut()?.set_timeout(ms);
        Ok(())
    }

    pub fn disable_read_your_writes(&mut self) -> Result<()> {
        self.txn_mut()?.disable_read_your_writes();
        Ok(())
    }

    /// Registers a hook run, in registration order, just before the
    /// underlying transaction commits. A hook that returns an error aborts
    /// the commit: no later hook runs and the transaction is not committed.
    pub fn add_pre_commit_hook<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut dyn Transaction) -> rl_kv::Result<()> + Send + 'static,
    {
        self.pre_commit_hooks.push(Box::new(hook));
    }

    /// Registers a hook run, in registration order, only after the
    /// transaction has committed successfully.
    pub fn add_post_commit_hook<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_commit_hooks.push(Box::new(hook));
    }

    /// A typed scratchpad scoped to this context, used by index maintainers
    /// to stash per-transaction state (e.g. a min/max maintainer's expected
    /// current value for an optimistic conflict check).
    pub fn set_metadata<T: Any + Send + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.metadata.insert(key.into(), Box::new(value));
    }

    pub fn get_metadata<T: Any>(&self, key: &str) -> Option<&T> {
        self.metadata.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Commits the underlying transaction. Idempotent-safe to call only
    /// once: a context that outlives its own commit is a logic error caught
    /// at compile time since `commit` consumes `self`; calling any other
    /// method after a failed commit observes [`Error::AlreadyClosed`]
    /// through the dropped value's `Drop` impl having already run.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn commit(mut self) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        self.closed = true;
        let mut txn = self.txn.take().expect("not closed implies an open transaction");

        for hook in std::mem::take(&mut self.pre_commit_hooks) {
            hook(txn.as_mut())?;
        }
        txn.commit()?;
        for hook in std::mem::take(&mut self.post_commit_hooks) {
            hook();
        }
        Ok(())
    }

    /// Discards the transaction without applying any buffered writes. Safe
    /// to call on an already-closed context (a no-op), matching spec.md
    /// §4.D's "cancel (safe repeat)".
    pub fn cancel(mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(txn) = self.txn.take() {
            txn.cancel();
        }
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Some(txn) = self.txn.take() {
                txn.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_kv::{Kv, MemoryKv};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn commit_runs_pre_and_post_hooks_in_order() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let log1 = log.clone();
        ctx.add_pre_commit_hook(move |txn| {
            txn.set(b"pre", b"1");
            log1.lock().push("pre");
            Ok(())
        });
        let log2 = log.clone();
        ctx.add_post_commit_hook(move || log2.lock().push("post"));

        ctx.commit().unwrap();
        assert_eq!(*log.lock(), vec!["pre", "post"]);

        let mut read = TransactionContext::new(kv.begin());
        assert_eq!(read.get(b"pre").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn failing_pre_commit_hook_aborts_commit() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        ctx.set(b"a", b"1").unwrap();
        ctx.add_pre_commit_hook(|_| Err(rl_kv::Error::Internal("boom".into())));

        let post_ran = Arc::new(AtomicBool::new(false));
        let post_ran2 = post_ran.clone();
        ctx.add_post_commit_hook(move || post_ran2.store(true, Ordering::SeqCst));

        assert!(ctx.commit().is_err());
        assert!(!post_ran.load(Ordering::SeqCst));

        let mut read = TransactionContext::new(kv.begin());
        assert_eq!(read.get(b"a").unwrap(), None);
    }

    #[test]
    fn cancel_then_drop_does_not_cancel_twice() {
        let kv = MemoryKv::new();
        let ctx = TransactionContext::new(kv.begin());
        ctx.cancel();
        // Dropping an already-cancelled context must not attempt to cancel
        // the (already consumed) transaction a second time.
    }

    #[test]
    fn drop_without_commit_cancels_transaction() {
        let kv = MemoryKv::new();
        {
            let mut ctx = TransactionContext::new(kv.begin());
            ctx.set(b"a", b"1").unwrap();
            // dropped without commit
        }
        let mut read = TransactionContext::new(kv.begin());
        assert_eq!(read.get(b"a").unwrap(), None);
    }

    #[test]
    fn metadata_scratchpad_roundtrips_typed_value() {
        let kv = MemoryKv::new();
        let mut ctx = TransactionContext::new(kv.begin());
        ctx.set_metadata("expected_version", 42i64);
        assert_eq!(ctx.get_metadata::<i64>("expected_version"), Some(&42));
        assert_eq!(ctx.get_metadata::<String>("expected_version"), None);
        ctx.cancel();
    }
}
