use crate::error::Result;
use indexmap::IndexMap;
use rl_schema::Record;
use rl_store::{BuildTarget, RecordStore};
use rl_type::TupleValue;
use std::sync::Arc;

/// A buffered unit of work over one [`RecordStore<T>`] (spec.md §4.M).
///
/// `insert`/`delete` only mutate in-memory buffers, keyed by the record's
/// encoded primary key so a later call referencing the same key cancels an
/// earlier one rather than stacking up:
///
/// - inserting a record whose primary key is already queued for deletion
///   cancels the deletion (the record is simply (re-)inserted);
/// - deleting a primary key that is already queued for insertion cancels
///   the insertion (net effect: nothing happens to that key).
///
/// [`ModelContext::save`] flushes every buffered operation through one
/// [`rl_txn::TransactionContext`] and clears both buffers only once the
/// commit succeeds, so a transient failure leaves the buffers intact for a
/// caller-driven retry (spec.md §7).
pub struct ModelContext<T: Record> {
    store: Arc<RecordStore<T>>,
    inserted: IndexMap<Vec<u8>, T>,
    deleted: IndexMap<Vec<u8>, Vec<TupleValue>>,
    autosave: bool,
}

impl<T: Record> ModelContext<T> {
    pub fn new(store: Arc<RecordStore<T>>) -> Self {
        Self { store, inserted: IndexMap::new(), deleted: IndexMap::new(), autosave: false }
    }

    /// When enabled, every `insert`/`delete` call flushes immediately via
    /// [`ModelContext::save`] instead of waiting for an explicit call
    /// (spec.md §4.M's optional `autosave`).
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn inserted(&self) -> impl Iterator<Item = &T> {
        self.inserted.values()
    }

    pub fn deleted(&self) -> impl Iterator<Item = &[TupleValue]> {
        self.deleted.values().map(|pk| pk.as_slice())
    }

    /// Queues `record` for insertion (or update, if a record with this
    /// primary key already exists in the store -- that distinction is made
    /// by `RecordStore::save` at flush time, not here). Cancels a pending
    /// deletion of the same primary key.
    #[tracing::instrument(skip(self, record), fields(record_type = T::record_name()))]
    pub fn insert(&mut self, record: T) -> Result<()> {
        let key = rl_tuple::encode(&record.primary_key());
        self.deleted.shift_remove(&key);
        self.inserted.insert(key, record);
        self.maybe_autosave()
    }

    /// Queues `primary_key` for deletion. Cancels a pending insertion of the
    /// same primary key instead of queuing a deletion, since the net effect
    /// of inserting then deleting an unsaved record is that it never
    /// existed.
    #[tracing::instrument(skip(self, primary_key), fields(record_type = T::record_name()))]
    pub fn delete(&mut self, primary_key: &[TupleValue]) -> Result<()> {
        let key = rl_tuple::encode(primary_key);
        if self.inserted.shift_remove(&key).is_none() {
            self.deleted.insert(key, primary_key.to_vec());
        }
        self.maybe_autosave()
    }

    fn maybe_autosave(&mut self) -> Result<()> {
        if self.autosave {
            self.save()?;
        }
        Ok(())
    }

    /// Flushes every buffered insert/delete inside one atomic transaction.
    /// Clears both buffers only on success; on failure the buffers are left
    /// untouched so the caller can retry the same `save()` (spec.md §4.M,
    /// §7).
    #[tracing::instrument(skip(self), fields(record_type = T::record_name(), inserted = self.inserted.len(), deleted = self.deleted.len()))]
    pub fn save(&mut self) -> Result<()> {
        if self.inserted.is_empty() && self.deleted.is_empty() {
            return Ok(());
        }
        let mut ctx = self.store.begin_transaction();
        for record in self.inserted.values() {
            if let Err(e) = self.store.save_in_context(&mut ctx, record) {
                ctx.cancel();
                return Err(e.into());
            }
        }
        for primary_key in self.deleted.values() {
            if let Err(e) = self.store.delete_in_context(&mut ctx, primary_key) {
                ctx.cancel();
                return Err(e.into());
            }
        }
        ctx.commit()?;
        self.inserted.clear();
        self.deleted.clear();
        Ok(())
    }

    /// Discards every buffered operation without touching the store.
    pub fn rollback(&mut self) {
        self.inserted.clear();
        self.deleted.clear();
    }
}
