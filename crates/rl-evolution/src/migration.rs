use crate::diff::diff;
use crate::error::{Error, Result};
use crate::version::Version;
use rl_kv::Kv;
use rl_store::BuildTarget;
use rl_tuple::Subspace;
use rl_txn::TransactionContext;
use rl_type::TupleValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maps a logical store name to an object-safe handle onto a
/// [`rl_store::RecordStore<T>`] for some `T` the registry doesn't need to
/// know (spec.md §4.L: "a store registry `name -> AnyRecordStore`").
/// Reuses [`BuildTarget`] -- already implemented by every `RecordStore<T>`
/// for the online indexer -- rather than inventing a second type-erased
/// trait with an overlapping shape.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: HashMap<String, Arc<dyn BuildTarget>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, store: Arc<dyn BuildTarget>) -> Self {
        self.stores.insert(name.into(), store);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn BuildTarget>> {
        self.stores.get(name).ok_or_else(|| Error::StoreNotFound(name.to_string()))
    }
}

/// Passed to a [`Migration`]'s closure (spec.md §4.L step 4): gives the
/// migration body `add_index`/`remove_index`/`rebuild_index` over any store
/// in the registry, without exposing the registry's internals.
pub struct MigrationContext<'a> {
    registry: &'a StoreRegistry,
}

impl<'a> MigrationContext<'a> {
    pub fn new(registry: &'a StoreRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StoreRegistry {
        self.registry
    }

    /// `DISABLED -> WRITEONLY` for `index_name` on `store_name` (spec.md
    /// §4.F). Driving the build itself to `READABLE` is the online
    /// indexer's job (`rl-indexer`); a migration that needs the index ready
    /// immediately should invoke the indexer from its own closure body
    /// after calling this.
    pub fn add_index(&self, store_name: &str, index_name: &str) -> Result<()> {
        let store = self.registry.get(store_name)?;
        let mut ctx = store.begin_transaction();
        match store.index_states().enable(&mut ctx, index_name) {
            Ok(()) => {
                ctx.commit()?;
                Ok(())
            }
            Err(e) => {
                ctx.cancel();
                Err(e.into())
            }
        }
    }

    /// Any state `-> DISABLED` for `index_name` on `store_name` (spec.md
    /// §4.F: "Any transition to DISABLED is allowed").
    pub fn remove_index(&self, store_name: &str, index_name: &str) -> Result<()> {
        let store = self.registry.get(store_name)?;
        let mut ctx = store.begin_transaction();
        match store.index_states().disable(&mut ctx, index_name) {
            Ok(()) => {
                ctx.commit()?;
                Ok(())
            }
            Err(e) => {
                ctx.cancel();
                Err(e.into())
            }
        }
    }

    /// Disables then re-enables `index_name`, dropping it back to
    /// `WRITEONLY` so a subsequent online-indexer pass rebuilds its entries
    /// from scratch. Does not clear existing entries itself -- the indexer's
    /// `build_from_scan` path overwrites them idempotently (spec.md §4.G).
    pub fn rebuild_index(&self, store_name: &str, index_name: &str) -> Result<()> {
        self.remove_index(store_name, index_name)?;
        self.add_index(store_name, index_name)
    }
}

type MigrationFn = Box<dyn Fn(&MigrationContext) -> Result<()> + Send + Sync>;

/// One ordered, idempotent step in a migration chain (spec.md §4.L).
pub struct Migration {
    pub id: String,
    pub from_version: Version,
    pub to_version: Version,
    run: MigrationFn,
}

impl Migration {
    pub fn new(
        id: impl Into<String>,
        from_version: Version,
        to_version: Version,
        run: impl Fn(&MigrationContext) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self { id: id.into(), from_version, to_version, run: Box::new(run) }
    }
}

/// A [`Migration`] that only flips one index between `DISABLED` and
/// `WRITEONLY` (spec.md §4.L's "canonical helpers").
pub fn add_index_migration(
    id: impl Into<String>,
    from_version: Version,
    to_version: Version,
    store_name: impl Into<String>,
    index_name: impl Into<String>,
) -> Migration {
    let store_name = store_name.into();
    let index_name = index_name.into();
    Migration::new(id, from_version, to_version, move |ctx| ctx.add_index(&store_name, &index_name))
}

pub fn remove_index_migration(
    id: impl Into<String>,
    from_version: Version,
    to_version: Version,
    store_name: impl Into<String>,
    index_name: impl Into<String>,
) -> Migration {
    let store_name = store_name.into();
    let index_name = index_name.into();
    Migration::new(id, from_version, to_version, move |ctx| ctx.remove_index(&store_name, &index_name))
}

/// Validates `from_schema -> to_schema` through [`crate::diff::diff`] and,
/// only if it finds no [`crate::diff::DiffError`], produces a no-op
/// [`Migration`] recording the version transition (spec.md §4.L: "rejects
/// if any diff error is present"). The schema change itself requires no
/// runtime action -- a record store reads whichever schema its caller
/// constructs it with -- so this migration exists purely to gate
/// `migrate_to`'s version chain on the validator's approval.
pub fn lightweight_migration(
    id: impl Into<String>,
    from_version: Version,
    to_version: Version,
    from_schema: &rl_schema::Schema,
    to_schema: &rl_schema::Schema,
    allow_index_rebuilds: bool,
) -> Result<Migration> {
    let errors = diff(from_schema, to_schema, allow_index_rebuilds);
    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }
    Ok(Migration::new(id, from_version, to_version, |_ctx| Ok(())))
}

const CURRENT_VERSION_KEY: &str = "current_version";
const APPLIED_KEY: &str = "applied";

/// Drives ordered, idempotent migrations across multiple record stores
/// (spec.md §4.L). Persists `current_version` and per-migration `applied`
/// markers at a dedicated subspace (spec.md §6), separate from any single
/// record store's own subspace.
pub struct MigrationManager {
    kv: Arc<dyn Kv>,
    subspace: Subspace,
    migrations: Vec<Migration>,
    registry: StoreRegistry,
    in_progress: AtomicBool,
}

impl MigrationManager {
    pub fn new(kv: Arc<dyn Kv>, subspace: Subspace) -> Self {
        Self { kv, subspace, migrations: Vec::new(), registry: StoreRegistry::new(), in_progress: AtomicBool::new(false) }
    }

    pub fn with_migrations(mut self, migrations: Vec<Migration>) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn with_registry(mut self, registry: StoreRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn current_version_key(&self) -> Vec<u8> {
        self.subspace.pack(&[TupleValue::Str(CURRENT_VERSION_KEY.to_string())])
    }

    fn applied_key(&self, migration_id: &str) -> Vec<u8> {
        self.subspace.pack(&[TupleValue::Str(APPLIED_KEY.to_string()), TupleValue::Str(migration_id.to_string())])
    }

    pub fn current_version(&self) -> Result<Version> {
        let mut ctx = TransactionContext::new(self.kv.begin());
        let version = self.read_current_version(&mut ctx)?;
        ctx.cancel();
        Ok(version)
    }

    fn read_current_version(&self, ctx: &mut TransactionContext) -> Result<Version> {
        match ctx.get(&self.current_version_key())? {
            None => Ok(Version::ZERO),
            Some(bytes) => {
                let tuple = rl_tuple::decode(&bytes)?;
                let mut parts = [0i64; 3];
                for (slot, value) in parts.iter_mut().zip(tuple.iter()) {
                    if let TupleValue::I64(v) = value {
                        *slot = *v;
                    }
                }
                Ok(Version::from_tuple(parts))
            }
        }
    }

    fn is_applied(&self, ctx: &mut TransactionContext, migration_id: &str) -> Result<bool> {
        Ok(ctx.get(&self.applied_key(migration_id))?.is_some())
    }

    /// Greedily builds the chain of configured migrations from `current` to
    /// `target`: at each step, picks the migration whose `from_version`
    /// equals the current position and whose `to_version` makes the most
    /// progress without overshooting `target` (spec.md §4.L step 3). Fails
    /// with [`Error::NoMigrationPath`] if no further progress is possible
    /// before reaching `target`.
    fn build_path(&self, mut current: Version, target: Version) -> Result<Vec<&Migration>> {
        let mut path = Vec::new();
        while current != target {
            let next = self
                .migrations
                .iter()
                .filter(|m| m.from_version == current && m.to_version <= target)
                .max_by_key(|m| m.to_version);
            match next {
                Some(m) => {
                    path.push(m);
                    current = m.to_version;
                }
                None => return Err(Error::NoMigrationPath),
            }
        }
        Ok(path)
    }

    /// Runs every migration needed to reach `target` from the persisted
    /// `current_version`, skipping any already applied, then records
    /// `target` as the new current version (spec.md §4.L). Returns
    /// [`Error::AlreadyInProgress`] if another call is already running
    /// against this manager.
    #[tracing::instrument(skip(self), fields(target = %target))]
    pub fn migrate_to(&self, target: Version) -> Result<()> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInProgress);
        }
        let result = self.migrate_to_locked(target);
        self.in_progress.store(false, Ordering::SeqCst);
        result
    }

    fn migrate_to_locked(&self, target: Version) -> Result<()> {
        let current = self.current_version()?;
        if current == target {
            return Ok(());
        }
        let path = self.build_path(current, target)?;

        for migration in path {
            let mut ctx = TransactionContext::new(self.kv.begin());
            let already = self.is_applied(&mut ctx, &migration.id)?;
            ctx.cancel();
            if already {
                continue;
            }

            let mctx = MigrationContext::new(&self.registry);
            (migration.run)(&mctx)?;

            let mut ctx = TransactionContext::new(self.kv.begin());
            let timestamp_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0);
            let value = rl_tuple::encode(&[TupleValue::I64(timestamp_ms)]);
            ctx.set(&self.applied_key(&migration.id), &value)?;
            ctx.commit()?;
        }

        let mut ctx = TransactionContext::new(self.kv.begin());
        let tuple: Vec<TupleValue> = target.to_tuple().iter().map(|v| TupleValue::I64(*v)).collect();
        ctx.set(&self.current_version_key(), &rl_tuple::encode(&tuple))?;
        ctx.commit()?;
        Ok(())
    }
}
