use crate::options::BuildOptions;
use crate::range_set::RangeSet;
use rl_store::{BuildTarget, IndexState, Result, RowKind};
use std::sync::Arc;
use std::time::Duration;

/// Summary of one [`IndexBuilder::build`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    pub records_processed: usize,
    pub readable: bool,
}

/// Drives one index from `DISABLED` through `WRITEONLY`/`BUILDING` to
/// `READABLE` (spec.md §4.H), across every [`BuildTarget`] (one per
/// applicable record type) supplied to [`IndexBuilder::build`].
///
/// Each target tracks its own index state and its own [`RangeSet`] progress
/// at its own subspace's keyspace `6` -- this crate follows the same
/// per-store scoping `rl_store::IndexStateManager` already uses, rather than
/// inventing a separate cross-type coordination layer.
pub struct IndexBuilder {
    options: BuildOptions,
}

impl IndexBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, index_name: &str, targets: &[Arc<dyn BuildTarget>]) -> Result<BuildOutcome> {
        let mut records_processed = 0;
        for target in targets {
            if !target.index_applies(index_name)? {
                continue;
            }
            records_processed += self.build_one_target(index_name, target.as_ref())?;
        }
        Ok(BuildOutcome { records_processed, readable: true })
    }

    /// Runs the full build loop for one target (spec.md §4.H steps 1-4):
    /// enable, mark building, walk the primary-key range via the
    /// `RangeSet` frontier until covered, then promote to readable.
    /// Resumable: re-invoking on a target whose `RangeSet` already covers
    /// part of the keyspace (from a prior, interrupted run) skips straight
    /// to the remaining gap.
    fn build_one_target(&self, index_name: &str, target: &dyn BuildTarget) -> Result<usize> {
        let range_set = RangeSet::new(target.subspace().child(&[RowKind::IndexRange.tag()]));
        let states = target.index_states();

        {
            let mut ctx = target.begin_transaction();
            if states.get(&mut ctx, index_name)? == IndexState::Disabled {
                states.enable(&mut ctx, index_name)?;
            }
            ctx.commit()?;
        }
        {
            let mut ctx = target.begin_transaction();
            states.mark_building(&mut ctx, index_name)?;
            ctx.commit()?;
        }

        let (keyspace_begin, keyspace_end) = target.record_key_range();
        let mut processed = 0;
        loop {
            let cursor = {
                let mut ctx = target.begin_transaction();
                let next = range_set.next_uncovered(&mut ctx, index_name, &keyspace_begin, &keyspace_end)?;
                ctx.cancel();
                next
            };
            let Some(cursor) = cursor else { break };

            let (n, resume) = target.build_index_batch(index_name, &cursor, &keyspace_end, self.options.batch_size)?;
            processed += n;
            // The built span is [cursor, resume) when more remains, or
            // [cursor, keyspace_end) when this batch exhausted the target's
            // whole remaining range -- an empty tail still counts as built,
            // so a re-run never rescans it.
            let built_end = resume.clone().unwrap_or_else(|| keyspace_end.clone());
            {
                let mut ctx = target.begin_transaction();
                range_set.insert(&mut ctx, index_name, &cursor, &built_end)?;
                ctx.commit()?;
            }
            if resume.is_none() {
                break;
            }
            if self.options.throttle_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.options.throttle_delay_ms));
            }
        }

        {
            let mut ctx = target.begin_transaction();
            states.make_readable(&mut ctx, index_name)?;
            ctx.commit()?;
        }
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_expr::{FieldAccessor, KeyExpression, MapAccessor};
    use rl_kv::MemoryKv;
    use rl_schema::{IndexDefinition, IndexKind, Record, RecordType, Schema, SchemaBuilder};
    use rl_store::{IndexMaintainer, MaintainerRegistry, RecordStore};
    use rl_tuple::Subspace;
    use rl_txn::TransactionContext;
    use rl_type::TupleValue;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Item {
        id: i64,
        category: String,
    }

    impl Record for Item {
        fn record_name() -> &'static str {
            "Item"
        }
        fn primary_key_expression() -> KeyExpression {
            KeyExpression::field("id")
        }
        fn index_definitions() -> Vec<IndexDefinition> {
            vec![IndexDefinition::new("by_category", IndexKind::Value, KeyExpression::field("category"), 1)]
        }
        fn accessor(&self) -> Box<dyn FieldAccessor + '_> {
            Box::new(MapAccessor::new().with_field("id", self.id).with_field("category", self.category.clone()))
        }
    }

    #[derive(Default)]
    struct CountingMaintainer {
        builds: AtomicUsize,
    }

    impl IndexMaintainer for CountingMaintainer {
        fn apply_insert(
            &self,
            _ctx: &mut TransactionContext,
            _index: &IndexDefinition,
            _index_subspace: &Subspace,
            _key_values: &[TupleValue],
            _primary_key: &[TupleValue],
        ) -> Result<Option<Vec<TupleValue>>> {
            Ok(None)
        }
        fn apply_update(
            &self,
            _ctx: &mut TransactionContext,
            _index: &IndexDefinition,
            _index_subspace: &Subspace,
            _old_key_values: &[TupleValue],
            _new_key_values: &[TupleValue],
            _primary_key: &[TupleValue],
        ) -> Result<Option<Vec<TupleValue>>> {
            Ok(None)
        }
        fn apply_delete(
            &self,
            _ctx: &mut TransactionContext,
            _index: &IndexDefinition,
            _index_subspace: &Subspace,
            _key_values: &[TupleValue],
            _primary_key: &[TupleValue],
        ) -> Result<()> {
            Ok(())
        }
        fn build_from_scan(
            &self,
            ctx: &mut TransactionContext,
            _index: &IndexDefinition,
            index_subspace: &Subspace,
            key_values: &[TupleValue],
            primary_key: &[TupleValue],
        ) -> Result<()> {
            self.builds.fetch_add(1, AtomicOrdering::SeqCst);
            let mut entry = key_values.to_vec();
            entry.extend_from_slice(primary_key);
            ctx.set(&index_subspace.pack(&entry), &[])?;
            Ok(())
        }
    }

    fn schema() -> Arc<Schema> {
        Arc::new(
            SchemaBuilder::new(1)
                .add_record_type(RecordType::new("Item", KeyExpression::field("id"), vec![]))
                .unwrap()
                .add_index(IndexDefinition::new("by_category", IndexKind::Value, KeyExpression::field("category"), 1))
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    fn seeded_store(maintainer: Arc<CountingMaintainer>, n: i64) -> Arc<RecordStore<Item>> {
        let registry = Arc::new(MaintainerRegistry::new().register(IndexKind::Value, maintainer));
        let kv = Arc::new(MemoryKv::new());
        let store = RecordStore::<Item>::new(kv, Subspace::from_prefix(vec![0x20]), schema(), registry);
        for id in 0..n {
            store.save(&Item { id, category: "a".to_string() }).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn build_drives_the_index_all_the_way_to_readable() {
        let maintainer = Arc::new(CountingMaintainer::default());
        let store = seeded_store(maintainer.clone(), 7);
        let targets: Vec<Arc<dyn BuildTarget>> = vec![store.clone()];
        let builder = IndexBuilder::new(BuildOptions { batch_size: 3, ..BuildOptions::default() });

        let outcome = builder.build("by_category", &targets).unwrap();
        assert!(outcome.readable);
        assert_eq!(outcome.records_processed, 7);
        assert_eq!(maintainer.builds.load(AtomicOrdering::SeqCst), 7);
    }

    #[test]
    fn build_transitions_index_state_to_readable() {
        let maintainer = Arc::new(CountingMaintainer::default());
        let store = seeded_store(maintainer, 2);
        let targets: Vec<Arc<dyn BuildTarget>> = vec![store.clone()];
        let builder = IndexBuilder::new(BuildOptions::default());
        builder.build("by_category", &targets).unwrap();

        let states = store.index_states();
        let state = {
            let mut probe = (*store).begin_transaction();
            let s = states.get(&mut probe, "by_category").unwrap();
            probe.cancel();
            s
        };
        assert_eq!(state, IndexState::Readable);
    }

    #[test]
    fn build_is_idempotent_when_re_run_after_completion() {
        let maintainer = Arc::new(CountingMaintainer::default());
        let store = seeded_store(maintainer.clone(), 5);
        let targets: Vec<Arc<dyn BuildTarget>> = vec![store.clone()];
        let builder = IndexBuilder::new(BuildOptions { batch_size: 2, ..BuildOptions::default() });

        builder.build("by_category", &targets).unwrap();
        assert_eq!(maintainer.builds.load(AtomicOrdering::SeqCst), 5);

        // Re-running after the RangeSet already covers the keyspace should
        // not invoke build_from_scan again: enable() would error on a
        // non-Disabled state if the resume guard were missing.
        let outcome = builder.build("by_category", &targets).unwrap();
        assert_eq!(outcome.records_processed, 0);
        assert_eq!(maintainer.builds.load(AtomicOrdering::SeqCst), 5);
    }

    #[test]
    fn build_skips_targets_the_index_does_not_apply_to() {
        let schema = Arc::new(
            SchemaBuilder::new(1)
                .add_record_type(RecordType::new("Item", KeyExpression::field("id"), vec![]))
                .unwrap()
                .add_index(
                    IndexDefinition::new("by_category", IndexKind::Value, KeyExpression::field("category"), 1)
                        .with_applicable_record_types(vec!["OtherType".to_string()]),
                )
                .unwrap()
                .build()
                .unwrap(),
        );
        let maintainer = Arc::new(CountingMaintainer::default());
        let registry = Arc::new(MaintainerRegistry::new().register(IndexKind::Value, maintainer.clone()));
        let store = Arc::new(RecordStore::<Item>::new(
            Arc::new(MemoryKv::new()),
            Subspace::from_prefix(vec![0x21]),
            schema,
            registry,
        ));
        store.save(&Item { id: 1, category: "a".to_string() }).unwrap();
        let targets: Vec<Arc<dyn BuildTarget>> = vec![store];
        let builder = IndexBuilder::new(BuildOptions::default());

        let outcome = builder.build("by_category", &targets).unwrap();
        assert_eq!(outcome.records_processed, 0);
        assert_eq!(maintainer.builds.load(AtomicOrdering::SeqCst), 0);
    }
}
