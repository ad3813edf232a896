//! Exercises schema evolution validation and the migration manager across
//! two record stores, through the `recordlayer` facade's re-exports.

use recordlayer::{
    add_index_migration, diff, BuildTarget, FieldAccessor, IndexDefinition, IndexKind, KeyExpression,
    MaintainerRegistry, MapAccessor, MemoryKv, MigrationManager, Record, RecordStore, RecordType, SchemaBuilder,
    StoreRegistry, Subspace, Version,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
struct Account {
    id: i64,
}

impl Record for Account {
    fn record_name() -> &'static str {
        "Account"
    }
    fn primary_key_expression() -> KeyExpression {
        KeyExpression::field("id")
    }
    fn index_definitions() -> Vec<IndexDefinition> {
        vec![IndexDefinition::new("by_id", IndexKind::Value, KeyExpression::field("id"), 1)]
    }
    fn accessor(&self) -> Box<dyn FieldAccessor + '_> {
        Box::new(MapAccessor::new().with_field("id", self.id))
    }
}

fn account_schema() -> recordlayer::Schema {
    SchemaBuilder::new(1)
        .add_record_type(RecordType::new("Account", KeyExpression::field("id"), vec![]))
        .unwrap()
        .add_index(IndexDefinition::new("by_id", IndexKind::Value, KeyExpression::field("id"), 1))
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn adding_a_record_type_across_versions_is_a_safe_evolution() {
    let old = account_schema();
    let new = SchemaBuilder::new(2)
        .add_record_type(RecordType::new("Account", KeyExpression::field("id"), vec![]))
        .unwrap()
        .add_index(IndexDefinition::new("by_id", IndexKind::Value, KeyExpression::field("id"), 1))
        .unwrap()
        .add_record_type(RecordType::new("Session", KeyExpression::field("token"), vec![]))
        .unwrap()
        .build()
        .unwrap();

    assert!(diff(&old, &new, false).is_empty());
}

#[test]
fn migrate_to_runs_a_chain_of_index_migrations_and_reaches_the_target_version() {
    let kv = Arc::new(MemoryKv::new());
    let schema = Arc::new(account_schema());
    let store: Arc<dyn BuildTarget> = Arc::new(RecordStore::<Account>::new(
        kv.clone(),
        Subspace::from_prefix(vec![0x40]),
        schema,
        Arc::new(MaintainerRegistry::new()),
    ));
    let registry = StoreRegistry::new().register("accounts", store.clone());

    let manager = MigrationManager::new(kv, Subspace::from_prefix(vec![0x41]))
        .with_registry(registry)
        .with_migrations(vec![
            add_index_migration("m01", Version::ZERO, Version::new(1, 0, 0), "accounts", "by_id"),
            add_index_migration("m12", Version::new(1, 0, 0), Version::new(2, 0, 0), "accounts", "by_id"),
        ]);

    assert_eq!(manager.current_version().unwrap(), Version::ZERO);
    manager.migrate_to(Version::new(2, 0, 0)).unwrap();
    assert_eq!(manager.current_version().unwrap(), Version::new(2, 0, 0));

    // Re-running to the same target is idempotent.
    manager.migrate_to(Version::new(2, 0, 0)).unwrap();
    assert_eq!(manager.current_version().unwrap(), Version::new(2, 0, 0));
}
