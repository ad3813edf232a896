//! Exercises the record store, a unique value index, and the query planner
//! through nothing but the `recordlayer` facade's re-exports.

use recordlayer::{
    Comparison, Filter, FieldAccessor, IndexDefinition, IndexKind, IndexOptions, KeyExpression, MaintainerRegistry,
    MapAccessor, MemoryKv, Record, RecordStore, RecordType, Schema, SchemaBuilder, Subspace, TupleValue,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
struct User {
    user_id: i64,
    email: String,
}

impl Record for User {
    fn record_name() -> &'static str {
        "User"
    }

    fn primary_key_expression() -> KeyExpression {
        KeyExpression::field("user_id")
    }

    fn index_definitions() -> Vec<IndexDefinition> {
        vec![IndexDefinition::new("by_email", IndexKind::Value, KeyExpression::field("email"), 1)
            .with_options(IndexOptions::unique())]
    }

    fn accessor(&self) -> Box<dyn FieldAccessor + '_> {
        Box::new(MapAccessor::new().with_field("user_id", self.user_id).with_field("email", self.email.clone()))
    }
}

fn schema() -> Schema {
    SchemaBuilder::new(1)
        .add_record_type(RecordType::new(
            "User",
            KeyExpression::field("user_id"),
            vec![
                recordlayer::FieldDescriptor::new("user_id", recordlayer::ValueType::I64),
                recordlayer::FieldDescriptor::new("email", recordlayer::ValueType::Str),
            ],
        ))
        .unwrap()
        .add_index(User::index_definitions().remove(0))
        .unwrap()
        .build()
        .unwrap()
}

fn store() -> RecordStore<User> {
    RecordStore::new(
        Arc::new(MemoryKv::new()),
        Subspace::from_prefix(vec![0x10]),
        Arc::new(schema()),
        Arc::new(recordlayer::default_registry()),
    )
}

#[test]
fn save_fetch_and_delete_round_trip() {
    let store = store();
    let alice = User { user_id: 1, email: "alice@example.com".into() };
    store.save(&alice).unwrap();

    assert_eq!(store.fetch(&[TupleValue::I64(1)]).unwrap(), Some(alice.clone()));
    assert!(store.delete(&[TupleValue::I64(1)]).unwrap());
    assert_eq!(store.fetch(&[TupleValue::I64(1)]).unwrap(), None);
}

#[test]
fn a_unique_index_rejects_a_second_record_with_the_same_key() {
    let store = store();
    store.save(&User { user_id: 1, email: "alice@example.com".into() }).unwrap();
    let conflict = store.save(&User { user_id: 2, email: "alice@example.com".into() });
    assert!(conflict.is_err());
}

#[test]
fn query_by_indexed_field_finds_the_matching_record() {
    let store = store();
    store.save(&User { user_id: 1, email: "alice@example.com".into() }).unwrap();
    store.save(&User { user_id: 2, email: "bob@example.com".into() }).unwrap();

    let found = store
        .query()
        .filter(Filter::field("email", Comparison::Eq(TupleValue::Str("bob@example.com".into()))))
        .execute()
        .unwrap();

    assert_eq!(found, vec![User { user_id: 2, email: "bob@example.com".into() }]);
}

#[test]
fn scan_returns_every_record_regardless_of_index_state() {
    let store = store();
    for i in 0..5 {
        store.save(&User { user_id: i, email: format!("user{i}@example.com") }).unwrap();
    }
    let all: Result<Vec<_>, _> = store.scan().collect();
    assert_eq!(all.unwrap().len(), 5);
}
