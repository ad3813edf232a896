use rl_expr::KeyExpression;
use rl_schema::Schema;
use rl_type::ValueType;
use std::collections::{BTreeSet, HashMap};

/// One category of unsafe or disallowed change between two schema versions
/// (spec.md §4.K).
#[derive(Clone, Debug, PartialEq)]
pub enum DiffError {
    RecordTypeRemoved(String),
    FieldRemoved { record_type: String, field: String },
    FieldTypeChanged { record_type: String, field: String, from: ValueType, to: ValueType },
    PrimaryKeyChanged(String),
    IndexFormatChanged(String),
    IndexRemovedWithoutFormer(String),
    FormerIndexConflict(String),
    FormerIndexRemoved(String),
    IndexSubspaceConflict(String),
}

/// Diffs `old` against `new`, returning every [`DiffError`] found rather
/// than stopping at the first one, so a caller sees every problem in one
/// pass (spec.md §4.K). An empty result means `new` is a safe evolution of
/// `old`.
///
/// `allow_index_rebuilds` controls only [`DiffError::IndexFormatChanged`]:
/// every other category is unconditionally rejected.
pub fn diff(old: &Schema, new: &Schema, allow_index_rebuilds: bool) -> Vec<DiffError> {
    let mut errors = Vec::new();

    check_record_types(old, new, &mut errors);
    check_former_indexes(old, new, &mut errors);
    check_live_indexes(old, new, allow_index_rebuilds, &mut errors);
    check_subspace_collisions(new, &mut errors);

    errors
}

fn check_record_types(old: &Schema, new: &Schema, errors: &mut Vec<DiffError>) {
    for old_rt in old.record_types() {
        let Ok(new_rt) = new.record_type(old_rt.name()) else {
            errors.push(DiffError::RecordTypeRemoved(old_rt.name().to_string()));
            continue;
        };

        for field in old_rt.fields() {
            match new_rt.field(&field.name) {
                None => errors.push(DiffError::FieldRemoved {
                    record_type: old_rt.name().to_string(),
                    field: field.name.clone(),
                }),
                Some(new_field) if new_field.value_type != field.value_type => {
                    errors.push(DiffError::FieldTypeChanged {
                        record_type: old_rt.name().to_string(),
                        field: field.name.clone(),
                        from: field.value_type,
                        to: new_field.value_type,
                    });
                }
                Some(_) => {}
            }
        }

        let old_pk_fields = field_names(old_rt.primary_key_expression());
        let new_pk_fields = field_names(new_rt.primary_key_expression());
        if old_pk_fields != new_pk_fields {
            errors.push(DiffError::PrimaryKeyChanged(old_rt.name().to_string()));
        }
    }
}

fn check_former_indexes(old: &Schema, new: &Schema, errors: &mut Vec<DiffError>) {
    for former in old.former_indexes() {
        match new.former_indexes().iter().find(|f| f.name() == former.name()) {
            None => errors.push(DiffError::FormerIndexRemoved(former.name().to_string())),
            Some(new_former) => {
                if new_former.added_version() != former.added_version()
                    || new_former.removed_version() != former.removed_version()
                {
                    errors.push(DiffError::FormerIndexConflict(former.name().to_string()));
                }
            }
        }
    }

    for index in new.indexes() {
        if new.is_former_index_name(index.name()) {
            errors.push(DiffError::FormerIndexConflict(index.name().to_string()));
        }
    }
}

fn check_live_indexes(old: &Schema, new: &Schema, allow_index_rebuilds: bool, errors: &mut Vec<DiffError>) {
    for old_index in old.indexes() {
        match new.index(old_index.name()) {
            Err(_) => {
                if !new.former_indexes().iter().any(|f| f.name() == old_index.name()) {
                    errors.push(DiffError::IndexRemovedWithoutFormer(old_index.name().to_string()));
                }
            }
            Ok(new_index) => {
                let reshaped = old_index.kind() != new_index.kind()
                    || old_index.root_expression() != new_index.root_expression()
                    || old_index.subspace_key() != new_index.subspace_key();
                if reshaped && !allow_index_rebuilds {
                    errors.push(DiffError::IndexFormatChanged(old_index.name().to_string()));
                }
            }
        }
    }
}

/// Two live indexes sharing a `subspace_key` would shadow each other's
/// physical entries (spec.md §3 keyspace `3` is keyed by `subspace_key`
/// first), so this is a structural defect in the *new* schema regardless of
/// what the old schema looked like.
fn check_subspace_collisions(new: &Schema, errors: &mut Vec<DiffError>) {
    let mut seen: HashMap<u16, &str> = HashMap::new();
    for index in new.indexes() {
        if let Some(&other) = seen.get(&index.subspace_key()) {
            errors.push(DiffError::IndexSubspaceConflict(format!("{other} and {}", index.name())));
        } else {
            seen.insert(index.subspace_key(), index.name());
        }
    }
}

/// The set of field names an expression reads from a record, used to
/// compare primary-key shapes across schema versions without caring about
/// node order within a `Concat` (spec.md §4.K: "checked by extracting
/// field-name sets").
fn field_names(expr: &KeyExpression) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_field_names(expr, &mut names);
    names
}

fn collect_field_names(expr: &KeyExpression, out: &mut BTreeSet<String>) {
    match expr {
        KeyExpression::Field(name) | KeyExpression::RangeBoundary(name, _) => {
            out.insert(name.clone());
        }
        KeyExpression::Concat(children) => {
            for child in children {
                collect_field_names(child, out);
            }
        }
        KeyExpression::Nest { parent_field, child } => {
            out.insert(parent_field.clone());
            collect_field_names(child, out);
        }
        KeyExpression::Literal(_) | KeyExpression::Empty => {}
    }
}
