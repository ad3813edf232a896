use crate::error::{Error, Result};
use crate::index::{FormerIndex, IndexDefinition};
use crate::record_type::RecordType;
use indexmap::IndexMap;
use rl_expr::KeyExpression;

/// An immutable, versioned set of record types and indexes (spec.md §3).
/// Built exclusively through [`SchemaBuilder`]; once built, a `Schema`
/// cannot be mutated -- evolving it means building a new `Schema` at a new
/// version, validated by `rl-evolution`.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    version: u64,
    record_types: IndexMap<String, RecordType>,
    indexes: IndexMap<String, IndexDefinition>,
    former_indexes: Vec<FormerIndex>,
}

impl Schema {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn record_type(&self, name: &str) -> Result<&RecordType> {
        self.record_types.get(name).ok_or_else(|| Error::RecordTypeNotFound(name.to_string()))
    }

    pub fn index(&self, name: &str) -> Result<&IndexDefinition> {
        self.indexes.get(name).ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    pub fn record_types(&self) -> impl Iterator<Item = &RecordType> {
        self.record_types.values()
    }

    pub fn indexes(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indexes.values()
    }

    pub fn former_indexes(&self) -> &[FormerIndex] {
        &self.former_indexes
    }

    /// Indexes applicable to `record_type_name`: universal indexes plus
    /// those that explicitly list it.
    pub fn indexes_for_record_type(&self, record_type_name: &str) -> Vec<&IndexDefinition> {
        self.indexes.values().filter(|idx| idx.applies_to(record_type_name)).collect()
    }

    /// The inverse of [`Schema::indexes_for_record_type`]: every record type
    /// `index_name` applies to.
    pub fn record_types_for_index(&self, index_name: &str) -> Result<Vec<&RecordType>> {
        let index = self.index(index_name)?;
        Ok(self
            .record_types
            .values()
            .filter(|rt| index.applies_to(rt.name()))
            .collect())
    }

    /// Walks `record_type`'s primary-key expression tree, summing
    /// `column_count` across every node.
    pub fn primary_key_field_count(&self, record_type_name: &str) -> Result<usize> {
        Ok(self.record_type(record_type_name)?.primary_key_expression().column_count())
    }

    /// Whether `name` is reserved by a former index, i.e. cannot be reused
    /// by a live index in any schema version.
    pub fn is_former_index_name(&self, name: &str) -> bool {
        self.former_indexes.iter().any(|f| f.name() == name)
    }
}

/// Builds an immutable [`Schema`]. Collisions between record-type names,
/// index names, or an index name colliding with a former index all fail at
/// `build` time with [`Error::DuplicateName`], so a caller sees every
/// problem rather than the first one encountered while adding entries.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    version: u64,
    record_types: IndexMap<String, RecordType>,
    indexes: IndexMap<String, IndexDefinition>,
    former_indexes: Vec<FormerIndex>,
}

impl SchemaBuilder {
    pub fn new(version: u64) -> Self {
        Self { version, ..Self::default() }
    }

    pub fn add_record_type(mut self, record_type: RecordType) -> Result<Self> {
        if self.record_types.contains_key(record_type.name()) {
            return Err(Error::DuplicateName(record_type.name().to_string()));
        }
        self.record_types.insert(record_type.name().to_string(), record_type);
        Ok(self)
    }

    pub fn add_index(mut self, index: IndexDefinition) -> Result<Self> {
        if self.indexes.contains_key(index.name()) {
            return Err(Error::DuplicateName(index.name().to_string()));
        }
        if self.former_indexes.iter().any(|f| f.name() == index.name()) {
            return Err(Error::DuplicateName(index.name().to_string()));
        }
        self.indexes.insert(index.name().to_string(), index);
        Ok(self)
    }

    pub fn add_former_index(mut self, former: FormerIndex) -> Result<Self> {
        if self.indexes.contains_key(former.name()) || self.former_indexes.iter().any(|f| f.name() == former.name())
        {
            return Err(Error::DuplicateName(former.name().to_string()));
        }
        self.former_indexes.push(former);
        Ok(self)
    }

    /// Starts a new builder seeded from an existing schema's contents
    /// (`former_indexes` carried forward unconditionally, satisfying the
    /// append-only invariant in spec.md §3 #6), for constructing the next
    /// schema version during migration.
    pub fn from_schema(schema: &Schema, new_version: u64) -> Self {
        Self {
            version: new_version,
            record_types: schema.record_types.clone(),
            indexes: schema.indexes.clone(),
            former_indexes: schema.former_indexes.clone(),
        }
    }

    pub fn build(self) -> Result<Schema> {
        Ok(Schema {
            version: self.version,
            record_types: self.record_types,
            indexes: self.indexes,
            former_indexes: self.former_indexes,
        })
    }
}

/// Convenience used by callers that want a primary key expression spanning
/// several fields without importing `rl_expr` directly.
pub fn concat_fields(names: impl IntoIterator<Item = &'static str>) -> KeyExpression {
    KeyExpression::concat(names.into_iter().map(KeyExpression::field))
}
