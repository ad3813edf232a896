//! Schema registry (spec.md §4.B): record-type descriptors, index
//! definitions, former indexes, and immutable versioned schemas.

mod error;
mod field;
mod index;
mod record;
mod record_type;
mod schema;

pub use error::{Error, Result};
pub use field::FieldDescriptor;
pub use index::{FormerIndex, IndexDefinition, IndexKind, IndexOptions, VectorStrategy};
pub use record::Record;
pub use record_type::RecordType;
pub use schema::{concat_fields, Schema, SchemaBuilder};
