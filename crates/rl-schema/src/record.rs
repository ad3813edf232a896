use crate::error::{Error, Result};
use crate::index::IndexDefinition;
use rl_expr::{FieldAccessor, KeyExpression};
use rl_type::TupleValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The interface every user record type implements (spec.md §3's "Record").
/// Where a source system would auto-derive this from field annotations
/// (spec.md §9's "dynamic record descriptors"), here it is a concrete trait
/// implementation -- ordinary, explicit Rust code, generated by hand or by
/// a `#[derive]` macro a caller is free to write, but not a requirement of
/// this crate.
///
/// The wire codec is bincode over serde, standing in for the
/// Protobuf-compatible framing spec.md treats as an opaque, out-of-scope
/// codec (§1).
pub trait Record: Serialize + DeserializeOwned + Clone {
    fn record_name() -> &'static str;
    fn primary_key_expression() -> KeyExpression;
    fn index_definitions() -> Vec<IndexDefinition>;
    fn accessor(&self) -> Box<dyn FieldAccessor + '_>;

    /// Evaluates [`Record::primary_key_expression`] against `self`.
    fn primary_key(&self) -> Vec<TupleValue> {
        Self::primary_key_expression().evaluate(self.accessor().as_ref())
    }

    fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::SerializationFailed(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::DeserializationFailed(e.to_string()))
    }
}
