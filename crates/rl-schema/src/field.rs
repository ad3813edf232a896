use rl_type::ValueType;

/// One field of a [`crate::RecordType`]: its name and declared type.
///
/// `nested_record_type` names the record type describing the shape of a
/// `Nested` field, so [`crate::KeyExpression::Nest`] and the statistics
/// manager's histograms can resolve a nested field path without the
/// field's Rust type leaking into the schema registry.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub nested_record_type: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self { name: name.into(), value_type, nested_record_type: None }
    }

    pub fn nested(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Nested,
            nested_record_type: Some(record_type.into()),
        }
    }
}
