use crate::field::FieldDescriptor;
use rl_expr::KeyExpression;

/// A named record type (spec.md §3): its primary-key expression and the
/// fields a record of this type exposes. `RecordType` itself is schema
/// metadata; the bidirectional codec and field access for an actual Rust
/// value live on the user's [`crate::Record`] implementation.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordType {
    name: String,
    primary_key_expression: KeyExpression,
    fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn new(
        name: impl Into<String>,
        primary_key_expression: KeyExpression,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self { name: name.into(), primary_key_expression, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key_expression(&self) -> &KeyExpression {
        &self.primary_key_expression
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
