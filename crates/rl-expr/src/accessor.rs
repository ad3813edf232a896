use rl_type::TupleValue;

/// What a [`crate::KeyExpression`] evaluates against: something that can
/// answer "what is field `name`" and "what is the nested record under field
/// `name`". Record descriptors (`rl-schema`) implement this over their
/// concrete Rust struct; it is the seam that lets key expressions stay
/// generic over the user's record type without downcasting.
pub trait FieldAccessor {
    /// The value of a top-level field, or `None` if the record has no such
    /// field (e.g. an optional field left unset).
    fn field(&self, name: &str) -> Option<TupleValue>;

    /// A sub-accessor for the nested record stored under field `name`, or
    /// `None` if absent. Used by [`crate::KeyExpression::Nest`].
    fn nested(&self, name: &str) -> Option<Box<dyn FieldAccessor + '_>>;
}

/// A [`FieldAccessor`] backed by a flat name -> value map, useful for tests
/// and for records whose nesting is shallow enough to flatten by hand.
#[derive(Clone, Debug, Default)]
pub struct MapAccessor {
    fields: std::collections::HashMap<String, TupleValue>,
    nested: std::collections::HashMap<String, MapAccessor>,
}

impl MapAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<TupleValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_nested(mut self, name: impl Into<String>, nested: MapAccessor) -> Self {
        self.nested.insert(name.into(), nested);
        self
    }
}

impl FieldAccessor for MapAccessor {
    fn field(&self, name: &str) -> Option<TupleValue> {
        self.fields.get(name).cloned()
    }

    fn nested(&self, name: &str) -> Option<Box<dyn FieldAccessor + '_>> {
        self.nested.get(name).map(|a| Box::new(a.clone()) as Box<dyn FieldAccessor>)
    }
}
