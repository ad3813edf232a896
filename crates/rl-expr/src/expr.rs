use crate::accessor::FieldAccessor;
use crate::visitor::Visitor;
use rl_type::TupleValue;

/// Which end of a range a [`KeyExpression::RangeBoundary`] node represents.
/// Used by the query planner (`rl-planner`) to materialize a partial key
/// tuple standing in for "smallest possible value of this field" or
/// "largest possible value", without the planner needing to know the
/// field's declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeBound {
    Lower,
    Upper,
}

/// The key-expression tree (spec.md §3, §4.C): an algebraic description of
/// how to extract an ordered list of tuple elements from a record, used for
/// both primary keys and index root expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyExpression {
    /// Extracts a single named field.
    Field(String),
    /// Concatenates the column lists of each child in order.
    Concat(Vec<KeyExpression>),
    /// Descends into the nested record stored at `parent_field` and
    /// evaluates `child` against it.
    Nest { parent_field: String, child: Box<KeyExpression> },
    /// A fixed value, independent of the record.
    Literal(TupleValue),
    /// Contributes no columns.
    Empty,
    /// Stands in for the lower or upper bound of `field` in a planner-built
    /// scan range; evaluates like [`KeyExpression::Field`] when applied to
    /// an actual record (e.g. during a lightweight migration's key
    /// recomputation) but is primarily a planner-side marker.
    RangeBoundary(String, RangeBound),
}

impl KeyExpression {
    pub fn field(name: impl Into<String>) -> Self {
        KeyExpression::Field(name.into())
    }

    pub fn concat(children: impl IntoIterator<Item = KeyExpression>) -> Self {
        KeyExpression::Concat(children.into_iter().collect())
    }

    pub fn nest(parent_field: impl Into<String>, child: KeyExpression) -> Self {
        KeyExpression::Nest { parent_field: parent_field.into(), child: Box::new(child) }
    }

    pub fn literal(value: impl Into<TupleValue>) -> Self {
        KeyExpression::Literal(value.into())
    }

    /// Number of tuple elements this expression contributes, independent of
    /// any particular record (a record missing a field still contributes a
    /// placeholder, per [`KeyExpression::evaluate`]).
    pub fn column_count(&self) -> usize {
        match self {
            KeyExpression::Field(_) => 1,
            KeyExpression::Concat(children) => children.iter().map(KeyExpression::column_count).sum(),
            KeyExpression::Nest { child, .. } => child.column_count(),
            KeyExpression::Literal(_) => 1,
            KeyExpression::Empty => 0,
            KeyExpression::RangeBoundary(_, _) => 1,
        }
    }

    /// Evaluates this expression against a record through `accessor`. A
    /// missing field (or a missing nested accessor) contributes empty
    /// strings rather than shrinking the output, so `evaluate(r).len() ==
    /// self.column_count()` always holds -- callers that build composite
    /// index/primary keys depend on that column-count stability.
    pub fn evaluate(&self, accessor: &dyn FieldAccessor) -> Vec<TupleValue> {
        match self {
            KeyExpression::Field(name) | KeyExpression::RangeBoundary(name, _) => {
                vec![accessor.field(name).unwrap_or_else(|| TupleValue::Str(String::new()))]
            }
            KeyExpression::Concat(children) => {
                children.iter().flat_map(|child| child.evaluate(accessor)).collect()
            }
            KeyExpression::Nest { parent_field, child } => match accessor.nested(parent_field) {
                Some(nested) => child.evaluate(nested.as_ref()),
                None => vec![TupleValue::Str(String::new()); child.column_count()],
            },
            KeyExpression::Literal(value) => vec![value.clone()],
            KeyExpression::Empty => vec![],
        }
    }

    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> crate::Result<V::Output> {
        match self {
            KeyExpression::Field(name) => visitor.visit_field(name),
            KeyExpression::Concat(children) => visitor.visit_concat(children),
            KeyExpression::Nest { parent_field, child } => visitor.visit_nest(parent_field, child),
            KeyExpression::Literal(value) => visitor.visit_literal(value),
            KeyExpression::Empty => visitor.visit_empty(),
            KeyExpression::RangeBoundary(field, bound) => visitor.visit_range_boundary(field, *bound),
        }
    }
}
