use rl_type::TupleValue;

/// A comparison operator between a named field and one or more values
/// (spec.md §4.I Query AST).
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison {
    Eq(TupleValue),
    Lt(TupleValue),
    Le(TupleValue),
    Gt(TupleValue),
    Ge(TupleValue),
    StartsWith(String),
    Contains(TupleValue),
    In(Vec<TupleValue>),
}

/// The filter half of the query AST: a boolean tree over field comparisons.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Field { name: String, comparison: Comparison },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Always true -- the identity of `And` and the result of constant
    /// folding away a trivially-true predicate.
    True,
    /// Always false -- the identity of `Or` and the result of constant
    /// folding away a trivially-false predicate (e.g. an empty `In` list).
    False,
}

impl Filter {
    pub fn field(name: impl Into<String>, comparison: Comparison) -> Self {
        Filter::Field { name: name.into(), comparison }
    }

    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(children.into_iter().collect())
    }

    pub fn not(inner: Filter) -> Self {
        Filter::Not(Box::new(inner))
    }

    /// Evaluates this filter against a single field lookup function, used
    /// both by the reference full-scan executor and by unit tests that
    /// don't want to build a full accessor.
    pub fn matches(&self, field: &dyn Fn(&str) -> Option<TupleValue>) -> bool {
        match self {
            Filter::True => true,
            Filter::False => false,
            Filter::Not(inner) => !inner.matches(field),
            Filter::And(children) => children.iter().all(|c| c.matches(field)),
            Filter::Or(children) => children.iter().any(|c| c.matches(field)),
            Filter::Field { name, comparison } => {
                let Some(value) = field(name) else { return false };
                match comparison {
                    Comparison::Eq(v) => &value == v,
                    Comparison::Lt(v) => &value < v,
                    Comparison::Le(v) => &value <= v,
                    Comparison::Gt(v) => &value > v,
                    Comparison::Ge(v) => &value >= v,
                    Comparison::In(vs) => vs.contains(&value),
                    Comparison::StartsWith(prefix) => match &value {
                        TupleValue::Str(s) => s.starts_with(prefix.as_str()),
                        _ => false,
                    },
                    Comparison::Contains(needle) => match (&value, needle) {
                        (TupleValue::Str(s), TupleValue::Str(n)) => s.contains(n.as_str()),
                        _ => false,
                    },
                }
            }
        }
    }
}

/// A sort key: a field name (evaluated against the record's flat field
/// space) and its direction.
#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

/// A complete query: filter, sort order, and an optional row limit
/// (spec.md §4.I).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Query {
    pub record_type: String,
    pub filter: Option<Filter>,
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self { record_type: record_type.into(), filter: None, sort: Vec::new(), limit: None }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort.push(SortKey { field: field.into(), ascending });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}
