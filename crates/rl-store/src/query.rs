use crate::error::Result;
use crate::store::RecordStore;
use rl_planner::{Filter, Query, SortKey};
use rl_schema::Record;

/// Filter/sort/limit chaining over a [`RecordStore`] (spec.md §4.E
/// `query()`); `.execute()` runs the built query through the planner
/// (spec.md §4.I).
pub struct QueryBuilder<'a, T: Record> {
    store: &'a RecordStore<T>,
    filter: Option<Filter>,
    sort: Vec<SortKey>,
    limit: Option<usize>,
}

impl<'a, T: Record> QueryBuilder<'a, T> {
    pub(crate) fn new(store: &'a RecordStore<T>) -> Self {
        Self { store, filter: None, sort: Vec::new(), limit: None }
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

    pub fn execute(self) -> Result<Vec<T>> {
        let query = Query {
            record_type: T::record_name().to_string(),
            filter: self.filter,
            sort: self.sort,
            limit: self.limit,
        };
        self.store.execute_query(&query)
    }
}
