//! Tagged, order-preserving value type shared across the workspace.
//!
//! [`TupleValue`] plays two roles described in the design: it is the element
//! type of a [tuple](https://en.wikipedia.org/wiki/Tuple) stored in the
//! ordered keyspace, and it is the "typed comparable value" used by the
//! statistics/cost subsystem for histogram bucket bounds. Both need the same
//! thing: a total order where `null` sorts lowest and otherwise-incomparable
//! types are ordered by a fixed tag.

mod value;

pub use value::{TupleValue, ValueType};
