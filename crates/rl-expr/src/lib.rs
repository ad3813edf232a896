//! Key expressions (spec.md §4.C): an algebraic tree of field-extraction
//! operations evaluated against a record, plus a visitor abstraction for
//! traversing the tree without downcasting.

mod accessor;
mod error;
mod expr;
mod visitor;

pub use accessor::{FieldAccessor, MapAccessor};
pub use error::{Error, Result};
pub use expr::{KeyExpression, RangeBound};
pub use visitor::Visitor;
