use crate::error::{Error, Result};
use crate::expr::{KeyExpression, RangeBound};
use rl_type::TupleValue;

/// Traverses a [`KeyExpression`] tree without downcasting (spec.md §9
/// redesign flag: "Visitor-pattern polymorphism"). Each method has a default
/// implementation that falls through to [`Visitor::unsupported`], so a
/// visitor that only cares about, say, `Field` and `Literal` nodes doesn't
/// need to implement the rest.
pub trait Visitor {
    type Output;

    fn visit_field(&mut self, name: &str) -> Result<Self::Output> {
        let _ = name;
        self.unsupported("Field")
    }

    fn visit_concat(&mut self, children: &[KeyExpression]) -> Result<Self::Output> {
        let _ = children;
        self.unsupported("Concat")
    }

    fn visit_nest(&mut self, parent_field: &str, child: &KeyExpression) -> Result<Self::Output> {
        let _ = (parent_field, child);
        self.unsupported("Nest")
    }

    fn visit_literal(&mut self, value: &TupleValue) -> Result<Self::Output> {
        let _ = value;
        self.unsupported("Literal")
    }

    fn visit_empty(&mut self) -> Result<Self::Output> {
        self.unsupported("Empty")
    }

    fn visit_range_boundary(&mut self, field: &str, bound: RangeBound) -> Result<Self::Output> {
        let _ = (field, bound);
        self.unsupported("RangeBoundary")
    }

    fn unsupported(&mut self, variant: &'static str) -> Result<Self::Output> {
        Err(Error::UnsupportedExpression(variant))
    }
}
