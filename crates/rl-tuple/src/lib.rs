//! Order-preserving tuple codec and hierarchical key-prefix subspaces.
//!
//! This crate implements component A of the record layer: encoding
//! heterogeneous [`rl_type::TupleValue`] tuples into bytes such that
//! lexicographic byte order equals the tuples' natural order, and
//! [`Subspace`], a composable byte-prefix abstraction used to carve the flat
//! KV keyspace into per-record-store, per-keyspace-tag regions.

mod codec;
mod error;
mod subspace;

pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use subspace::{strinc, Subspace};
