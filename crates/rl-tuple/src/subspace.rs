// Hierarchical key-prefix subspace, grounded in the same "compact byte
// prefix" idea as the directory layer described in spec.md §6, but scoped
// down to the one operation this crate owns: pack/unpack/range over a fixed
// prefix. Allocating prefixes for logical paths is the directory layer's job
// (out of scope here, per spec.md §1); a `Subspace` just wraps whatever bytes
// the caller already has.

use crate::codec::{decode, encode};
use crate::error::{Error, Result};
use rl_type::TupleValue;

/// A byte prefix defining a contiguous region `[prefix, strinc(prefix))` of
/// the ordered keyspace. Subspaces compose: `sub.child(tuple)` returns a new
/// subspace whose prefix is `sub.pack(tuple)`, so nesting subspaces is just
/// nesting tuples.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subspace {
    prefix: Vec<u8>,
}

impl Subspace {
    /// A subspace rooted at `prefix` with no further structure.
    pub fn from_prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// The empty subspace, covering the entire keyspace.
    pub fn root() -> Self {
        Self { prefix: Vec::new() }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// A subspace nested one level deeper, by appending the encoding of
    /// `tuple` to this subspace's prefix.
    pub fn child(&self, tuple: &[TupleValue]) -> Subspace {
        let mut prefix = self.prefix.clone();
        prefix.extend_from_slice(&encode(tuple));
        Subspace { prefix }
    }

    /// Encodes `tuple` and prepends this subspace's prefix, producing a
    /// physical key.
    pub fn pack(&self, tuple: &[TupleValue]) -> Vec<u8> {
        let mut key = self.prefix.clone();
        key.extend_from_slice(&encode(tuple));
        key
    }

    /// Strips this subspace's prefix from `key` and decodes the remainder as
    /// a tuple. Fails with [`Error::PrefixMismatch`] if `key` does not start
    /// with the prefix.
    pub fn unpack(&self, key: &[u8]) -> Result<Vec<TupleValue>> {
        let rest = key.strip_prefix(self.prefix.as_slice()).ok_or(Error::PrefixMismatch)?;
        decode(rest)
    }

    /// The half-open byte range `[prefix, strinc(prefix))` covering every key
    /// in this subspace.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        (self.prefix.clone(), strinc(&self.prefix))
    }
}

/// The lexicographic successor of a byte string: the smallest byte string
/// that is strictly greater than every string having `bytes` as a prefix.
///
/// Computed by incrementing the last byte that is not `0xFF`, dropping every
/// trailing `0xFF` byte first (since `0xFF` cannot be incremented in place).
/// An all-`0xFF` (or empty) input has no such byte, so the successor is the
/// input with a `0x00` appended, which sorts after every extension of it
/// (there is no byte smaller to append that would still be "after").
pub fn strinc(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    while let Some(&0xff) = out.last() {
        out.pop();
    }
    match out.last_mut() {
        Some(b) => {
            *b += 1;
            out
        }
        None => {
            let mut out = bytes.to_vec();
            out.push(0x00);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strinc_increments_last_byte() {
        assert_eq!(strinc(&[0x01, 0x02]), vec![0x01, 0x03]);
    }

    #[test]
    fn strinc_handles_trailing_0xff() {
        assert_eq!(strinc(&[0x01, 0xff]), vec![0x02]);
        assert_eq!(strinc(&[0xff, 0xff]), vec![0xff, 0xff, 0x00]);
    }

    #[test]
    fn strinc_handles_empty_prefix() {
        assert_eq!(strinc(&[]), vec![0x00]);
    }

    #[test]
    fn pack_unpack_round_trips() {
        let sub = Subspace::from_prefix(vec![0x01, 0x02]);
        let tuple = vec![TupleValue::I64(42), TupleValue::Str("hi".into())];
        let packed = sub.pack(&tuple);
        assert!(packed.starts_with(&[0x01, 0x02]));
        assert_eq!(sub.unpack(&packed).unwrap(), tuple);
    }

    #[test]
    fn unpack_rejects_foreign_prefix() {
        let sub = Subspace::from_prefix(vec![0x01]);
        assert_eq!(sub.unpack(&[0x02, 0x03]), Err(Error::PrefixMismatch));
    }

    #[test]
    fn range_covers_every_key_with_prefix() {
        let sub = Subspace::from_prefix(vec![0x05]);
        let (begin, end) = sub.range();
        assert_eq!(begin, vec![0x05]);
        assert_eq!(end, vec![0x06]);
        let child_key = sub.pack(&[TupleValue::I64(1)]);
        assert!(child_key.as_slice() >= begin.as_slice() && child_key.as_slice() < end.as_slice());
    }

    #[test]
    fn child_nests_prefix() {
        let root = Subspace::root();
        let a = root.child(&[TupleValue::I64(1)]);
        let b = a.child(&[TupleValue::Str("x".into())]);
        assert!(b.prefix().starts_with(a.prefix()));
    }
}
