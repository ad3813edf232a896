use rl_type::TupleValue;

/// The keyspace tag that prefixes every physical key under a record store's
/// subspace (spec.md §3's persisted layout, SPEC_FULL.md §2-3 [ADDED]).
/// Each variant becomes the first element packed by
/// [`crate::store::RecordStore`]'s child subspaces, so the layout stays
/// byte-exact by construction rather than by convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum RowKind {
    /// Store-level metadata (not currently populated, reserved per layout).
    StoreInfo = 0,
    /// A record's primary row: `(1, primary_key...) -> encoded record`.
    Record = 1,
    /// Sidecar dense-array payload for vector indexes (spec.md §4.G).
    IndexPrimaryPayload = 2,
    /// An index maintainer's entries: `(3, subspace_key, ...)`.
    IndexEntry = 3,
    /// Index-state manager entries (spec.md §4.F): `(5, index_name) -> state`.
    IndexState = 5,
    /// Online-indexer `RangeSet` entries (spec.md §4.H): `(6, index_name, begin) -> end`.
    IndexRange = 6,
    /// Scratch space a unique-index maintainer uses while resolving a
    /// conflicting owner (spec.md §4.G's `ReplaceOnDuplicate` path).
    UniquenessBuffer = 7,
    /// The online indexer's last-built cursor, persisted so a resumed build
    /// starts from the `RangeSet` frontier rather than the beginning.
    BuildCursor = 9,
}

impl RowKind {
    /// This tag as the first element of a tuple key, per
    /// [`rl_tuple::Subspace::child`]'s "nesting a tuple nests a subspace"
    /// convention.
    pub fn tag(self) -> TupleValue {
        TupleValue::I64(self as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_the_persisted_layout() {
        assert_eq!(RowKind::StoreInfo.tag(), TupleValue::I64(0));
        assert_eq!(RowKind::Record.tag(), TupleValue::I64(1));
        assert_eq!(RowKind::IndexPrimaryPayload.tag(), TupleValue::I64(2));
        assert_eq!(RowKind::IndexEntry.tag(), TupleValue::I64(3));
        assert_eq!(RowKind::IndexState.tag(), TupleValue::I64(5));
        assert_eq!(RowKind::IndexRange.tag(), TupleValue::I64(6));
        assert_eq!(RowKind::UniquenessBuffer.tag(), TupleValue::I64(7));
        assert_eq!(RowKind::BuildCursor.tag(), TupleValue::I64(9));
    }
}
