// Tagged value and its total order.
//
// `TupleValue` round-trips through the order-preserving codec in `rl-tuple`;
// the ordering defined here is required to agree with that codec's byte
// order (see `rl-tuple`'s `tuple::tests::order_preserving_prop`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// The type tag of a [`TupleValue`], independent of its payload. Used by
/// field descriptors in the schema registry and by index/filter value
/// comparisons that need to reject a mismatched type before touching data.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    I64,
    F64,
    Str,
    Bytes,
    Uuid,
    Timestamp,
    Nested,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Null => f.write_str("NULL"),
            ValueType::Bool => f.write_str("BOOL"),
            ValueType::I64 => f.write_str("I64"),
            ValueType::F64 => f.write_str("F64"),
            ValueType::Str => f.write_str("STR"),
            ValueType::Bytes => f.write_str("BYTES"),
            ValueType::Uuid => f.write_str("UUID"),
            ValueType::Timestamp => f.write_str("TIMESTAMP"),
            ValueType::Nested => f.write_str("NESTED"),
        }
    }
}

/// A single tuple element, and the element type of a [`crate`] histogram
/// bucket bound.
///
/// The variant order below is the tag order used to compare values of
/// different types (`tag_order`, not the declaration order of an unrelated
/// derive) -- `Null` sorts lowest, `Nested` highest, matching the byte order
/// produced by the tuple codec.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TupleValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Nested(Vec<TupleValue>),
}

impl TupleValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TupleValue::Null => ValueType::Null,
            TupleValue::Bool(_) => ValueType::Bool,
            TupleValue::I64(_) => ValueType::I64,
            TupleValue::F64(_) => ValueType::F64,
            TupleValue::Str(_) => ValueType::Str,
            TupleValue::Bytes(_) => ValueType::Bytes,
            TupleValue::Uuid(_) => ValueType::Uuid,
            TupleValue::Timestamp(_) => ValueType::Timestamp,
            TupleValue::Nested(_) => ValueType::Nested,
        }
    }

    fn tag_order(&self) -> u8 {
        match self {
            TupleValue::Null => 0,
            TupleValue::Bool(_) => 1,
            TupleValue::I64(_) => 2,
            TupleValue::F64(_) => 3,
            TupleValue::Str(_) => 4,
            TupleValue::Bytes(_) => 5,
            TupleValue::Uuid(_) => 6,
            TupleValue::Timestamp(_) => 7,
            TupleValue::Nested(_) => 8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TupleValue::Null)
    }
}

impl Display for TupleValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TupleValue::Null => f.write_str("null"),
            TupleValue::Bool(v) => Display::fmt(v, f),
            TupleValue::I64(v) => Display::fmt(v, f),
            TupleValue::F64(v) => Display::fmt(v, f),
            TupleValue::Str(v) => Display::fmt(v, f),
            TupleValue::Bytes(v) => write!(f, "0x{}", hex_encode(v)),
            TupleValue::Uuid(v) => Display::fmt(v, f),
            TupleValue::Timestamp(v) => write!(f, "@{v}"),
            TupleValue::Nested(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(item, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Orders `f64` with NaN sorted last, so that the total order agrees with
/// the codec's bit-flipped IEEE-754 encoding (which places NaN's all-ones
/// pattern after every finite value).
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).expect("non-NaN floats are totally ordered"),
    }
}

impl PartialEq for TupleValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TupleValue {}

impl PartialOrd for TupleValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TupleValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use TupleValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (I64(a), I64(b)) => a.cmp(b),
            (F64(a), F64(b)) => cmp_f64(*a, *b),
            (Str(a), Str(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Nested(a), Nested(b)) => a.cmp(b),
            _ => self.tag_order().cmp(&other.tag_order()),
        }
    }
}

impl From<bool> for TupleValue {
    fn from(v: bool) -> Self {
        TupleValue::Bool(v)
    }
}

impl From<i64> for TupleValue {
    fn from(v: i64) -> Self {
        TupleValue::I64(v)
    }
}

impl From<f64> for TupleValue {
    fn from(v: f64) -> Self {
        TupleValue::F64(v)
    }
}

impl From<&str> for TupleValue {
    fn from(v: &str) -> Self {
        TupleValue::Str(v.to_string())
    }
}

impl From<String> for TupleValue {
    fn from(v: String) -> Self {
        TupleValue::Str(v)
    }
}

impl From<Vec<u8>> for TupleValue {
    fn from(v: Vec<u8>) -> Self {
        TupleValue::Bytes(v)
    }
}

impl From<Uuid> for TupleValue {
    fn from(v: Uuid) -> Self {
        TupleValue::Uuid(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_lowest() {
        assert!(TupleValue::Null < TupleValue::Bool(false));
        assert!(TupleValue::Bool(false) < TupleValue::I64(i64::MIN));
    }

    #[test]
    fn heterogeneous_types_order_by_tag() {
        assert!(TupleValue::I64(i64::MAX) < TupleValue::F64(f64::MIN));
        assert!(TupleValue::F64(f64::MAX) < TupleValue::Str(String::new()));
        assert!(TupleValue::Str("zzzz".into()) < TupleValue::Bytes(vec![]));
    }

    #[test]
    fn nan_sorts_last_among_floats() {
        assert!(TupleValue::F64(f64::MAX) < TupleValue::F64(f64::NAN));
        assert!(TupleValue::F64(f64::NEG_INFINITY) < TupleValue::F64(f64::NAN));
    }

    #[test]
    fn nested_compares_lexicographically_shorter_first() {
        let a = TupleValue::Nested(vec![TupleValue::I64(1)]);
        let b = TupleValue::Nested(vec![TupleValue::I64(1), TupleValue::I64(0)]);
        assert!(a < b);
    }

    #[test]
    fn total_order_is_reflexive_and_antisymmetric() {
        let values = vec![
            TupleValue::Null,
            TupleValue::Bool(true),
            TupleValue::I64(-5),
            TupleValue::F64(3.5),
            TupleValue::Str("hi".into()),
            TupleValue::Bytes(vec![1, 2, 3]),
        ];
        for v in &values {
            assert_eq!(v.cmp(v), Ordering::Equal);
        }
        for i in 0..values.len() {
            for j in 0..values.len() {
                assert_eq!(values[i].cmp(&values[j]).reverse(), values[j].cmp(&values[i]));
            }
        }
    }
}
