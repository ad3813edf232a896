// Order-preserving tuple codec.
//
// Grounded in reifydb's `base::encoding::keycode` module (itself adapted
// from toydb), which implements the same byte-level tricks -- sign-bit flip
// for integers, bit-flip-for-negative for floats, a NUL-escaped terminator
// for variable-length byte strings -- as a generic `serde::Serializer`. Here
// the element type is already a closed, concrete enum (`TupleValue`) rather
// than an arbitrary caller type, so the encoder/decoder work directly
// against it instead of going through serde's visitor machinery.
//
// Tag byte layout (chosen so tag order matches `TupleValue`'s `Ord`):
//   0  = nested-list terminator (never a real value)
//   1  = Null
//   2  = Bool
//   3  = I64
//   4  = F64
//   5  = Str
//   6  = Bytes
//   7  = Uuid
//   8  = Timestamp
//   9  = Nested (open marker; closed by tag 0)

use crate::error::{Error, Result};
use rl_type::TupleValue;
use uuid::Uuid;

const TAG_TERM: u8 = 0;
const TAG_NULL: u8 = 1;
const TAG_BOOL: u8 = 2;
const TAG_I64: u8 = 3;
const TAG_F64: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_BYTES: u8 = 6;
const TAG_UUID: u8 = 7;
const TAG_TIMESTAMP: u8 = 8;
const TAG_NESTED: u8 = 9;

/// Encodes a full tuple (a sequence of elements) into an order-preserving
/// byte vector. Concatenation of per-element encodings is what makes the
/// whole tuple order-preserving: two tuples compare equal to their encoded
/// byte strings because each element's encoding is itself order-preserving
/// and self-delimiting.
pub fn encode(tuple: &[TupleValue]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in tuple {
        encode_value(value, &mut out);
    }
    out
}

/// Decodes a byte slice produced by [`encode`] back into a tuple. Decoding
/// is total: every byte produced by `encode` is consumed by some element,
/// and nothing but a well-formed encoding is accepted.
pub fn decode(bytes: &[u8]) -> Result<Vec<TupleValue>> {
    let mut input = bytes;
    let mut out = Vec::new();
    while !input.is_empty() {
        out.push(decode_value(&mut input)?);
    }
    Ok(out)
}

fn encode_value(value: &TupleValue, out: &mut Vec<u8>) {
    match value {
        TupleValue::Null => out.push(TAG_NULL),
        TupleValue::Bool(v) => {
            out.push(TAG_BOOL);
            out.push(if *v { 1 } else { 0 });
        }
        TupleValue::I64(v) => {
            out.push(TAG_I64);
            encode_i64(*v, out);
        }
        TupleValue::F64(v) => {
            out.push(TAG_F64);
            encode_f64(*v, out);
        }
        TupleValue::Str(v) => {
            out.push(TAG_STR);
            encode_escaped_bytes(v.as_bytes(), out);
        }
        TupleValue::Bytes(v) => {
            out.push(TAG_BYTES);
            encode_escaped_bytes(v, out);
        }
        TupleValue::Uuid(v) => {
            out.push(TAG_UUID);
            out.extend_from_slice(v.as_bytes());
        }
        TupleValue::Timestamp(v) => {
            out.push(TAG_TIMESTAMP);
            encode_i64(*v, out);
        }
        TupleValue::Nested(items) => {
            out.push(TAG_NESTED);
            for item in items {
                encode_value(item, out);
            }
            out.push(TAG_TERM);
        }
    }
}

/// Big-endian two's complement with the sign bit flipped, so negative
/// numbers sort before positive ones under plain byte comparison.
fn encode_i64(v: i64, out: &mut Vec<u8>) {
    let mut bytes = v.to_be_bytes();
    bytes[0] ^= 1 << 7;
    out.extend_from_slice(&bytes);
}

/// Big-endian IEEE-754 with the sign bit flipped for non-negative values and
/// every bit flipped for negative ones, placing NaN last (its sign bit is 0
/// for the canonical representation, so it lands among the largest
/// magnitudes after the sign-bit flip).
fn encode_f64(v: f64, out: &mut Vec<u8>) {
    let mut bytes = v.to_be_bytes();
    if v.is_sign_negative() {
        bytes.iter_mut().for_each(|b| *b = !*b);
    } else {
        bytes[0] ^= 1 << 7;
    }
    out.extend_from_slice(&bytes);
}

/// Escapes embedded `0x00` bytes as `0x00 0xff` and terminates with
/// `0x00 0x00`. This is what lets two overlapping byte strings compare
/// correctly: a strict prefix always sorts before its extension, since the
/// prefix's terminator (`0x00 0x00`) is smaller than any continuation byte.
fn encode_escaped_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    for &byte in bytes {
        if byte == 0x00 {
            out.push(0x00);
            out.push(0xff);
        } else {
            out.push(byte);
        }
    }
    out.push(0x00);
    out.push(0x00);
}

fn take<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if input.len() < len {
        return Err(Error::UnexpectedEof);
    }
    let (head, rest) = input.split_at(len);
    *input = rest;
    Ok(head)
}

fn take_one(input: &mut &[u8]) -> Result<u8> {
    Ok(take(input, 1)?[0])
}

fn decode_escaped_bytes(input: &mut &[u8]) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();
    loop {
        match take_one(input)? {
            0x00 => match take_one(input)? {
                0x00 => return Ok(decoded),
                0xff => decoded.push(0x00),
                _ => return Err(Error::InvalidEscape),
            },
            b => decoded.push(b),
        }
    }
}

fn decode_i64(input: &mut &[u8]) -> Result<i64> {
    let mut bytes: [u8; 8] = take(input, 8)?.try_into().expect("exactly 8 bytes");
    bytes[0] ^= 1 << 7;
    Ok(i64::from_be_bytes(bytes))
}

fn decode_f64(input: &mut &[u8]) -> Result<f64> {
    let mut bytes: [u8; 8] = take(input, 8)?.try_into().expect("exactly 8 bytes");
    if bytes[0] >> 7 == 1 {
        bytes[0] ^= 1 << 7;
    } else {
        bytes.iter_mut().for_each(|b| *b = !*b);
    }
    Ok(f64::from_be_bytes(bytes))
}

/// Decodes one element, or `None` if the next byte is the nested-list
/// terminator (only meaningful while decoding the children of a `Nested`
/// value).
fn decode_value_or_term(input: &mut &[u8]) -> Result<Option<TupleValue>> {
    if input.first() == Some(&TAG_TERM) {
        *input = &input[1..];
        return Ok(None);
    }
    decode_value(input).map(Some)
}

fn decode_value(input: &mut &[u8]) -> Result<TupleValue> {
    let tag = take_one(input)?;
    match tag {
        TAG_NULL => Ok(TupleValue::Null),
        TAG_BOOL => match take_one(input)? {
            0 => Ok(TupleValue::Bool(false)),
            1 => Ok(TupleValue::Bool(true)),
            b => Err(Error::InvalidTag(b)),
        },
        TAG_I64 => Ok(TupleValue::I64(decode_i64(input)?)),
        TAG_F64 => Ok(TupleValue::F64(decode_f64(input)?)),
        TAG_STR => {
            let bytes = decode_escaped_bytes(input)?;
            String::from_utf8(bytes).map(TupleValue::Str).map_err(|e| Error::InvalidUtf8(e.to_string()))
        }
        TAG_BYTES => Ok(TupleValue::Bytes(decode_escaped_bytes(input)?)),
        TAG_UUID => {
            let bytes: [u8; 16] = take(input, 16)?.try_into().expect("exactly 16 bytes");
            Ok(TupleValue::Uuid(Uuid::from_bytes(bytes)))
        }
        TAG_TIMESTAMP => Ok(TupleValue::Timestamp(decode_i64(input)?)),
        TAG_NESTED => {
            let mut items = Vec::new();
            while let Some(item) = decode_value_or_term(input)? {
                items.push(item);
            }
            Ok(TupleValue::Nested(items))
        }
        other => Err(Error::InvalidTag(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuple_value_strategy() -> impl Strategy<Value = TupleValue> {
        let leaf = prop_oneof![
            Just(TupleValue::Null),
            any::<bool>().prop_map(TupleValue::Bool),
            any::<i64>().prop_map(TupleValue::I64),
            any::<f64>().prop_filter("no NaN in prop order checks", |f| !f.is_nan())
                .prop_map(TupleValue::F64),
            "[a-z]{0,8}".prop_map(TupleValue::Str),
            proptest::collection::vec(any::<u8>(), 0..8).prop_map(TupleValue::Bytes),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            proptest::collection::vec(inner, 0..4).prop_map(TupleValue::Nested)
        })
    }

    #[test]
    fn round_trips_each_primitive_variant() {
        let values = vec![
            TupleValue::Null,
            TupleValue::Bool(true),
            TupleValue::Bool(false),
            TupleValue::I64(-1),
            TupleValue::I64(i64::MIN),
            TupleValue::I64(i64::MAX),
            TupleValue::F64(-0.5),
            TupleValue::F64(3.25),
            TupleValue::Str("hello\u{0}world".to_string()),
            TupleValue::Bytes(vec![0x00, 0xff, 0x01]),
            TupleValue::Uuid(Uuid::nil()),
            TupleValue::Timestamp(1_700_000_000_000),
            TupleValue::Nested(vec![TupleValue::I64(1), TupleValue::Str("x".into())]),
        ];
        for value in values {
            let tuple = vec![value.clone()];
            let encoded = encode(&tuple);
            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded, tuple, "round trip failed for {value:?}");
        }
    }

    #[test]
    fn origin_morton_like_empty_nested_encodes_to_single_open_close() {
        let tuple = vec![TupleValue::Nested(vec![])];
        let encoded = encode(&tuple);
        assert_eq!(encoded, vec![TAG_NESTED, TAG_TERM]);
        assert_eq!(decode(&encoded).unwrap(), tuple);
    }

    proptest! {
        #[test]
        fn round_trip_prop(tuple in proptest::collection::vec(tuple_value_strategy(), 0..6)) {
            let encoded = encode(&tuple);
            let decoded = decode(&encoded).unwrap();
            prop_assert_eq!(decoded, tuple);
        }

        /// `a <= b` in the `TupleValue` total order iff `encode(a) <= encode(b)`
        /// lexicographically -- the defining property of the codec.
        #[test]
        fn order_preserving_prop(
            a in proptest::collection::vec(tuple_value_strategy(), 1..4),
            b in proptest::collection::vec(tuple_value_strategy(), 1..4),
        ) {
            let value_order = a.cmp(&b);
            let byte_order = encode(&a).cmp(&encode(&b));
            prop_assert_eq!(value_order, byte_order);
        }
    }
}
