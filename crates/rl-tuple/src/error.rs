// This file includes ideas from https://github.com/erikgrinaker/toydb (Apache 2 License),
// via reifydb's `base::encoding::keycode`, adapted to a concrete tuple codec
// instead of a generic serde backend.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("unexpected end of tuple input")]
    UnexpectedEof,
    #[error("invalid tag byte {0:#04x}")]
    InvalidTag(u8),
    #[error("invalid escape sequence in encoded bytes/string")]
    InvalidEscape,
    #[error("invalid UTF-8 in encoded string: {0}")]
    InvalidUtf8(String),
    #[error("key does not start with the expected subspace prefix")]
    PrefixMismatch,
    #[error("trailing bytes after decoding tuple")]
    TrailingBytes,
}

pub type Result<T> = std::result::Result<T, Error>;
