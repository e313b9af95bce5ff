//! Module: db::codec
//! Responsibility: order-preserving binary layouts for primary field keys and
//! every index key kind, plus the primary field value codec.
//! Does not own: store access or index maintenance.
//! Boundary: byte order of every encoded key equals its logical order.

mod field_key;
mod hash_key;
mod interval_key;
mod prefix_key;
mod value;


use crate::error::{InternalError, KeyKind};
use thiserror::Error as ThisError;

pub use field_key::{FieldKey, FieldMarker};
pub use hash_key::HashIndexKey;
pub use interval_key::IntervalIndexKey;
pub use prefix_key::PrefixIndexKey;
pub use value::{ValueDecodeError, decode_value, encode_value};

///
/// KeyDecodeError
///

#[derive(Debug, ThisError)]
pub enum KeyDecodeError {
    #[error("invalid length")]
    Length { kind: KeyKind, len: usize },

    #[error("unexpected tag {found:#04x}")]
    Tag { kind: KeyKind, len: usize, found: u8 },

    #[error("missing lexeme terminator")]
    Terminator { len: usize },

    #[error("lexeme is not valid UTF-8")]
    Lexeme { len: usize },

    #[error("unexpected marker flag {found:#04x}")]
    Flag { len: usize, found: u8 },
}

impl KeyDecodeError {
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Length { kind, .. } | Self::Tag { kind, .. } => *kind,
            Self::Terminator { .. } | Self::Lexeme { .. } => KeyKind::Prefix,
            Self::Flag { .. } => KeyKind::Interval,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Length { len, .. }
            | Self::Tag { len, .. }
            | Self::Terminator { len }
            | Self::Lexeme { len }
            | Self::Flag { len, .. } => *len,
        }
    }
}

impl From<KeyDecodeError> for InternalError {
    fn from(err: KeyDecodeError) -> Self {
        Self::malformed_key(err.kind(), err.len(), err.to_string())
    }
}

///
/// KeyPattern
///
/// Byte prefix selecting a contiguous key range: seek to it, then keep
/// reading while keys still match.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPattern {
    prefix: Vec<u8>,
}

impl KeyPattern {
    #[must_use]
    pub const fn new(prefix: Vec<u8>) -> Self {
        Self { prefix }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.prefix
    }

    #[must_use]
    pub fn matches(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }
}

// Big-endian u64 at `offset`; callers check the length first.
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(buf)
}

// Check the leading tag byte and the total length of a tagged index key.
fn check_tagged(
    bytes: &[u8],
    kind: KeyKind,
    tag: u8,
    expected_len: usize,
) -> Result<(), KeyDecodeError> {
    let len = bytes.len();
    match bytes.first() {
        None => Err(KeyDecodeError::Length { kind, len }),
        Some(&found) if found != tag => Err(KeyDecodeError::Tag { kind, len, found }),
        Some(_) if len != expected_len => Err(KeyDecodeError::Length { kind, len }),
        Some(_) => Ok(()),
    }
}
