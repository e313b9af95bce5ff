use crate::{
    db::codec::{KeyDecodeError, KeyPattern, read_u64},
    error::KeyKind,
    model::FieldId,
};

///
/// FieldMarker
///
/// `Begin` marks the existence of an object and sorts before every field.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldMarker {
    Begin,
    Field(FieldId),
}

///
/// FieldKey
///
/// Primary data key: `id` (u64 BE) alone for the Begin marker, or followed by
/// the u16 BE field id. All keys of one object are contiguous.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldKey {
    pub id: u64,
    pub marker: FieldMarker,
}

impl FieldKey {
    pub const BEGIN_LEN: usize = 8;
    pub const FIELD_LEN: usize = 10;

    #[must_use]
    pub const fn begin(id: u64) -> Self {
        Self {
            id,
            marker: FieldMarker::Begin,
        }
    }

    #[must_use]
    pub const fn field(id: u64, field: FieldId) -> Self {
        Self {
            id,
            marker: FieldMarker::Field(field),
        }
    }

    #[must_use]
    pub const fn is_begin(&self) -> bool {
        matches!(self.marker, FieldMarker::Begin)
    }

    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::FIELD_LEN);
        buf.extend_from_slice(&self.id.to_be_bytes());
        if let FieldMarker::Field(field) = self.marker {
            buf.extend_from_slice(&field.to_be_bytes());
        }

        buf
    }

    pub fn try_from_raw(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        match bytes.len() {
            Self::BEGIN_LEN => Ok(Self::begin(read_u64(bytes, 0))),
            Self::FIELD_LEN => {
                let field = u16::from_be_bytes([bytes[8], bytes[9]]);
                Ok(Self::field(read_u64(bytes, 0), FieldId(field)))
            }
            len => Err(KeyDecodeError::Length {
                kind: KeyKind::Field,
                len,
            }),
        }
    }

    /// Every key of one object.
    #[must_use]
    pub fn pattern_for_id(id: u64) -> KeyPattern {
        KeyPattern::new(id.to_be_bytes().to_vec())
    }
}
