use crate::{
    db::codec::{KeyDecodeError, KeyPattern, check_tagged, read_u64},
    error::KeyKind,
};

///
/// HashIndexKey
///
/// Tag, one u64 BE hash per indexed field (declaration order), then the
/// u64 BE object id. The value is empty.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HashIndexKey {
    pub hashes: Vec<u64>,
    pub id: u64,
}

impl HashIndexKey {
    pub const TAG: u8 = 0x01;

    #[must_use]
    pub const fn new(hashes: Vec<u64>, id: u64) -> Self {
        Self { hashes, id }
    }

    /// Encoded length for an index over `field_count` fields.
    #[must_use]
    pub const fn encoded_len(field_count: usize) -> usize {
        1 + field_count * 8 + 8
    }

    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Self::pattern_for_hashes(&self.hashes).prefix;
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf
    }

    /// Decode a key of an index over `field_count` fields.
    pub fn try_from_raw(bytes: &[u8], field_count: usize) -> Result<Self, KeyDecodeError> {
        check_tagged(bytes, KeyKind::Hash, Self::TAG, Self::encoded_len(field_count))?;

        let hashes = (0..field_count)
            .map(|i| read_u64(bytes, 1 + i * 8))
            .collect();
        let id = read_u64(bytes, 1 + field_count * 8);

        Ok(Self { hashes, id })
    }

    /// Every entry whose field hashes equal `hashes`.
    #[must_use]
    pub fn pattern_for_hashes(hashes: &[u64]) -> KeyPattern {
        let mut prefix = Vec::with_capacity(1 + hashes.len() * 8 + 8);
        prefix.push(Self::TAG);
        for hash in hashes {
            prefix.extend_from_slice(&hash.to_be_bytes());
        }

        KeyPattern::new(prefix)
    }
}
