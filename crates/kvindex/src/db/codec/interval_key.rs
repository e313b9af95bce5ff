use crate::{
    db::codec::{KeyDecodeError, KeyPattern, check_tagged, read_u64},
    error::KeyKind,
};

const SIGN_BIT: u64 = 1 << 63;
const BEGIN_FLAG: u8 = 0;
const END_FLAG: u8 = 1;

///
/// IntervalIndexKey
///
/// Tag, one u64 BE hash per hashed field, the sign-flipped i64 BE breakpoint
/// value, a marker flag (0 begin, 1 end), then the u64 BE object id.
/// Within a group entries order by value, then begin markers before end
/// markers, then id.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IntervalIndexKey {
    pub hashes: Vec<u64>,
    pub value: i64,
    pub end_of_range: bool,
    pub id: u64,
}

impl IntervalIndexKey {
    pub const TAG: u8 = 0x03;

    #[must_use]
    pub const fn begin(hashes: Vec<u64>, value: i64, id: u64) -> Self {
        Self {
            hashes,
            value,
            end_of_range: false,
            id,
        }
    }

    #[must_use]
    pub const fn end(hashes: Vec<u64>, value: i64, id: u64) -> Self {
        Self {
            hashes,
            value,
            end_of_range: true,
            id,
        }
    }

    #[must_use]
    pub const fn encoded_len(hashed_count: usize) -> usize {
        1 + hashed_count * 8 + 8 + 1 + 8
    }

    /// Same group and id, moved to another breakpoint value.
    #[must_use]
    pub fn with_value(&self, value: i64) -> Self {
        Self {
            hashes: self.hashes.clone(),
            value,
            end_of_range: self.end_of_range,
            id: self.id,
        }
    }

    /// Same entry turned into an end marker.
    #[must_use]
    pub fn as_end(&self) -> Self {
        Self {
            end_of_range: true,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Self::seek_key(&self.hashes, self.value);
        buf.push(if self.end_of_range { END_FLAG } else { BEGIN_FLAG });
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf
    }

    /// Decode a key of an index with `hashed_count` hashed fields.
    pub fn try_from_raw(bytes: &[u8], hashed_count: usize) -> Result<Self, KeyDecodeError> {
        let len = Self::encoded_len(hashed_count);
        check_tagged(bytes, KeyKind::Interval, Self::TAG, len)?;

        let hashes = (0..hashed_count)
            .map(|i| read_u64(bytes, 1 + i * 8))
            .collect();
        let offset = 1 + hashed_count * 8;
        let value = decode_i64(read_u64(bytes, offset));
        let end_of_range = match bytes[offset + 8] {
            BEGIN_FLAG => false,
            END_FLAG => true,
            found => return Err(KeyDecodeError::Flag { len, found }),
        };
        let id = read_u64(bytes, offset + 9);

        Ok(Self {
            hashes,
            value,
            end_of_range,
            id,
        })
    }

    /// Every entry of one hash group.
    #[must_use]
    pub fn group_pattern(hashes: &[u64]) -> KeyPattern {
        let mut prefix = Vec::with_capacity(Self::encoded_len(hashes.len()));
        prefix.push(Self::TAG);
        for hash in hashes {
            prefix.extend_from_slice(&hash.to_be_bytes());
        }

        KeyPattern::new(prefix)
    }

    /// Sorts before every entry at `value` and after every entry below it.
    #[must_use]
    pub fn seek_key(hashes: &[u64], value: i64) -> Vec<u8> {
        let mut buf = Self::group_pattern(hashes).prefix;
        buf.extend_from_slice(&encode_i64(value).to_be_bytes());
        buf
    }

    /// Sorts after every entry at `value` and before every entry above it.
    #[must_use]
    pub fn past_value_key(hashes: &[u64], value: i64) -> Vec<u8> {
        let mut buf = Self::seek_key(hashes, value);
        buf.push(END_FLAG + 1);
        buf
    }
}

#[expect(clippy::cast_sign_loss)]
const fn encode_i64(value: i64) -> u64 {
    (value as u64) ^ SIGN_BIT
}

#[expect(clippy::cast_possible_wrap)]
const fn decode_i64(raw: u64) -> i64 {
    (raw ^ SIGN_BIT) as i64
}
