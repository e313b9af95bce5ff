use crate::error::InternalError;
use thiserror::Error as ThisError;

const ID_LEN: usize = 8;

///
/// IdBlockCorruption
///

#[derive(Debug, ThisError)]
pub enum IdBlockCorruption {
    #[error("postings block length {len} is not a multiple of {ID_LEN}")]
    Length { len: usize },

    #[error("postings block ids are not strictly ascending")]
    Unordered,
}

impl From<IdBlockCorruption> for InternalError {
    fn from(err: IdBlockCorruption) -> Self {
        Self::index_corruption(err.to_string())
    }
}

///
/// IdBlock
///
/// One postings block: strictly ascending ids, 8 bytes BE each.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdBlock {
    ids: Vec<u64>,
}

impl IdBlock {
    #[must_use]
    pub fn single(id: u64) -> Self {
        Self { ids: vec![id] }
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, IdBlockCorruption> {
        if bytes.len() % ID_LEN != 0 {
            return Err(IdBlockCorruption::Length { len: bytes.len() });
        }

        let ids: Vec<u64> = bytes
            .chunks_exact(ID_LEN)
            .map(|chunk| {
                let mut buf = [0u8; ID_LEN];
                buf.copy_from_slice(chunk);
                u64::from_be_bytes(buf)
            })
            .collect();
        if ids.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(IdBlockCorruption::Unordered);
        }

        Ok(Self { ids })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ids.iter().flat_map(|id| id.to_be_bytes()).collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.ids.last().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Insert by position. Returns false if the id is already present.
    pub fn insert(&mut self, id: u64) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            }
        }
    }

    /// Returns false if the id was absent.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                self.ids.remove(pos);
                true
            }
            Err(_) => false,
        }
    }
}
