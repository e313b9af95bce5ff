use crate::{
    db::codec::{KeyDecodeError, KeyPattern},
    error::KeyKind,
};

///
/// PrefixIndexKey
///
/// Tag, lexeme bytes, a 0x00 terminator, then the u32 BE block number.
/// Lexemes are alphanumeric so the terminator never occurs inside one; a
/// lexeme's blocks therefore sort together and before any longer lexeme
/// sharing its characters.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PrefixIndexKey {
    pub lexeme: String,
    pub block: u32,
}

impl PrefixIndexKey {
    pub const TAG: u8 = 0x02;
    pub const TERMINATOR: u8 = 0x00;

    #[must_use]
    pub fn new(lexeme: impl Into<String>, block: u32) -> Self {
        Self {
            lexeme: lexeme.into(),
            block,
        }
    }

    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Self::pattern_for_lexeme(&self.lexeme).prefix;
        buf.extend_from_slice(&self.block.to_be_bytes());
        buf
    }

    pub fn try_from_raw(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        let len = bytes.len();
        match bytes.first() {
            None => {
                return Err(KeyDecodeError::Length {
                    kind: KeyKind::Prefix,
                    len,
                });
            }
            Some(&found) if found != Self::TAG => {
                return Err(KeyDecodeError::Tag {
                    kind: KeyKind::Prefix,
                    len,
                    found,
                });
            }
            Some(_) => {}
        }

        let body = &bytes[1..];
        let terminator = body
            .iter()
            .position(|b| *b == Self::TERMINATOR)
            .ok_or(KeyDecodeError::Terminator { len })?;
        let block = &body[terminator + 1..];
        if block.len() != 4 {
            return Err(KeyDecodeError::Length {
                kind: KeyKind::Prefix,
                len,
            });
        }

        let lexeme = std::str::from_utf8(&body[..terminator])
            .map_err(|_| KeyDecodeError::Lexeme { len })?
            .to_string();
        let block = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);

        Ok(Self { lexeme, block })
    }

    /// Every block of exactly `lexeme`.
    #[must_use]
    pub fn pattern_for_lexeme(lexeme: &str) -> KeyPattern {
        let mut prefix = Self::pattern_for_search(lexeme).prefix;
        prefix.push(Self::TERMINATOR);
        KeyPattern::new(prefix)
    }

    /// Every block of every lexeme starting with `word`.
    #[must_use]
    pub fn pattern_for_search(word: &str) -> KeyPattern {
        let mut prefix = Vec::with_capacity(word.len() + 6);
        prefix.push(Self::TAG);
        prefix.extend_from_slice(word.as_bytes());
        KeyPattern::new(prefix)
    }
}
