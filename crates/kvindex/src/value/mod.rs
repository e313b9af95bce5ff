//! Field values and the equality rule shared by every index kind.


use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// Declared type of an entity field. Drives value decoding and decides which
/// index kinds may cover the field.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum FieldKind {
    Bool,
    Int,
    /// Milliseconds since the Unix epoch.
    Date,
    Text,
    Blob,
}

impl FieldKind {
    /// Kinds a hash index may cover.
    #[must_use]
    pub const fn is_hashable(self) -> bool {
        !matches!(self, Self::Blob)
    }

    /// Kinds an interval index may use as begin/end bounds.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::Int | Self::Date)
    }
}

///
/// Value
///
/// A non-null field value. Nullable slots are `Option<Value>`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Date(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Int(_) => FieldKind::Int,
            Self::Date(_) => FieldKind::Date,
            Self::Text(_) => FieldKind::Text,
            Self::Blob(_) => FieldKind::Blob,
        }
    }

    /// Ordered numeric view used by interval indexes.
    #[must_use]
    pub const fn as_ordered_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) | Self::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

/// Equality rule used to verify index candidates against live data.
///
/// Null equals only null; text compares case-insensitively; every other
/// kind uses natural equality.
#[must_use]
pub fn eq_for_index(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Text(a)), Some(Value::Text(b))) => text_eq_ci(a, b),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Case-insensitive text equality (full Unicode lowercase folding).
#[must_use]
pub fn text_eq_ci(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
