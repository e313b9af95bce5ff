use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::{FieldKind, Value},
};
use thiserror::Error as ThisError;

///
/// ValueDecodeError
///

#[derive(Debug, ThisError)]
pub enum ValueDecodeError {
    #[error("{kind} value has invalid length {len}")]
    Length { kind: FieldKind, len: usize },

    #[error("bool value has invalid byte {0:#04x}")]
    Bool(u8),

    #[error("text value is not valid UTF-8")]
    Utf8,
}

impl From<ValueDecodeError> for InternalError {
    fn from(err: ValueDecodeError) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Serialize, err.to_string())
    }
}

/// Encode a non-null field value for its primary field key.
#[must_use]
pub fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::Bool(v) => vec![u8::from(*v)],
        Value::Int(v) | Value::Date(v) => v.to_be_bytes().to_vec(),
        Value::Text(v) => v.as_bytes().to_vec(),
        Value::Blob(v) => v.clone(),
    }
}

/// Decode a stored field value against its declared kind.
pub fn decode_value(kind: FieldKind, bytes: &[u8]) -> Result<Value, ValueDecodeError> {
    match kind {
        FieldKind::Bool => match bytes {
            [0] => Ok(Value::Bool(false)),
            [1] => Ok(Value::Bool(true)),
            [other] => Err(ValueDecodeError::Bool(*other)),
            _ => Err(ValueDecodeError::Length {
                kind,
                len: bytes.len(),
            }),
        },
        FieldKind::Int | FieldKind::Date => {
            let raw: [u8; 8] = bytes.try_into().map_err(|_| ValueDecodeError::Length {
                kind,
                len: bytes.len(),
            })?;
            let v = i64::from_be_bytes(raw);

            Ok(if kind == FieldKind::Int {
                Value::Int(v)
            } else {
                Value::Date(v)
            })
        }
        FieldKind::Text => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|_| ValueDecodeError::Utf8),
        FieldKind::Blob => Ok(Value::Blob(bytes.to_vec())),
    }
}
