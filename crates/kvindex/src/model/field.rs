use crate::value::FieldKind;
use derive_more::{Deref, Display};

///
/// FieldId
///
/// Stable per-field identifier written into primary field keys.
/// Renaming a field must never change its id.
///

#[derive(Clone, Copy, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldId(pub u16);

///
/// FieldModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    pub id: FieldId,
    pub name: String,
    pub kind: FieldKind,
}
