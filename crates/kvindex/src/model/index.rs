use crate::model::FieldId;

///
/// HashIndexModel
/// Composite equality index. `fields` are stored in ascending id order so
/// the key layout does not depend on declaration order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashIndexModel {
    pub namespace: String,
    pub fields: Vec<FieldId>,
}

///
/// PrefixIndexModel
/// Word-prefix index over one or more text fields.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefixIndexModel {
    pub namespace: String,
    pub fields: Vec<FieldId>,
}

///
/// IntervalIndexModel
/// Containment index over a `[begin, end)` pair of orderable fields,
/// partitioned by the hashes of `hashed`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IntervalIndexModel {
    pub namespace: String,
    pub hashed: Vec<FieldId>,
    pub begin: FieldId,
    pub end: FieldId,
}

impl IntervalIndexModel {
    /// Every field the index reads: hashed fields, then begin and end.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldId> {
        let mut out = self.hashed.clone();
        out.push(self.begin);
        out.push(self.end);
        out
    }
}
