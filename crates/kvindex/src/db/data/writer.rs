use crate::{
    db::{
        codec::{FieldKey, encode_value},
        store::{Cursor, ReadView, Transaction},
    },
    error::InternalError,
    model::{EntityModel, FieldId},
    value::Value,
};

/// True when a Begin marker exists for `id`.
pub fn object_exists<V: ReadView + ?Sized>(
    view: &V,
    model: &EntityModel,
    id: u64,
) -> Result<bool, InternalError> {
    Ok(view
        .get(model.namespace(), &FieldKey::begin(id).to_raw())?
        .is_some())
}

/// Write a whole object: Begin marker, one key per non-null slot, and a
/// delete for every null slot. `values` follows the model's field order.
pub fn put_object<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
    values: &[Option<Value>],
) -> Result<(), InternalError> {
    if values.len() != model.fields.len() {
        return Err(InternalError::data_invariant(format!(
            "'{}' has {} fields, got {} values",
            model.name,
            model.fields.len(),
            values.len()
        )));
    }

    txn.put(model.namespace(), FieldKey::begin(id).to_raw(), Vec::new())?;
    for (field, value) in model.fields.iter().zip(values) {
        put_field(txn, model, id, field.id, value.as_ref())?;
    }

    Ok(())
}

/// Set one field; `None` clears it.
pub fn put_field<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
    field: FieldId,
    value: Option<&Value>,
) -> Result<(), InternalError> {
    let kind = model.kind_of(field)?;
    let key = FieldKey::field(id, field).to_raw();

    match value {
        Some(value) if value.kind() != kind => Err(InternalError::data_unsupported(format!(
            "field {field} of '{}' is {kind}, got {}",
            model.name,
            value.kind()
        ))),
        Some(value) => txn.put(model.namespace(), key, encode_value(value)),
        None => txn.delete(model.namespace(), &key),
    }
}

pub fn clear_field<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
    field: FieldId,
) -> Result<(), InternalError> {
    put_field(txn, model, id, field, None)
}

/// Delete every key of `id`. Returns false when nothing was stored.
pub fn delete_object<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
) -> Result<bool, InternalError> {
    let pattern = FieldKey::pattern_for_id(id);
    let mut cursor = Cursor::new(model.namespace());

    // Phase 1: collect the run.
    let mut keys = Vec::new();
    let mut next = cursor.seek(&*txn, pattern.as_bytes())?;
    while let Some(kv) = next {
        if !pattern.matches(&kv.key) {
            break;
        }
        keys.push(kv.key);
        next = cursor.next(&*txn)?;
    }

    // Phase 2: delete.
    for key in &keys {
        txn.delete(model.namespace(), key)?;
    }

    Ok(!keys.is_empty())
}
