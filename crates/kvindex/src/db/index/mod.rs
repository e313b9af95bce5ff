//! Module: db::index
//! Responsibility: maintenance and lookup for hash, prefix and interval
//! indexes, plus the per-entity fan-out used by every write.
//! Does not own: primary object layout or query dispatch.
//! Boundary: index deltas are written into the caller's transaction, never
//! on their own.

pub mod hash;
pub mod interval;
pub mod prefix;


use crate::{
    config::DbConfig,
    db::store::Transaction,
    error::InternalError,
    model::{EntityModel, FieldId},
    value::Value,
};

/// Write every index entry of one object.
pub fn insert_entity_indexes<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    row: &[Option<Value>],
    id: u64,
    config: &DbConfig,
) -> Result<(), InternalError> {
    check_row(model, row)?;

    for index in &model.hash_indexes {
        hash::insert(txn, model, index, row, id)?;
    }
    for index in &model.prefix_indexes {
        let lexemes = prefix::lexemes_for(model, &index.fields, row)?;
        prefix::insert(txn, &index.namespace, &lexemes, id, config)?;
    }
    for index in &model.interval_indexes {
        interval::insert(txn, model, index, row, id)?;
    }

    Ok(())
}

/// Delete every index entry of one object, computed from its current row.
pub fn remove_entity_indexes<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<(), InternalError> {
    check_row(model, row)?;

    for index in &model.hash_indexes {
        hash::remove(txn, model, index, row, id)?;
    }
    for index in &model.prefix_indexes {
        let lexemes = prefix::lexemes_for(model, &index.fields, row)?;
        prefix::remove(txn, &index.namespace, &lexemes, id)?;
    }
    for index in &model.interval_indexes {
        interval::remove(txn, model, index, row, id)?;
    }

    Ok(())
}

/// Move index entries from `old` to `new`. Hash and interval indexes are
/// removed and re-inserted; prefix indexes only touch changed lexemes.
/// Indexes whose fields did not change are left alone.
pub fn update_entity_indexes<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    old: &[Option<Value>],
    new: &[Option<Value>],
    id: u64,
    config: &DbConfig,
) -> Result<(), InternalError> {
    check_row(model, old)?;
    check_row(model, new)?;

    for index in &model.hash_indexes {
        if fields_changed(model, &index.fields, old, new)? {
            hash::remove(txn, model, index, old, id)?;
            hash::insert(txn, model, index, new, id)?;
        }
    }
    for index in &model.prefix_indexes {
        if fields_changed(model, &index.fields, old, new)? {
            let before = prefix::lexemes_for(model, &index.fields, old)?;
            let after = prefix::lexemes_for(model, &index.fields, new)?;
            let (removed, inserted) = prefix::diff_lexemes(&before, &after);
            prefix::remove(txn, &index.namespace, &removed, id)?;
            prefix::insert(txn, &index.namespace, &inserted, id, config)?;
        }
    }
    for index in &model.interval_indexes {
        if fields_changed(model, &index.fields(), old, new)? {
            interval::remove(txn, model, index, old, id)?;
            interval::insert(txn, model, index, new, id)?;
        }
    }

    Ok(())
}

/// Value of `field` in a row laid out in model field order.
pub(crate) fn slot<'r>(
    model: &EntityModel,
    row: &'r [Option<Value>],
    field: FieldId,
) -> Result<Option<&'r Value>, InternalError> {
    let pos = model.position(field).ok_or_else(|| {
        InternalError::index_unsupported(format!("field {field} is not part of '{}'", model.name))
    })?;

    row.get(pos)
        .map(Option::as_ref)
        .ok_or_else(|| InternalError::data_invariant(format!("row has no slot {pos}")))
}

pub(crate) fn check_row(model: &EntityModel, row: &[Option<Value>]) -> Result<(), InternalError> {
    if row.len() == model.fields.len() {
        Ok(())
    } else {
        Err(InternalError::data_invariant(format!(
            "'{}' has {} fields, row has {}",
            model.name,
            model.fields.len(),
            row.len()
        )))
    }
}

fn fields_changed(
    model: &EntityModel,
    fields: &[FieldId],
    old: &[Option<Value>],
    new: &[Option<Value>],
) -> Result<bool, InternalError> {
    for field in fields {
        if slot(model, old, *field)? != slot(model, new, *field)? {
            return Ok(true);
        }
    }

    Ok(false)
}
