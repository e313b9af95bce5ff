//! Per-entity id sequence.
//!
//! One key per entity name in the sequence namespace, holding the last id
//! handed out as u64 BE. Ids start at 1 and advance inside the caller's
//! transaction, so a rolled back write never consumes an id.

use crate::{
    db::store::{ReadView, Transaction},
    error::{InternalError, KeyKind},
};

/// Namespace holding every entity sequence.
pub const SEQUENCE_NAMESPACE: &str = "system.sequence";

/// Last id handed out for `entity`, or 0.
pub fn current<V: ReadView + ?Sized>(view: &V, entity: &str) -> Result<u64, InternalError> {
    let Some(raw) = view.get(SEQUENCE_NAMESPACE, entity.as_bytes())? else {
        return Ok(0);
    };
    let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
        InternalError::malformed_key(KeyKind::Sequence, raw.len(), "sequence value must be 8 bytes")
    })?;

    Ok(u64::from_be_bytes(bytes))
}

/// Allocate the next id for `entity`.
pub fn next_id<T: Transaction>(txn: &mut T, entity: &str) -> Result<u64, InternalError> {
    let next = current(&*txn, entity)?
        .checked_add(1)
        .ok_or_else(|| InternalError::data_invariant(format!("sequence of '{entity}' exhausted")))?;
    txn.put(SEQUENCE_NAMESPACE, entity.as_bytes().to_vec(), next.to_be_bytes().to_vec())?;

    Ok(next)
}

/// Move the sequence forward so it never hands out `id` or anything below.
pub fn observe<T: Transaction>(txn: &mut T, entity: &str, id: u64) -> Result<(), InternalError> {
    if current(&*txn, entity)? < id {
        txn.put(SEQUENCE_NAMESPACE, entity.as_bytes().to_vec(), id.to_be_bytes().to_vec())?;
    }

    Ok(())
}
