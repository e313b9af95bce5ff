use crate::{
    db::{
        codec::{FieldKey, FieldMarker, decode_value},
        data::{Entity, FieldSelection},
        store::{Cursor, KeyValue, ReadView},
    },
    error::InternalError,
    model::EntityModel,
};

///
/// ObjectReader
///
/// Consumes the contiguous key run of one object from a cursor over the
/// model's data namespace.
///

pub struct ObjectReader<'a> {
    model: &'a EntityModel,
    selection: &'a FieldSelection,
}

impl<'a> ObjectReader<'a> {
    #[must_use]
    pub const fn new(model: &'a EntityModel, selection: &'a FieldSelection) -> Self {
        Self { model, selection }
    }

    /// Read the object whose Begin marker is `begin`, leaving the cursor on
    /// the following object's Begin marker. Returns that marker too.
    ///
    /// A key of another id that is not a Begin marker means the contiguity
    /// invariant is broken and fails with `CorruptedStore`.
    pub fn read<V: ReadView + ?Sized>(
        &self,
        view: &V,
        cursor: &mut Cursor,
        begin: &KeyValue,
    ) -> Result<(Entity, Option<KeyValue>), InternalError> {
        let head = FieldKey::try_from_raw(&begin.key)?;
        if !head.is_begin() {
            return Err(InternalError::corrupted_store(
                head.id,
                "object run does not start with a begin marker",
            ));
        }

        let mut entity = Entity::unloaded(self.model, head.id);
        entity.select(self.selection);

        while let Some(kv) = cursor.next(view)? {
            let key = FieldKey::try_from_raw(&kv.key)?;

            if key.id != head.id {
                if key.is_begin() {
                    return Ok((entity, Some(kv)));
                }
                return Err(InternalError::corrupted_store(
                    key.id,
                    format!("field key follows object {} without a begin marker", head.id),
                ));
            }

            let FieldMarker::Field(field) = key.marker else {
                continue;
            };
            if !self.selection.contains(field) {
                continue;
            }
            // fields no longer declared by the model are skipped
            let Some(model_field) = self.model.field(field) else {
                continue;
            };

            let value = decode_value(model_field.kind, &kv.value)?;
            entity.set(field, value);
        }

        Ok((entity, None))
    }
}

/// Read one object by id. `Ok(None)` when no Begin marker exists for `id`.
pub fn read_entity<V: ReadView + ?Sized>(
    view: &V,
    model: &EntityModel,
    id: u64,
    selection: &FieldSelection,
) -> Result<Option<Entity>, InternalError> {
    let mut cursor = Cursor::new(model.namespace());
    let Some(first) = cursor.seek(view, &FieldKey::begin(id).to_raw())? else {
        return Ok(None);
    };

    let key = FieldKey::try_from_raw(&first.key)?;
    if key.id != id || !key.is_begin() {
        return Ok(None);
    }

    let (entity, _) = ObjectReader::new(model, selection).read(view, &mut cursor, &first)?;

    Ok(Some(entity))
}

/// Read the first object after `prev_id` (or the first object overall).
/// The next run must open with a Begin marker, else `CorruptedStore`.
pub fn scan_next<V: ReadView + ?Sized>(
    view: &V,
    model: &EntityModel,
    prev_id: Option<u64>,
    selection: &FieldSelection,
) -> Result<Option<Entity>, InternalError> {
    let mut cursor = Cursor::new(model.namespace());
    let first = match prev_id {
        None => cursor.seek_first(view)?,
        Some(u64::MAX) => None,
        Some(prev) => cursor.seek(view, &FieldKey::begin(prev + 1).to_raw())?,
    };
    let Some(first) = first else {
        return Ok(None);
    };

    let (entity, _) = ObjectReader::new(model, selection).read(view, &mut cursor, &first)?;

    Ok(Some(entity))
}
