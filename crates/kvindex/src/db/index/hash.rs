//! Composite equality index.
//!
//! One empty-valued key per object: the hashes of the indexed fields in
//! canonical field order followed by the id. Hashes admit collisions, so
//! every candidate is verified against the live object before it is
//! returned.

use crate::{
    db::{
        codec::{HashIndexKey, KeyPattern},
        data::{Entity, FieldSelection, read_entity},
        index::{check_row, slot},
        store::{Cursor, ReadView, Transaction},
    },
    error::InternalError,
    model::{EntityModel, HashIndexModel},
    obs::{MetricsEvent, sink::record},
    value::{Value, eq_for_index},
};
use xxhash_rust::xxh3::xxh3_64;

/// Index hash of one field value. Null hashes to zero so composite indexes
/// keep null as a real value.
#[expect(clippy::cast_sign_loss)]
pub fn hash_value(value: Option<&Value>) -> Result<u64, InternalError> {
    let Some(value) = value else {
        return Ok(0);
    };

    match value {
        Value::Bool(v) => Ok(u64::from(*v)),
        Value::Int(v) | Value::Date(v) => Ok(*v as u64),
        Value::Text(v) => {
            let folded: String = v.chars().flat_map(char::to_lowercase).collect();
            Ok(xxh3_64(folded.as_bytes()))
        }
        Value::Blob(_) => Err(InternalError::index_unsupported(
            "blob values cannot be hash indexed",
        )),
    }
}

/// Key of `id` in `index` for the given row.
pub fn index_key(
    model: &EntityModel,
    index: &HashIndexModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<HashIndexKey, InternalError> {
    let hashes = index
        .fields
        .iter()
        .map(|field| hash_value(slot(model, row, *field)?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HashIndexKey::new(hashes, id))
}

pub fn insert<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    index: &HashIndexModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<(), InternalError> {
    check_row(model, row)?;
    let key = index_key(model, index, row, id)?;
    txn.put(&index.namespace, key.to_raw(), Vec::new())?;

    record(MetricsEvent::IndexDelta {
        namespace: &index.namespace,
        inserts: 1,
        removes: 0,
    });

    Ok(())
}

/// Delete the key recomputed from `row`; callers pass the values that were
/// indexed, i.e. the pre-update row.
pub fn remove<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    index: &HashIndexModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<(), InternalError> {
    check_row(model, row)?;
    let key = index_key(model, index, row, id)?;
    txn.delete(&index.namespace, &key.to_raw())?;

    record(MetricsEvent::IndexDelta {
        namespace: &index.namespace,
        inserts: 0,
        removes: 1,
    });

    Ok(())
}

///
/// HashQuery
///
/// Lazy equality lookup. Yields objects whose indexed fields equal the
/// expected values under the index equality rule, loaded with the caller's
/// selection plus the indexed fields.
///

pub struct HashQuery<'a, V: ReadView + ?Sized> {
    view: &'a V,
    model: &'a EntityModel,
    index: &'a HashIndexModel,
    expected: Vec<Option<Value>>,
    selection: FieldSelection,
    pattern: KeyPattern,
    cursor: Cursor,
    started: bool,
    done: bool,
}

impl<'a, V: ReadView + ?Sized> HashQuery<'a, V> {
    /// `expected` follows `index.fields`.
    pub fn new(
        view: &'a V,
        model: &'a EntityModel,
        index: &'a HashIndexModel,
        expected: Vec<Option<Value>>,
        selection: &FieldSelection,
    ) -> Result<Self, InternalError> {
        if expected.len() != index.fields.len() {
            return Err(InternalError::query_unsupported(format!(
                "index '{}' covers {} fields, got {} values",
                index.namespace,
                index.fields.len(),
                expected.len()
            )));
        }

        let hashes = expected
            .iter()
            .map(|value| hash_value(value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            view,
            model,
            index,
            expected,
            selection: selection.with(&index.fields),
            pattern: HashIndexKey::pattern_for_hashes(&hashes),
            cursor: Cursor::new(index.namespace.as_str()),
            started: false,
            done: false,
        })
    }

    /// Stop the query; later calls yield nothing.
    pub const fn close(&mut self) {
        self.done = true;
    }

    fn advance(&mut self) -> Result<Option<Entity>, InternalError> {
        loop {
            let next = if self.started {
                self.cursor.next(self.view)?
            } else {
                self.started = true;
                self.cursor.seek(self.view, self.pattern.as_bytes())?
            };
            let Some(kv) = next else {
                return Ok(None);
            };
            if !self.pattern.matches(&kv.key) {
                return Ok(None);
            }

            let key = HashIndexKey::try_from_raw(&kv.key, self.index.fields.len())?;
            record(MetricsEvent::RowsScanned {
                namespace: &self.index.namespace,
                rows: 1,
            });

            let Some(entity) = read_entity(self.view, self.model, key.id, &self.selection)? else {
                tracing::warn!(
                    namespace = %self.index.namespace,
                    id = key.id,
                    "hash index entry without object"
                );
                continue;
            };

            if self.verify(&entity)? {
                return Ok(Some(entity));
            }
            record(MetricsEvent::CandidateRejected {
                namespace: &self.index.namespace,
            });
        }
    }

    fn verify(&self, entity: &Entity) -> Result<bool, InternalError> {
        for (field, expected) in self.index.fields.iter().zip(&self.expected) {
            if !eq_for_index(entity.get(*field)?, expected.as_ref()) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl<V: ReadView + ?Sized> Iterator for HashQuery<'_, V> {
    type Item = Result<Entity, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.advance() {
            Ok(Some(entity)) => Some(Ok(entity)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
