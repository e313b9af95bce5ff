//! Module: db::write
//! Responsibility: the entity-level write surface. Every write stores the
//! primary fields and the matching index deltas in one store transaction.
//! Does not own: index algorithms or key layouts.
//! Boundary: a `WriteTxn` that saw an error refuses to commit; dropping it
//! rolls everything back.

use crate::{
    config::DbConfig,
    db::{
        data::{Entity, FieldSelection, delete_object, object_exists, put_object, read_entity},
        index::{insert_entity_indexes, remove_entity_indexes, update_entity_indexes},
        query::{EntityIter, Filter, find},
        sequence,
        store::{KvStore, Transaction},
    },
    error::{ErrorOrigin, InternalError},
    model::{EntityModel, SchemaRegistry},
    value::Value,
};

///
/// WriteTxn
///
/// One store transaction plus the schema needed to keep indexes in step.
/// Reads through it observe its own pending writes.
///

pub struct WriteTxn<'a, S: KvStore + 'a> {
    txn: S::Txn<'a>,
    registry: &'a SchemaRegistry,
    config: &'a DbConfig,
    failed: bool,
}

impl<'a, S: KvStore + 'a> WriteTxn<'a, S> {
    pub(crate) const fn new(
        txn: S::Txn<'a>,
        registry: &'a SchemaRegistry,
        config: &'a DbConfig,
    ) -> Self {
        Self {
            txn,
            registry,
            config,
            failed: false,
        }
    }
}

impl<'a, S: KvStore + 'a> WriteTxn<'a, S> {
    /// Store a new object under the next id of the entity's sequence.
    pub fn create(&mut self, entity: &str, row: &[Option<Value>]) -> Result<u64, InternalError> {
        let model = self.registry.entity(entity)?;
        let result = create(&mut self.txn, model, row, self.config);

        self.track(result)
    }

    /// Store a new object under a caller-chosen id.
    pub fn insert(
        &mut self,
        entity: &str,
        id: u64,
        row: &[Option<Value>],
    ) -> Result<(), InternalError> {
        let model = self.registry.entity(entity)?;
        let result = insert(&mut self.txn, model, id, row, self.config);

        self.track(result)
    }

    /// Replace every field of an existing object.
    pub fn update(
        &mut self,
        entity: &str,
        id: u64,
        row: &[Option<Value>],
    ) -> Result<(), InternalError> {
        let model = self.registry.entity(entity)?;
        let result = update(&mut self.txn, model, id, row, self.config);

        self.track(result)
    }

    /// Delete an object and its index entries. False when `id` is absent.
    pub fn remove(&mut self, entity: &str, id: u64) -> Result<bool, InternalError> {
        let model = self.registry.entity(entity)?;
        let result = remove(&mut self.txn, model, id);

        self.track(result)
    }

    pub fn get(
        &self,
        entity: &str,
        id: u64,
        selection: &FieldSelection,
    ) -> Result<Option<Entity>, InternalError> {
        let model = self.registry.entity(entity)?;

        read_entity(&self.txn, model, id, selection)
    }

    pub fn find(
        &self,
        entity: &str,
        filter: &Filter,
        selection: &FieldSelection,
    ) -> Result<EntityIter<'_, S::Txn<'a>>, InternalError> {
        find(&self.txn, self.registry, entity, filter, selection)
    }

    pub fn commit(self) -> Result<(), InternalError> {
        if self.failed {
            return Err(InternalError::data_invariant(
                "transaction saw a failed write and cannot commit",
            ));
        }

        self.txn.commit()
    }

    fn track<R>(&mut self, result: Result<R, InternalError>) -> Result<R, InternalError> {
        if result.is_err() {
            self.failed = true;
        }

        result
    }
}

fn create<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    row: &[Option<Value>],
    config: &DbConfig,
) -> Result<u64, InternalError> {
    let id = sequence::next_id(txn, &model.name)?;
    put_object(txn, model, id, row)?;
    insert_entity_indexes(txn, model, row, id, config)?;

    Ok(id)
}

fn insert<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
    row: &[Option<Value>],
    config: &DbConfig,
) -> Result<(), InternalError> {
    if object_exists(&*txn, model, id)? {
        return Err(InternalError::data_invariant(format!(
            "'{}' already holds object {id}",
            model.name
        )));
    }

    sequence::observe(txn, &model.name, id)?;
    put_object(txn, model, id, row)?;
    insert_entity_indexes(txn, model, row, id, config)
}

fn update<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
    row: &[Option<Value>],
    config: &DbConfig,
) -> Result<(), InternalError> {
    let old = read_entity(&*txn, model, id, &FieldSelection::All)?
        .ok_or_else(|| {
            InternalError::not_found(ErrorOrigin::Data, format!("object {id} of '{}'", model.name))
        })?
        .into_values();

    put_object(txn, model, id, row)?;
    update_entity_indexes(txn, model, &old, row, id, config)
}

fn remove<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    id: u64,
) -> Result<bool, InternalError> {
    let Some(old) = read_entity(&*txn, model, id, &FieldSelection::All)? else {
        return Ok(false);
    };

    remove_entity_indexes(txn, model, old.values(), id)?;
    delete_object(txn, model, id)
}
