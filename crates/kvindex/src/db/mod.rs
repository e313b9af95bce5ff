//! Module: db
//! Responsibility: everything between the schema registry and the ordered
//! key-value store: key codecs, primary objects, indexes, queries, writes
//! and maintenance.
//! Boundary: `Db` is the only handle most callers need.

pub mod codec;
pub mod data;
pub mod index;
pub mod maintenance;
pub mod query;
pub mod sequence;
pub mod store;
pub mod write;

#[cfg(test)]
mod tests;

use crate::{
    config::DbConfig,
    db::{
        data::{Entity, FieldSelection, read_entity},
        maintenance::SchemaMode,
        query::{EntityIter, Filter, find},
        store::KvStore,
    },
    error::InternalError,
    model::SchemaRegistry,
};

// re-exports
pub use write::WriteTxn;

///
/// Db
///
/// Store handle bound to a frozen schema registry and configuration.
///

pub struct Db<S: KvStore> {
    store: S,
    registry: SchemaRegistry,
    config: DbConfig,
}

impl<S: KvStore> Db<S> {
    /// Bind `store` to `registry`, creating any missing namespace and
    /// populating indexes that did not exist yet.
    pub fn open(
        store: S,
        registry: SchemaRegistry,
        config: DbConfig,
    ) -> Result<Self, InternalError> {
        config.validate()?;
        maintenance::ensure_schema(&store, &registry, SchemaMode::Creation, &config)?;

        Ok(Self {
            store,
            registry,
            config,
        })
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub const fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn begin(&self) -> Result<WriteTxn<'_, S>, InternalError> {
        let txn = self.store.begin_transaction()?;

        Ok(WriteTxn::new(txn, &self.registry, &self.config))
    }

    /// Read one committed object.
    pub fn get(
        &self,
        entity: &str,
        id: u64,
        selection: &FieldSelection,
    ) -> Result<Option<Entity>, InternalError> {
        let model = self.registry.entity(entity)?;

        read_entity(&self.store, model, id, selection)
    }

    /// Query committed state.
    pub fn find(
        &self,
        entity: &str,
        filter: &Filter,
        selection: &FieldSelection,
    ) -> Result<EntityIter<'_, S>, InternalError> {
        find(&self.store, &self.registry, entity, filter, selection)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        maintenance::validate(&self.store, &self.registry)
    }

    /// Rebuild one index namespace of `entity` from its primary objects.
    pub fn rebuild_index(&self, entity: &str, namespace: &str) -> Result<u64, InternalError> {
        let model = self.registry.entity(entity)?;

        maintenance::rebuild_index(&self.store, model, namespace, &self.config)
    }
}

