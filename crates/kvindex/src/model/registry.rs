use crate::{
    error::{ErrorOrigin, InternalError},
    model::{EntityModel, SchemaError},
};
use std::collections::BTreeMap;

///
/// SchemaRegistry
///
/// Frozen map of entity descriptors keyed by entity name. Built once at
/// schema-load time; shared lookups need no locking afterwards.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    entities: BTreeMap<String, EntityModel>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Look up an entity descriptor; undeclared entities are a caller error.
    pub fn entity(&self, name: &str) -> Result<&EntityModel, InternalError> {
        self.entities.get(name).ok_or_else(|| {
            InternalError::not_found(ErrorOrigin::Schema, format!("entity '{name}'"))
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

///
/// SchemaRegistryBuilder
///

#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    entities: Vec<EntityModel>,
}

impl SchemaRegistryBuilder {
    #[must_use]
    pub fn entity(mut self, model: EntityModel) -> Self {
        self.entities.push(model);
        self
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let mut entities = BTreeMap::new();
        for model in self.entities {
            if entities.contains_key(&model.name) {
                return Err(SchemaError::DuplicateEntity(model.name));
            }
            entities.insert(model.name.clone(), model);
        }

        Ok(SchemaRegistry { entities })
    }
}
