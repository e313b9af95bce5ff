//! Runtime schema descriptors.
//!
//! Entity types are described by plain values built once at schema-load
//! time: an ordered field list with stable ids and kinds, plus the declared
//! hash, prefix and interval indexes. The frozen `SchemaRegistry` is the
//! only lookup path used by readers, writers and queries.

pub mod entity;
pub mod field;
pub mod index;
pub mod registry;


use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use thiserror::Error as ThisError;

// re-exports
pub use entity::{EntityModel, EntityModelBuilder};
pub use field::{FieldId, FieldModel};
pub use index::{HashIndexModel, IntervalIndexModel, PrefixIndexModel};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};

/// Separator between path segments of a namespace name.
pub const NAMESPACE_SEPARATOR: char = '.';

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("entity name must be non-empty")]
    EmptyEntityName,

    #[error("entity '{0}' declared twice")]
    DuplicateEntity(String),

    #[error("entity '{entity}' declares field id {id} twice")]
    DuplicateFieldId { entity: String, id: u16 },

    #[error("entity '{entity}' declares field '{field}' twice")]
    DuplicateFieldName { entity: String, field: String },

    #[error("entity '{entity}' has no field '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("index on '{entity}' must name at least one field")]
    EmptyIndex { entity: String },

    #[error("index on '{entity}' hashes {count} fields (max {max})")]
    TooManyIndexFields {
        entity: String,
        count: usize,
        max: usize,
    },

    #[error("field '{entity}.{field}' of kind {kind} cannot be used by a {index} index")]
    UnsupportedFieldKind {
        entity: String,
        field: String,
        kind: crate::value::FieldKind,
        index: &'static str,
    },

    #[error("index '{0}' declared twice")]
    DuplicateIndex(String),
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Schema, err.to_string())
    }
}
