//! Secondary indexes over an ordered key-value store: hash, prefix (text
//! search) and interval indexes kept in step with primary objects inside
//! the caller's transaction, plus the lazy query iterators that read them.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of hashed fields on one hash or interval index.
///
/// Keeps hashed index keys at a bounded size.
pub const MAX_INDEX_FIELDS: usize = 4;

/// Default id count at which a prefix index tail block stops growing.
pub const PREFERRED_MAX_ID_COUNT_PER_BLOCK: usize = 1024;

///
/// Prelude
///
/// Prelude contains only domain vocabulary and the `Db` handle.
///

pub mod prelude {
    pub use crate::{
        config::DbConfig,
        db::{
            Db, WriteTxn,
            data::{Entity, FieldSelection},
            query::{Filter, HashFilter, IntervalFilter, PrefixFilter},
            store::MemoryStore,
        },
        model::{EntityModel, FieldId, SchemaRegistry},
        value::{FieldKind, Value},
    };
}
