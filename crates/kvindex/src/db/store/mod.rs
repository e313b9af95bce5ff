//! Module: db::store
//! Responsibility: the ordered key-value store boundary consumed by the
//! index layer (namespaced get/seek, transactional put/delete) plus an
//! in-memory implementation.
//! Does not own: key layouts or index semantics.
//! Boundary: every read and write of the crate goes through these traits.

mod cursor;
mod memory;

#[cfg(test)]
mod tests;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use thiserror::Error as ThisError;

pub use cursor::{Cursor, Direction};
pub use memory::{MemoryStore, MemoryTransaction};

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("namespace '{0}' not found")]
    NamespaceNotFound(String),

    #[error("namespace '{0}' already exists")]
    NamespaceExists(String),
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NamespaceNotFound(ns) => {
                Self::not_found(ErrorOrigin::Store, format!("namespace '{ns}'"))
            }
            StoreError::NamespaceExists(_) => {
                Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Store, err.to_string())
            }
        }
    }
}

///
/// KeyValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    #[must_use]
    pub const fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

///
/// Seek
///
/// Positioning request against one namespace, in byte-lexicographic order.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Seek<'a> {
    First,
    Last,
    /// Smallest key `>=` the given key.
    AtOrAfter(&'a [u8]),
    /// Smallest key `>` the given key.
    After(&'a [u8]),
    /// Largest key `<` the given key.
    Before(&'a [u8]),
}

///
/// ReadView
///
/// Read access to the store, either committed state or a transaction's
/// merged view of committed state and its own pending writes.
///

pub trait ReadView {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError>;

    fn seek(&self, namespace: &str, seek: Seek<'_>) -> Result<Option<KeyValue>, InternalError>;

    fn contains_namespace(&self, namespace: &str) -> Result<bool, InternalError>;
}

///
/// Transaction
///
/// Batched writes applied atomically by `commit`. Dropping an uncommitted
/// transaction discards every pending write. Reads through a transaction
/// observe its own pending writes.
///

pub trait Transaction: ReadView {
    fn put(&mut self, namespace: &str, key: Vec<u8>, value: Vec<u8>) -> Result<(), InternalError>;

    fn delete(&mut self, namespace: &str, key: &[u8]) -> Result<(), InternalError>;

    fn commit(self) -> Result<(), InternalError>
    where
        Self: Sized;
}

///
/// KvStore
///
/// Store handle: committed reads, transaction factory and namespace
/// (column family) lifecycle.
///

pub trait KvStore: ReadView {
    type Txn<'a>: Transaction
    where
        Self: 'a;

    fn begin_transaction(&self) -> Result<Self::Txn<'_>, InternalError>;

    fn create_namespace(&self, namespace: &str) -> Result<(), InternalError>;

    fn drop_namespace(&self, namespace: &str) -> Result<(), InternalError>;

    fn list_namespaces(&self) -> Result<Vec<String>, InternalError>;
}
