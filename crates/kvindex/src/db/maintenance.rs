//! Module: db::maintenance
//! Responsibility: namespace lifecycle for a schema registry, consistency
//! checks between primary and index namespaces, and index rebuilds.
//! Does not own: the index algorithms themselves.
//! Boundary: runs outside normal writes, each step in its own transaction.

use crate::{
    config::DbConfig,
    db::{
        data::{FieldSelection, scan_next},
        index::{hash, interval, prefix},
        sequence::SEQUENCE_NAMESPACE,
        store::{Cursor, KvStore, ReadView, Seek, Transaction},
    },
    error::{ErrorOrigin, InternalError},
    model::{EntityModel, NAMESPACE_SEPARATOR, SchemaRegistry},
    value::Value,
};
use std::collections::BTreeSet;

const INDEX_KINDS: [&str; 3] = ["hash", "prefix", "interval"];

///
/// SchemaMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaMode {
    /// Create missing namespaces and index existing rows into new indexes.
    Creation,
    /// Fail on any missing namespace.
    Validation,
}

/// Make sure every namespace the registry needs exists.
pub fn ensure_schema<S: KvStore>(
    store: &S,
    registry: &SchemaRegistry,
    mode: SchemaMode,
    config: &DbConfig,
) -> Result<(), InternalError> {
    ensure_namespace(store, SEQUENCE_NAMESPACE, mode)?;

    for model in registry.entities() {
        ensure_namespace(store, model.namespace(), mode)?;

        for namespace in model.namespaces().into_iter().skip(1) {
            if ensure_namespace(store, namespace, mode)? && !is_empty(store, model.namespace())? {
                let rows = rebuild_index(store, model, namespace, config)?;
                tracing::info!(namespace, rows, "new index populated");
            }
        }
    }

    Ok(())
}

/// Check primary and index namespaces against each other and the registry.
pub fn validate<S: KvStore>(store: &S, registry: &SchemaRegistry) -> Result<(), InternalError> {
    let mut declared = BTreeSet::new();

    for model in registry.entities() {
        let data_empty = is_empty(store, model.namespace())?;

        for namespace in model.namespaces().into_iter().skip(1) {
            declared.insert(namespace.to_string());
            let index_empty = is_empty(store, namespace)?;

            if data_empty && !index_empty {
                return Err(InternalError::inconsistent_index(
                    namespace,
                    format!("index has entries but '{}' holds no objects", model.name),
                ));
            }
        }

        // every object has a hash entry, null included
        if !data_empty {
            for index in &model.hash_indexes {
                if is_empty(store, &index.namespace)? {
                    return Err(InternalError::inconsistent_index(
                        index.namespace.as_str(),
                        format!("'{}' holds objects but the hash index is empty", model.name),
                    ));
                }
            }
        }
    }

    for namespace in store.list_namespaces()? {
        if declared.contains(&namespace) {
            continue;
        }
        if let Some(model) = registry
            .entities()
            .find(|model| is_index_namespace_of(&namespace, &model.name))
        {
            return Err(InternalError::inconsistent_index(
                namespace.as_str(),
                format!("index namespace is not declared by '{}'", model.name),
            ));
        }
    }

    Ok(())
}

/// Clear one index namespace and re-index every object of `model`.
/// Returns the number of objects indexed.
pub fn rebuild_index<S: KvStore>(
    store: &S,
    model: &EntityModel,
    namespace: &str,
    config: &DbConfig,
) -> Result<u64, InternalError> {
    let mut txn = store.begin_transaction()?;

    // Phase 1: clear.
    let mut cursor = Cursor::new(namespace);
    let mut stale = Vec::new();
    let mut next = cursor.seek_first(&txn)?;
    while let Some(kv) = next {
        stale.push(kv.key);
        next = cursor.next(&txn)?;
    }
    for key in &stale {
        txn.delete(namespace, key)?;
    }

    // Phase 2: re-index from a table scan.
    let mut rows = 0u64;
    let mut prev = None;
    while let Some(entity) = scan_next(&txn, model, prev, &FieldSelection::All)? {
        let id = entity.id();
        let row = entity.into_values();
        index_one(&mut txn, model, namespace, &row, id, config)?;
        prev = Some(id);
        rows += 1;
    }

    txn.commit()?;
    tracing::debug!(namespace, rows, cleared = stale.len(), "index rebuilt");

    Ok(rows)
}

fn index_one<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    namespace: &str,
    row: &[Option<Value>],
    id: u64,
    config: &DbConfig,
) -> Result<(), InternalError> {
    if let Some(index) = model.hash_indexes.iter().find(|i| i.namespace == namespace) {
        return hash::insert(txn, model, index, row, id);
    }
    if let Some(index) = model.prefix_indexes.iter().find(|i| i.namespace == namespace) {
        let lexemes = prefix::lexemes_for(model, &index.fields, row)?;
        return prefix::insert(txn, namespace, &lexemes, id, config);
    }
    if let Some(index) = model.interval_indexes.iter().find(|i| i.namespace == namespace) {
        return interval::insert(txn, model, index, row, id);
    }

    Err(InternalError::not_found(
        ErrorOrigin::Schema,
        format!("index namespace '{namespace}' on '{}'", model.name),
    ))
}

// Create a missing namespace (returns true) or fail in validation mode.
fn ensure_namespace<S: KvStore>(
    store: &S,
    namespace: &str,
    mode: SchemaMode,
) -> Result<bool, InternalError> {
    if store.contains_namespace(namespace)? {
        return Ok(false);
    }

    match mode {
        SchemaMode::Creation => {
            store.create_namespace(namespace)?;
            tracing::info!(namespace, "namespace created");
            Ok(true)
        }
        SchemaMode::Validation => Err(InternalError::inconsistent_index(
            namespace,
            "namespace is missing",
        )),
    }
}

fn is_empty<V: ReadView + ?Sized>(view: &V, namespace: &str) -> Result<bool, InternalError> {
    Ok(view.seek(namespace, Seek::First)?.is_none())
}

// `<entity>.<kind>.<...>` for one of the index kinds.
fn is_index_namespace_of(namespace: &str, entity: &str) -> bool {
    namespace
        .strip_prefix(entity)
        .and_then(|rest| rest.strip_prefix(NAMESPACE_SEPARATOR))
        .and_then(|rest| rest.split(NAMESPACE_SEPARATOR).next())
        .is_some_and(|kind| INDEX_KINDS.contains(&kind))
}
