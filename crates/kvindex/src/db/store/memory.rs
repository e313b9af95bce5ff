use crate::{
    db::store::{KeyValue, KvStore, ReadView, Seek, StoreError, Transaction},
    error::InternalError,
};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    ops::Bound::{self, Excluded, Included, Unbounded},
};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Pending writes of one namespace; `None` marks a delete.
type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

///
/// MemoryStore
///
/// Ordered in-memory store: one byte-ordered map per namespace. Single
/// threaded; transactions buffer writes and apply them on commit.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: RefCell<BTreeMap<String, Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of committed keys across every namespace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.borrow().values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_table<T>(
        &self,
        namespace: &str,
        f: impl FnOnce(&Table) -> T,
    ) -> Result<T, InternalError> {
        let namespaces = self.namespaces.borrow();
        let table = namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))?;

        Ok(f(table))
    }
}

impl ReadView for MemoryStore {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        self.with_table(namespace, |table| table.get(key).cloned())
    }

    fn seek(&self, namespace: &str, seek: Seek<'_>) -> Result<Option<KeyValue>, InternalError> {
        self.with_table(namespace, |table| {
            let (bound, forward) = seek_bound(seek);
            nearest(table, bound, forward).map(|(k, v)| KeyValue::new(k, v))
        })
    }

    fn contains_namespace(&self, namespace: &str) -> Result<bool, InternalError> {
        Ok(self.namespaces.borrow().contains_key(namespace))
    }
}

impl KvStore for MemoryStore {
    type Txn<'a> = MemoryTransaction<'a>;

    fn begin_transaction(&self) -> Result<Self::Txn<'_>, InternalError> {
        Ok(MemoryTransaction {
            store: self,
            pending: BTreeMap::new(),
        })
    }

    fn create_namespace(&self, namespace: &str) -> Result<(), InternalError> {
        let mut namespaces = self.namespaces.borrow_mut();
        if namespaces.contains_key(namespace) {
            return Err(StoreError::NamespaceExists(namespace.to_string()).into());
        }
        namespaces.insert(namespace.to_string(), Table::new());

        Ok(())
    }

    fn drop_namespace(&self, namespace: &str) -> Result<(), InternalError> {
        self.namespaces
            .borrow_mut()
            .remove(namespace)
            .map(|_| ())
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()).into())
    }

    fn list_namespaces(&self) -> Result<Vec<String>, InternalError> {
        Ok(self.namespaces.borrow().keys().cloned().collect())
    }
}

///
/// MemoryTransaction
///
/// Write batch over a [`MemoryStore`]. Reads merge the pending overlay over
/// committed state; dropping without `commit` discards the overlay.
///

#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    pending: BTreeMap<String, Overlay>,
}

impl MemoryTransaction<'_> {
    /// Number of buffered writes (puts and deletes).
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.values().map(BTreeMap::len).sum()
    }

    fn overlay_mut(&mut self, namespace: &str) -> Result<&mut Overlay, InternalError> {
        if !self.store.contains_namespace(namespace)? {
            return Err(StoreError::NamespaceNotFound(namespace.to_string()).into());
        }

        Ok(self.pending.entry(namespace.to_string()).or_default())
    }

    fn merged_seek(
        &self,
        namespace: &str,
        seek: Seek<'_>,
    ) -> Result<Option<KeyValue>, InternalError> {
        let (bound, forward) = seek_bound(seek);
        let Some(overlay) = self.pending.get(namespace) else {
            return self.store.seek(namespace, seek);
        };

        self.store.with_table(namespace, |table| {
            let mut bound = bound;
            loop {
                let base = nearest(table, bound.clone(), forward);
                let over = nearest(overlay, bound.clone(), forward);

                // Pick whichever side is nearer in the seek direction;
                // the overlay shadows committed state on equal keys.
                let take_overlay = match (&base, &over) {
                    (_, None) => false,
                    (None, Some(_)) => true,
                    (Some((bk, _)), Some((ok, _))) => {
                        if forward {
                            ok <= bk
                        } else {
                            ok >= bk
                        }
                    }
                };

                if !take_overlay {
                    return base.map(|(k, v)| KeyValue::new(k, v));
                }

                match over {
                    Some((key, Some(value))) => return Some(KeyValue::new(key, value)),
                    Some((key, None)) => bound = Excluded(key),
                    None => return None,
                }
            }
        })
    }
}

impl ReadView for MemoryTransaction<'_> {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        if let Some(pending) = self.pending.get(namespace).and_then(|o| o.get(key)) {
            return Ok(pending.clone());
        }

        self.store.get(namespace, key)
    }

    fn seek(&self, namespace: &str, seek: Seek<'_>) -> Result<Option<KeyValue>, InternalError> {
        self.merged_seek(namespace, seek)
    }

    fn contains_namespace(&self, namespace: &str) -> Result<bool, InternalError> {
        self.store.contains_namespace(namespace)
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn put(&mut self, namespace: &str, key: Vec<u8>, value: Vec<u8>) -> Result<(), InternalError> {
        self.overlay_mut(namespace)?.insert(key, Some(value));

        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &[u8]) -> Result<(), InternalError> {
        self.overlay_mut(namespace)?.insert(key.to_vec(), None);

        Ok(())
    }

    fn commit(self) -> Result<(), InternalError> {
        let mut namespaces = self.store.namespaces.borrow_mut();

        // Phase 1: every touched namespace must still exist.
        for namespace in self.pending.keys() {
            if !namespaces.contains_key(namespace) {
                return Err(StoreError::NamespaceNotFound(namespace.clone()).into());
            }
        }

        // Phase 2: apply.
        let writes: usize = self.pending.values().map(BTreeMap::len).sum();
        for (namespace, overlay) in self.pending {
            let Some(table) = namespaces.get_mut(&namespace) else {
                return Err(InternalError::store_internal(format!(
                    "namespace '{namespace}' vanished during commit"
                )));
            };
            for (key, value) in overlay {
                match value {
                    Some(value) => table.insert(key, value),
                    None => table.remove(&key),
                };
            }
        }
        tracing::trace!(writes, "memory transaction committed");

        Ok(())
    }
}

// Translate a seek request into a start bound and a direction.
fn seek_bound(seek: Seek<'_>) -> (Bound<Vec<u8>>, bool) {
    match seek {
        Seek::First => (Unbounded, true),
        Seek::Last => (Unbounded, false),
        Seek::AtOrAfter(key) => (Included(key.to_vec()), true),
        Seek::After(key) => (Excluded(key.to_vec()), true),
        Seek::Before(key) => (Excluded(key.to_vec()), false),
    }
}

// Nearest entry from `bound` in the given direction.
fn nearest<V: Clone>(
    map: &BTreeMap<Vec<u8>, V>,
    bound: Bound<Vec<u8>>,
    forward: bool,
) -> Option<(Vec<u8>, V)> {
    let bound = bound.as_ref().map(Vec::as_slice);
    let entry = if forward {
        map.range::<[u8], _>((bound, Unbounded)).next()
    } else {
        map.range::<[u8], _>((Unbounded, bound)).next_back()
    };

    entry.map(|(k, v)| (k.clone(), v.clone()))
}
