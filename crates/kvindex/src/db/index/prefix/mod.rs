//! Word-prefix index.
//!
//! Each lexeme owns a group of postings blocks keyed by block number. Ids
//! are sorted within a block and across the blocks of a group. New ids at
//! the tail fill the last block up to the configured size and then open a
//! new block; ids landing inside the group's range are inserted into the
//! block covering them, which may grow that block past the preferred size.

mod block;
mod lexeme;
mod ranges;

pub use block::{IdBlock, IdBlockCorruption};
pub use ranges::IdRanges;
pub use lexeme::{
    diff_lexemes, lexemes, lexemes_for, split_lexemes, split_search_words, words_match,
};

use crate::{
    config::DbConfig,
    db::{
        codec::{KeyPattern, PrefixIndexKey},
        data::{Entity, FieldSelection, read_entity},
        store::{Cursor, ReadView, Transaction},
    },
    error::InternalError,
    model::{EntityModel, PrefixIndexModel},
    obs::{MetricsEvent, sink::record},
};
use std::collections::{BTreeSet, VecDeque};

/// Add `id` to the postings of every lexeme. Already present ids are left
/// untouched.
pub fn insert<T: Transaction>(
    txn: &mut T,
    namespace: &str,
    lexemes: &BTreeSet<String>,
    id: u64,
    config: &DbConfig,
) -> Result<(), InternalError> {
    let max = config.prefix.preferred_max_ids_per_block;
    let mut inserted = 0;

    for lexeme in lexemes {
        if insert_one(txn, namespace, lexeme, id, max)? {
            inserted += 1;
        }
    }

    record(MetricsEvent::IndexDelta {
        namespace,
        inserts: inserted,
        removes: 0,
    });

    Ok(())
}

/// Drop `id` from the postings of every lexeme. Missing ids are ignored.
pub fn remove<T: Transaction>(
    txn: &mut T,
    namespace: &str,
    lexemes: &BTreeSet<String>,
    id: u64,
) -> Result<(), InternalError> {
    let mut removed = 0;

    for lexeme in lexemes {
        if remove_one(txn, namespace, lexeme, id)? {
            removed += 1;
        }
    }

    record(MetricsEvent::IndexDelta {
        namespace,
        inserts: 0,
        removes: removed,
    });

    Ok(())
}

fn insert_one<T: Transaction>(
    txn: &mut T,
    namespace: &str,
    lexeme: &str,
    id: u64,
    max: usize,
) -> Result<bool, InternalError> {
    let group = PrefixIndexKey::pattern_for_lexeme(lexeme);
    let mut cursor = Cursor::new(namespace);
    let mut tail: Option<(PrefixIndexKey, Vec<u8>, IdBlock)> = None;

    // Phase 1: find the first block whose last id is >= id.
    let mut next = cursor.seek(&*txn, group.as_bytes())?;
    while let Some(kv) = next {
        if !group.matches(&kv.key) {
            break;
        }
        let key = PrefixIndexKey::try_from_raw(&kv.key)?;
        let mut block = IdBlock::try_from_bytes(&kv.value)?;

        if block.last().is_some_and(|last| id <= last) {
            if !block.insert(id) {
                return Ok(false);
            }
            txn.put(namespace, kv.key, block.to_bytes())?;
            return Ok(true);
        }

        tail = Some((key, kv.key, block));
        next = cursor.next(&*txn)?;
    }

    // Phase 2: id sorts after every stored id of the group.
    match tail {
        None => {
            let key = PrefixIndexKey::new(lexeme, 0);
            txn.put(namespace, key.to_raw(), IdBlock::single(id).to_bytes())?;
        }
        Some((_, raw, mut block)) if block.len() < max => {
            block.insert(id);
            txn.put(namespace, raw, block.to_bytes())?;
        }
        Some((key, _, _)) => {
            let number = key.block.checked_add(1).ok_or_else(|| {
                InternalError::index_corruption(format!(
                    "lexeme '{lexeme}' in '{namespace}' ran out of block numbers"
                ))
            })?;
            let key = PrefixIndexKey::new(lexeme, number);
            txn.put(namespace, key.to_raw(), IdBlock::single(id).to_bytes())?;

            tracing::debug!(namespace, lexeme, block = number, "postings block opened");
            record(MetricsEvent::BlockSplit { namespace });
        }
    }

    Ok(true)
}

fn remove_one<T: Transaction>(
    txn: &mut T,
    namespace: &str,
    lexeme: &str,
    id: u64,
) -> Result<bool, InternalError> {
    let group = PrefixIndexKey::pattern_for_lexeme(lexeme);
    let mut cursor = Cursor::new(namespace);

    let mut next = cursor.seek(&*txn, group.as_bytes())?;
    while let Some(kv) = next {
        if !group.matches(&kv.key) {
            break;
        }
        let mut block = IdBlock::try_from_bytes(&kv.value)?;

        if block.last().is_some_and(|last| id <= last) {
            if !block.remove(id) {
                return Ok(false);
            }
            if block.is_empty() {
                txn.delete(namespace, &kv.key)?;
            } else {
                txn.put(namespace, kv.key, block.to_bytes())?;
            }
            return Ok(true);
        }

        next = cursor.next(&*txn)?;
    }

    Ok(false)
}

///
/// PrefixQuery
///
/// Lazy word-prefix search. The longest word selects the lexeme groups to
/// walk; with several words every candidate is re-checked against the
/// lexemes of its live field values.
///

pub struct PrefixQuery<'a, V: ReadView + ?Sized> {
    view: &'a V,
    model: &'a EntityModel,
    index: &'a PrefixIndexModel,
    words: Vec<String>,
    selection: FieldSelection,
    pattern: KeyPattern,
    cursor: Cursor,
    pending: VecDeque<u64>,
    seen: IdRanges,
    started: bool,
    done: bool,
}

impl<'a, V: ReadView + ?Sized> PrefixQuery<'a, V> {
    #[must_use]
    pub fn new(
        view: &'a V,
        model: &'a EntityModel,
        index: &'a PrefixIndexModel,
        phrase: &str,
        selection: &FieldSelection,
    ) -> Self {
        let words = split_search_words(phrase);
        let pattern = PrefixIndexKey::pattern_for_search(words.last().map_or("", String::as_str));
        let selection = if words.len() > 1 {
            selection.with(&index.fields)
        } else {
            selection.clone()
        };

        Self {
            view,
            model,
            index,
            pattern,
            selection,
            cursor: Cursor::new(index.namespace.as_str()),
            pending: VecDeque::new(),
            seen: IdRanges::new(),
            started: false,
            // no words match nothing
            done: words.is_empty(),
            words,
        }
    }

    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn close(&mut self) {
        self.done = true;
        self.pending.clear();
        self.seen.clear();
    }

    fn advance(&mut self) -> Result<Option<Entity>, InternalError> {
        loop {
            let Some(id) = self.pending.pop_front() else {
                if self.load_block()? {
                    continue;
                }
                return Ok(None);
            };
            if !self.seen.insert(id) {
                continue;
            }

            record(MetricsEvent::RowsScanned {
                namespace: &self.index.namespace,
                rows: 1,
            });
            let Some(entity) = read_entity(self.view, self.model, id, &self.selection)? else {
                let namespace = self.index.namespace.as_str();
                tracing::warn!(namespace, id, "prefix posting without object");
                continue;
            };

            if self.words.len() == 1 || self.verify(&entity)? {
                return Ok(Some(entity));
            }
            record(MetricsEvent::CandidateRejected {
                namespace: &self.index.namespace,
            });
        }
    }

    // Queue the ids of the next matching block; false when the scan is over.
    fn load_block(&mut self) -> Result<bool, InternalError> {
        let next = if self.started {
            self.cursor.next(self.view)?
        } else {
            self.started = true;
            self.cursor.seek(self.view, self.pattern.as_bytes())?
        };
        let Some(kv) = next else {
            return Ok(false);
        };
        if !self.pattern.matches(&kv.key) {
            return Ok(false);
        }

        PrefixIndexKey::try_from_raw(&kv.key)?;
        let block = IdBlock::try_from_bytes(&kv.value)?;
        self.pending.extend(block.ids());

        Ok(true)
    }

    fn verify(&self, entity: &Entity) -> Result<bool, InternalError> {
        let lexemes = lexemes_for(self.model, &self.index.fields, entity.values())?;

        Ok(words_match(&self.words, &lexemes))
    }
}

impl<V: ReadView + ?Sized> Iterator for PrefixQuery<'_, V> {
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
