//! Breakpoint interval index.
//!
//! Every stored value in a hash group is a breakpoint. An object with
//! interval `[begin, end)` owns a begin marker at `begin`, a begin marker at
//! every breakpoint strictly inside its interval, and an end marker at
//! `end`. The begin markers sitting on the greatest breakpoint `<= x` are
//! therefore exactly the objects covering `x`, found with a single seek.
//! Zero-length intervals own a begin and an end marker on the same
//! breakpoint and never cover anything.

use crate::{
    db::{
        codec::{IntervalIndexKey, KeyPattern},
        data::{Entity, FieldSelection, read_entity},
        index::{check_row, hash::hash_value, slot},
        store::{Cursor, KeyValue, ReadView, Transaction},
    },
    error::InternalError,
    model::{EntityModel, IntervalIndexModel},
    obs::{MetricsEvent, sink::record},
    value::{Value, eq_for_index},
};
use std::collections::{BTreeSet, VecDeque};

/// Index `id` over `[begin, end)` from `row`. A null bound skips the object.
pub fn insert<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    index: &IntervalIndexModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<(), InternalError> {
    check_row(model, row)?;
    let Some((hashes, begin, end)) = bounds(model, index, row)? else {
        return Ok(());
    };
    if begin > end {
        return Err(InternalError::index_unsupported(format!(
            "interval [{begin}, {end}) of object {id} in '{}' ends before it begins",
            index.namespace
        )));
    }

    let namespace = index.namespace.as_str();
    let plan = InsertPlan::read(&*txn, namespace, &hashes, begin, end)?;
    let mut splits = 0u64;

    // Phase 1: split intervals spanning across the new begin.
    if let Some(left) = &plan.left_run {
        for other in left {
            put_marker(txn, namespace, &IntervalIndexKey::begin(hashes.clone(), begin, *other))?;
        }
        splits += left.len() as u64;
    }

    // Phase 2: begin marker.
    let marker = IntervalIndexKey::begin(hashes.clone(), begin, id);
    put_marker(txn, namespace, &marker)?;

    // Phase 3: split the new interval at every breakpoint it crosses.
    for value in &plan.inner {
        put_marker(txn, namespace, &marker.with_value(*value))?;
    }

    // Phase 4: split intervals spanning across the new end.
    if !plan.end_exists && end != begin {
        for other in plan.run_below_end().iter().filter(|other| **other != id) {
            put_marker(txn, namespace, &IntervalIndexKey::begin(hashes.clone(), end, *other))?;
            splits += 1;
        }
    }

    // Phase 5: end marker.
    put_marker(txn, namespace, &marker.with_value(end).as_end())?;

    record(MetricsEvent::IndexDelta {
        namespace,
        inserts: 2 + plan.inner.len() as u64,
        removes: 0,
    });
    if splits > 0 {
        tracing::debug!(namespace, id, begin, end, splits, "interval breakpoints refined");
        record(MetricsEvent::BreakpointSplit { namespace, splits });
    }

    Ok(())
}

/// Delete every marker of `id` between its begin and end. Breakpoints other
/// objects were split at stay in place.
pub fn remove<T: Transaction>(
    txn: &mut T,
    model: &EntityModel,
    index: &IntervalIndexModel,
    row: &[Option<Value>],
    id: u64,
) -> Result<(), InternalError> {
    check_row(model, row)?;
    let Some((hashes, begin, end)) = bounds(model, index, row)? else {
        return Ok(());
    };
    if begin > end {
        return Ok(());
    }

    let namespace = index.namespace.as_str();
    let mut scan = GroupScan::new(namespace, &hashes);

    // Phase 1: collect.
    let mut doomed = Vec::new();
    let mut entry = scan.seek_value(&*txn, begin)?;
    while let Some(key) = entry {
        if key.value > end {
            break;
        }
        if key.id == id {
            doomed.push(key.to_raw());
        }
        entry = scan.next_entry(&*txn)?;
    }

    // Phase 2: delete.
    for key in &doomed {
        txn.delete(namespace, key)?;
    }

    record(MetricsEvent::IndexDelta {
        namespace,
        inserts: 0,
        removes: doomed.len() as u64,
    });

    Ok(())
}

fn put_marker<T: Transaction>(
    txn: &mut T,
    namespace: &str,
    key: &IntervalIndexKey,
) -> Result<(), InternalError> {
    txn.put(namespace, key.to_raw(), Vec::new())
}

// Group hashes and bounds of a row, or None when a bound is null.
fn bounds(
    model: &EntityModel,
    index: &IntervalIndexModel,
    row: &[Option<Value>],
) -> Result<Option<(Vec<u64>, i64, i64)>, InternalError> {
    let (Some(begin), Some(end)) = (slot(model, row, index.begin)?, slot(model, row, index.end)?)
    else {
        return Ok(None);
    };
    let begin = ordered(begin, index)?;
    let end = ordered(end, index)?;

    let hashes = index
        .hashed
        .iter()
        .map(|field| hash_value(slot(model, row, *field)?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some((hashes, begin, end)))
}

fn ordered(value: &Value, index: &IntervalIndexModel) -> Result<i64, InternalError> {
    value.as_ordered_i64().ok_or_else(|| {
        InternalError::index_unsupported(format!(
            "interval bound in '{}' holds a {} value",
            index.namespace,
            value.kind()
        ))
    })
}

///
/// Breakpoint
///
/// Every marker sitting on one value of a group.
///

#[derive(Debug)]
struct Breakpoint {
    value: i64,
    begins: Vec<u64>,
    ends: Vec<u64>,
}

impl Breakpoint {
    /// Objects covering `[value, next breakpoint)`.
    fn run(&self) -> Vec<u64> {
        self.begins
            .iter()
            .copied()
            .filter(|id| self.ends.binary_search(id).is_err())
            .collect()
    }
}

///
/// InsertPlan
///
/// Everything an insert needs to know about the group before it writes.
///

struct InsertPlan {
    /// Run at the greatest breakpoint below `begin`, when `begin` is new.
    left_run: Option<Vec<u64>>,
    /// Run at `begin`, when `begin` already is a breakpoint.
    begin_run: Option<Vec<u64>>,
    /// Existing breakpoints strictly inside `(begin, end)`, ascending.
    inner: Vec<i64>,
    /// Run at the last inner breakpoint.
    last_inner_run: Option<Vec<u64>>,
    end_exists: bool,
}

impl InsertPlan {
    fn read<V: ReadView + ?Sized>(
        view: &V,
        namespace: &str,
        hashes: &[u64],
        begin: i64,
        end: i64,
    ) -> Result<Self, InternalError> {
        let mut scan = GroupScan::new(namespace, hashes);
        let mut plan = Self {
            left_run: None,
            begin_run: None,
            inner: Vec::new(),
            last_inner_run: None,
            end_exists: false,
        };

        let mut entry = scan.seek_value(view, begin)?;
        while let Some(first) = entry {
            if first.value >= end && first.value != begin {
                if first.value == end {
                    plan.end_exists = true;
                }
                break;
            }

            let (point, next) = scan.read_breakpoint(view, first)?;
            if point.value == begin {
                plan.begin_run = Some(point.run());
                plan.end_exists = begin == end;
            } else {
                plan.inner.push(point.value);
                plan.last_inner_run = Some(point.run());
            }
            entry = next;
        }

        if plan.begin_run.is_none()
            && let Some(below) = scan.breakpoint_below(view, begin)?
            && let Some(first) = scan.seek_value(view, below)?
        {
            let (point, _) = scan.read_breakpoint(view, first)?;
            plan.left_run = Some(point.run());
        }

        Ok(plan)
    }

    /// Run at the greatest breakpoint below `end` once `begin` is in place.
    fn run_below_end(&self) -> Vec<u64> {
        self.last_inner_run
            .as_ref()
            .or(self.begin_run.as_ref())
            .or(self.left_run.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

///
/// GroupScan
///
/// Cursor over one hash group of an interval namespace.
///

struct GroupScan<'g> {
    hashes: &'g [u64],
    group: KeyPattern,
    cursor: Cursor,
}

impl<'g> GroupScan<'g> {
    fn new(namespace: &str, hashes: &'g [u64]) -> Self {
        Self {
            hashes,
            group: IntervalIndexKey::group_pattern(hashes),
            cursor: Cursor::new(namespace),
        }
    }

    /// First entry with a value `>= value`.
    fn seek_value<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        value: i64,
    ) -> Result<Option<IntervalIndexKey>, InternalError> {
        let kv = self
            .cursor
            .seek(view, &IntervalIndexKey::seek_key(self.hashes, value))?;
        self.decode(kv)
    }

    /// Greatest breakpoint `<= value`.
    fn breakpoint_at_most<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        value: i64,
    ) -> Result<Option<i64>, InternalError> {
        let kv = self
            .cursor
            .seek_before(view, &IntervalIndexKey::past_value_key(self.hashes, value))?;
        Ok(self.decode(kv)?.map(|key| key.value))
    }

    /// Greatest breakpoint `< value`.
    fn breakpoint_below<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        value: i64,
    ) -> Result<Option<i64>, InternalError> {
        let kv = self
            .cursor
            .seek_before(view, &IntervalIndexKey::seek_key(self.hashes, value))?;
        Ok(self.decode(kv)?.map(|key| key.value))
    }

    fn next_entry<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
    ) -> Result<Option<IntervalIndexKey>, InternalError> {
        let kv = self.cursor.next(view)?;
        self.decode(kv)
    }

    /// Read every marker on `first.value`; the cursor must sit on `first`.
    /// Also returns the first entry of the following breakpoint.
    fn read_breakpoint<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        first: IntervalIndexKey,
    ) -> Result<(Breakpoint, Option<IntervalIndexKey>), InternalError> {
        let mut point = Breakpoint {
            value: first.value,
            begins: Vec::new(),
            ends: Vec::new(),
        };

        let mut entry = Some(first);
        while let Some(key) = entry {
            if key.value != point.value {
                return Ok((point, Some(key)));
            }
            if key.end_of_range {
                point.ends.push(key.id);
            } else {
                point.begins.push(key.id);
            }
            entry = self.next_entry(view)?;
        }

        Ok((point, None))
    }

    fn decode(&self, kv: Option<KeyValue>) -> Result<Option<IntervalIndexKey>, InternalError> {
        match kv {
            Some(kv) if self.group.matches(&kv.key) => Ok(Some(IntervalIndexKey::try_from_raw(
                &kv.key,
                self.hashes.len(),
            )?)),
            _ => Ok(None),
        }
    }
}

///
/// IntervalQuery
///
/// Lazy containment lookup over one hash group: objects whose interval
/// contains a point, or overlaps a half-open range.
///

pub struct IntervalQuery<'a, V: ReadView + ?Sized> {
    view: &'a V,
    model: &'a EntityModel,
    index: &'a IntervalIndexModel,
    expected: Vec<Option<Value>>,
    hashes: Vec<u64>,
    start: i64,
    /// Exclusive upper bound of a range query; `None` for a point.
    until: Option<i64>,
    selection: FieldSelection,
    cursor: Option<Cursor>,
    lookahead: Option<IntervalIndexKey>,
    pending: VecDeque<u64>,
    seen: BTreeSet<u64>,
    done: bool,
}

impl<'a, V: ReadView + ?Sized> IntervalQuery<'a, V> {
    /// Objects whose interval contains `point`. `hashed` follows
    /// `index.hashed`.
    pub fn contains(
        view: &'a V,
        model: &'a EntityModel,
        index: &'a IntervalIndexModel,
        hashed: Vec<Option<Value>>,
        point: i64,
        selection: &FieldSelection,
    ) -> Result<Self, InternalError> {
        Self::new(view, model, index, hashed, point, None, selection)
    }

    /// Objects whose interval overlaps `[begin, end)`. An empty range
    /// (`begin == end`) behaves like a point query at `begin`.
    pub fn overlaps(
        view: &'a V,
        model: &'a EntityModel,
        index: &'a IntervalIndexModel,
        hashed: Vec<Option<Value>>,
        begin: i64,
        end: i64,
        selection: &FieldSelection,
    ) -> Result<Self, InternalError> {
        if begin > end {
            return Err(InternalError::query_unsupported(format!(
                "range [{begin}, {end}) ends before it begins"
            )));
        }
        let until = (end > begin).then_some(end);

        Self::new(view, model, index, hashed, begin, until, selection)
    }

    fn new(
        view: &'a V,
        model: &'a EntityModel,
        index: &'a IntervalIndexModel,
        expected: Vec<Option<Value>>,
        start: i64,
        until: Option<i64>,
        selection: &FieldSelection,
    ) -> Result<Self, InternalError> {
        if expected.len() != index.hashed.len() {
            return Err(InternalError::query_unsupported(format!(
                "index '{}' hashes {} fields, got {} values",
                index.namespace,
                index.hashed.len(),
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
            hashes,
            start,
            until,
            selection: selection.with(&index.hashed),
            cursor: None,
            lookahead: None,
            pending: VecDeque::new(),
            seen: BTreeSet::new(),
            done: false,
        })
    }

    pub fn close(&mut self) {
        self.done = true;
        self.cursor = None;
        self.pending.clear();
    }

    fn advance(&mut self) -> Result<Option<Entity>, InternalError> {
        loop {
            let Some(id) = self.pending.pop_front() else {
                if self.load_breakpoint()? {
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
                tracing::warn!(namespace, id, "interval marker without object");
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

    // Queue the run of the next breakpoint in scope; false when done.
    fn load_breakpoint(&mut self) -> Result<bool, InternalError> {
        let mut scan = GroupScan::new(&self.index.namespace, &self.hashes);

        let first = match self.cursor.take() {
            // Phase 1: left border at the start value.
            None => match scan.breakpoint_at_most(self.view, self.start)? {
                Some(border) => scan.seek_value(self.view, border)?,
                None => match self.until {
                    Some(until) => scan
                        .seek_value(self.view, self.start)?
                        .filter(|first| first.value < until),
                    None => None,
                },
            },
            // Phase 2: following breakpoints of a range query.
            Some(cursor) => {
                scan.cursor = cursor;
                match (self.lookahead.take(), self.until) {
                    (Some(next), Some(until)) if next.value < until => Some(next),
                    _ => None,
                }
            }
        };
        let Some(first) = first else {
            return Ok(false);
        };

        let (point, next) = scan.read_breakpoint(self.view, first)?;
        self.pending.extend(point.run());
        self.lookahead = next;
        self.cursor = Some(scan.cursor);

        Ok(true)
    }

    fn verify(&self, entity: &Entity) -> Result<bool, InternalError> {
        for (field, expected) in self.index.hashed.iter().zip(&self.expected) {
            if !eq_for_index(entity.get(*field)?, expected.as_ref()) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl<V: ReadView + ?Sized> Iterator for IntervalQuery<'_, V> {
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
