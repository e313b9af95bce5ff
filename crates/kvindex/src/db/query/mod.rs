//! Module: db::query
//! Responsibility: the single lookup entry point. Resolves a [`Filter`]
//! against the schema registry and returns a lazy entity iterator.
//! Does not own: index layouts or verification rules.
//! Boundary: callers never construct index iterators directly.

mod filter;
mod scan;


pub use filter::{Filter, HashFilter, IntervalFilter, IntervalTarget, PrefixFilter};
pub use scan::ScanQuery;

use crate::{
    db::{
        data::{Entity, FieldSelection},
        index::{hash::HashQuery, interval::IntervalQuery, prefix::PrefixQuery},
        store::ReadView,
    },
    error::InternalError,
    model::{EntityModel, FieldId, SchemaRegistry},
    value::Value,
};

///
/// EntityIter
///
/// Lazy result of [`find`]. Yields the first error once and then stops.
///

pub enum EntityIter<'a, V: ReadView + ?Sized> {
    All(ScanQuery<'a, V>),
    Hash(HashQuery<'a, V>),
    Prefix(PrefixQuery<'a, V>),
    Interval(IntervalQuery<'a, V>),
}

impl<V: ReadView + ?Sized> EntityIter<'_, V> {
    /// Release the iterator's position; later calls yield nothing.
    pub fn close(&mut self) {
        match self {
            Self::All(iter) => iter.close(),
            Self::Hash(iter) => iter.close(),
            Self::Prefix(iter) => iter.close(),
            Self::Interval(iter) => iter.close(),
        }
    }

    /// Drain the ids of the remaining matches.
    pub fn ids(self) -> Result<Vec<u64>, InternalError> {
        self.map(|entity| entity.map(|e| e.id())).collect()
    }
}

impl<V: ReadView + ?Sized> Iterator for EntityIter<'_, V> {
    type Item = Result<Entity, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::All(iter) => iter.next(),
            Self::Hash(iter) => iter.next(),
            Self::Prefix(iter) => iter.next(),
            Self::Interval(iter) => iter.next(),
        }
    }
}

/// Run `filter` against `entity`. Index filters must name a declared index,
/// else `NotFound`.
pub fn find<'a, V: ReadView + ?Sized>(
    view: &'a V,
    registry: &'a SchemaRegistry,
    entity: &str,
    filter: &Filter,
    selection: &FieldSelection,
) -> Result<EntityIter<'a, V>, InternalError> {
    let model = registry.entity(entity)?;
    tracing::trace!(entity, ?filter, "find");

    let iter = match filter {
        Filter::All => EntityIter::All(ScanQuery::new(view, model, selection)),
        Filter::Hash(filter) => {
            let names: Vec<&str> = filter.fields.iter().map(|(name, _)| name.as_str()).collect();
            let index = model.hash_index(&names)?;
            let expected = arrange(model, &index.fields, &filter.fields)?;

            EntityIter::Hash(HashQuery::new(view, model, index, expected, selection)?)
        }
        Filter::Prefix(filter) => {
            let names: Vec<&str> = filter.fields.iter().map(String::as_str).collect();
            let index = model.prefix_index(&names)?;

            EntityIter::Prefix(PrefixQuery::new(view, model, index, &filter.phrase, selection))
        }
        Filter::Interval(filter) => {
            let names: Vec<&str> = filter.hashed.iter().map(|(name, _)| name.as_str()).collect();
            let index = model.interval_index(&names, &filter.begin_field, &filter.end_field)?;
            let hashed = arrange(model, &index.hashed, &filter.hashed)?;

            let query = match filter.target {
                IntervalTarget::Point(point) => {
                    IntervalQuery::contains(view, model, index, hashed, point, selection)?
                }
                IntervalTarget::Range { begin, end } => {
                    IntervalQuery::overlaps(view, model, index, hashed, begin, end, selection)?
                }
            };
            EntityIter::Interval(query)
        }
    };

    Ok(iter)
}

// Reorder named filter values into index field order, checking kinds.
fn arrange(
    model: &EntityModel,
    index_fields: &[FieldId],
    given: &[(String, Option<Value>)],
) -> Result<Vec<Option<Value>>, InternalError> {
    let mut out = Vec::with_capacity(index_fields.len());

    for field_id in index_fields {
        let field = model
            .field(*field_id)
            .ok_or_else(|| InternalError::query_unsupported(format!("unknown field {field_id}")))?;
        let (_, value) = given
            .iter()
            .find(|(name, _)| *name == field.name)
            .ok_or_else(|| {
                InternalError::query_unsupported(format!("missing value for '{}'", field.name))
            })?;

        if let Some(value) = value
            && value.kind() != field.kind
        {
            return Err(InternalError::query_unsupported(format!(
                "field '{}' is {}, filter value is {}",
                field.name,
                field.kind,
                value.kind()
            )));
        }
        out.push(value.clone());
    }

    Ok(out)
}
