use crate::{
    db::{
        data::{Entity, FieldSelection, ObjectReader},
        store::{Cursor, KeyValue, ReadView},
    },
    error::InternalError,
    model::EntityModel,
    obs::{MetricsEvent, sink::record},
};

///
/// ScanQuery
///
/// Full table scan: every object in id order.
///

pub struct ScanQuery<'a, V: ReadView + ?Sized> {
    view: &'a V,
    model: &'a EntityModel,
    selection: FieldSelection,
    cursor: Cursor,
    next_begin: Option<KeyValue>,
    started: bool,
    done: bool,
}

impl<'a, V: ReadView + ?Sized> ScanQuery<'a, V> {
    #[must_use]
    pub fn new(view: &'a V, model: &'a EntityModel, selection: &FieldSelection) -> Self {
        Self {
            view,
            model,
            selection: selection.clone(),
            cursor: Cursor::new(model.namespace()),
            next_begin: None,
            started: false,
            done: false,
        }
    }

    pub fn close(&mut self) {
        self.done = true;
        self.next_begin = None;
    }

    fn advance(&mut self) -> Result<Option<Entity>, InternalError> {
        let begin = if self.started {
            self.next_begin.take()
        } else {
            self.started = true;
            self.cursor.seek_first(self.view)?
        };
        let Some(begin) = begin else {
            return Ok(None);
        };

        let reader = ObjectReader::new(self.model, &self.selection);
        let (entity, next) = reader.read(self.view, &mut self.cursor, &begin)?;
        self.next_begin = next;

        record(MetricsEvent::RowsScanned {
            namespace: self.model.namespace(),
            rows: 1,
        });

        Ok(Some(entity))
    }
}

impl<V: ReadView + ?Sized> Iterator for ScanQuery<'_, V> {
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
