use crate::{
    db::store::{KeyValue, ReadView, Seek},
    error::InternalError,
};

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Backward,
}

///
/// Cursor
///
/// Positioned iteration over one namespace. The cursor remembers only the
/// key it last returned and re-seeks the view on every step, so it never
/// holds a borrow of the view between calls: a transaction can be written
/// while a cursor over it is open, and later steps observe those writes.
///

#[derive(Clone, Debug)]
pub struct Cursor {
    namespace: String,
    position: Option<Vec<u8>>,
}

impl Cursor {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key the cursor currently points at, if positioned.
    #[must_use]
    pub fn key(&self) -> Option<&[u8]> {
        self.position.as_deref()
    }

    /// Position at the first key `>= key`.
    pub fn seek<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        key: &[u8],
    ) -> Result<Option<KeyValue>, InternalError> {
        self.reposition(view, Seek::AtOrAfter(key))
    }

    pub fn seek_first<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
    ) -> Result<Option<KeyValue>, InternalError> {
        self.reposition(view, Seek::First)
    }

    /// Position at the last key `< key`.
    pub fn seek_before<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        key: &[u8],
    ) -> Result<Option<KeyValue>, InternalError> {
        self.reposition(view, Seek::Before(key))
    }

    pub fn next<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
    ) -> Result<Option<KeyValue>, InternalError> {
        self.step(view, Direction::Forward)
    }

    /// Move one key in `direction`. An unpositioned (exhausted) cursor stays
    /// exhausted.
    pub fn step<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        direction: Direction,
    ) -> Result<Option<KeyValue>, InternalError> {
        let Some(current) = self.position.take() else {
            return Ok(None);
        };

        match direction {
            Direction::Forward => self.reposition(view, Seek::After(&current)),
            Direction::Backward => self.reposition(view, Seek::Before(&current)),
        }
    }

    fn reposition<V: ReadView + ?Sized>(
        &mut self,
        view: &V,
        seek: Seek<'_>,
    ) -> Result<Option<KeyValue>, InternalError> {
        let found = view.seek(&self.namespace, seek)?;
        self.position = found.as_ref().map(|kv| kv.key.clone());

        Ok(found)
    }
}
