use crate::{
    error::InternalError,
    model::{EntityModel, FieldId},
    value::Value,
};

///
/// FieldSelection
///
/// Which fields a read materializes. Unselected fields stay unloaded.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldSelection {
    #[default]
    All,
    Only(Vec<FieldId>),
}

impl FieldSelection {
    #[must_use]
    pub fn contains(&self, field: FieldId) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => fields.contains(&field),
        }
    }

    /// Union of two selections.
    #[must_use]
    pub fn with(&self, extra: &[FieldId]) -> Self {
        match self {
            Self::All => Self::All,
            Self::Only(fields) => {
                let mut fields = fields.clone();
                for field in extra {
                    if !fields.contains(field) {
                        fields.push(*field);
                    }
                }
                Self::Only(fields)
            }
        }
    }
}

///
/// Entity
///
/// One materialized object. Slots follow the model's field order; a slot is
/// either loaded (null or a value) or unloaded.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entity {
    id: u64,
    fields: Vec<FieldId>,
    values: Vec<Option<Value>>,
    loaded: Vec<bool>,
}

impl Entity {
    /// An entity with every slot unloaded.
    pub(crate) fn unloaded(model: &EntityModel, id: u64) -> Self {
        let len = model.fields.len();

        Self {
            id,
            fields: model.fields.iter().map(|f| f.id).collect(),
            values: vec![None; len],
            loaded: vec![false; len],
        }
    }

    /// Mark every selected slot loaded (null until a field key fills it).
    pub(crate) fn select(&mut self, selection: &FieldSelection) {
        for (slot, field) in self.fields.iter().enumerate() {
            if selection.contains(*field) {
                self.loaded[slot] = true;
            }
        }
    }

    pub(crate) fn set(&mut self, field: FieldId, value: Value) {
        if let Some(slot) = self.slot(field) {
            self.values[slot] = Some(value);
            self.loaded[slot] = true;
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Field value; `Ok(None)` is a null field.
    pub fn get(&self, field: FieldId) -> Result<Option<&Value>, InternalError> {
        let slot = self
            .slot(field)
            .ok_or_else(|| InternalError::data_unsupported(format!("unknown field {field}")))?;
        if !self.loaded[slot] {
            return Err(InternalError::data_unsupported(format!(
                "field {field} of object {} was not loaded",
                self.id
            )));
        }

        Ok(self.values[slot].as_ref())
    }

    /// Field value looked up by name.
    pub fn get_named(
        &self,
        model: &EntityModel,
        name: &str,
    ) -> Result<Option<&Value>, InternalError> {
        self.get(model.field_by_name(name)?.id)
    }

    #[must_use]
    pub fn is_loaded(&self, field: FieldId) -> bool {
        self.slot(field).is_some_and(|slot| self.loaded[slot])
    }

    /// Slot values in model field order; unloaded slots read as null.
    #[must_use]
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }

    fn slot(&self, field: FieldId) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }
}
