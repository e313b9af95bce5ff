use crate::{
    MAX_INDEX_FIELDS,
    error::{ErrorOrigin, InternalError},
    model::{
        FieldId, FieldModel, HashIndexModel, IntervalIndexModel, NAMESPACE_SEPARATOR,
        PrefixIndexModel, SchemaError,
    },
    value::{FieldKind, Value},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// EntityModel
///
/// Runtime descriptor for one entity type. Built through
/// [`EntityModelBuilder`]; immutable once built.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    /// Entity name; also the namespace holding its primary field keys.
    pub name: String,
    /// Ordered field list (authoritative for value slots).
    pub fields: Vec<FieldModel>,
    pub hash_indexes: Vec<HashIndexModel>,
    pub prefix_indexes: Vec<PrefixIndexModel>,
    pub interval_indexes: Vec<IntervalIndexModel>,
    positions: BTreeMap<FieldId, usize>,
}

impl EntityModel {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> EntityModelBuilder {
        EntityModelBuilder {
            name: name.into(),
            fields: Vec::new(),
            hash_indexes: Vec::new(),
            prefix_indexes: Vec::new(),
            interval_indexes: Vec::new(),
        }
    }

    /// Namespace holding the primary field keys.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.name
    }

    /// Slot position of a field in `fields` (and in entity value vectors).
    #[must_use]
    pub fn position(&self, id: FieldId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldModel> {
        self.position(id).map(|pos| &self.fields[pos])
    }

    pub fn field_by_name(&self, name: &str) -> Result<&FieldModel, InternalError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| {
                InternalError::not_found(
                    ErrorOrigin::Schema,
                    format!("field '{}.{name}'", self.name),
                )
            })
    }

    pub(crate) fn kind_of(&self, id: FieldId) -> Result<FieldKind, InternalError> {
        self.field(id).map(|f| f.kind).ok_or_else(|| {
            InternalError::not_found(
                ErrorOrigin::Schema,
                format!("field id {id} on '{}'", self.name),
            )
        })
    }

    /// Look up a hash index by the set of field names it covers.
    pub fn hash_index(&self, fields: &[&str]) -> Result<&HashIndexModel, InternalError> {
        let wanted = self.field_set(fields)?;
        self.hash_indexes
            .iter()
            .find(|idx| idx.fields.iter().copied().collect::<BTreeSet<_>>() == wanted)
            .ok_or_else(|| self.index_not_found("hash", fields))
    }

    /// Look up a prefix index by the set of field names it covers.
    pub fn prefix_index(&self, fields: &[&str]) -> Result<&PrefixIndexModel, InternalError> {
        let wanted = self.field_set(fields)?;
        self.prefix_indexes
            .iter()
            .find(|idx| idx.fields.iter().copied().collect::<BTreeSet<_>>() == wanted)
            .ok_or_else(|| self.index_not_found("prefix", fields))
    }

    /// Look up an interval index by its hashed fields and its bounds.
    pub fn interval_index(
        &self,
        hashed: &[&str],
        begin: &str,
        end: &str,
    ) -> Result<&IntervalIndexModel, InternalError> {
        let wanted = self.field_set(hashed)?;
        let begin = self.field_by_name(begin)?.id;
        let end = self.field_by_name(end)?.id;

        self.interval_indexes
            .iter()
            .find(|idx| {
                idx.begin == begin
                    && idx.end == end
                    && idx.hashed.iter().copied().collect::<BTreeSet<_>>() == wanted
            })
            .ok_or_else(|| self.index_not_found("interval", hashed))
    }

    /// Every namespace owned by this entity (data first, then indexes).
    #[must_use]
    pub fn namespaces(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str()];
        out.extend(self.hash_indexes.iter().map(|i| i.namespace.as_str()));
        out.extend(self.prefix_indexes.iter().map(|i| i.namespace.as_str()));
        out.extend(self.interval_indexes.iter().map(|i| i.namespace.as_str()));
        out
    }

    /// Build a row in field order from named values; unnamed fields are null.
    pub fn row<'n>(
        &self,
        values: impl IntoIterator<Item = (&'n str, Value)>,
    ) -> Result<Vec<Option<Value>>, InternalError> {
        let mut row = vec![None; self.fields.len()];
        for (name, value) in values {
            let field = self.field_by_name(name)?;
            if value.kind() != field.kind {
                return Err(InternalError::data_unsupported(format!(
                    "field '{}.{name}' is {}, got {}",
                    self.name,
                    field.kind,
                    value.kind()
                )));
            }
            if let Some(pos) = self.position(field.id) {
                row[pos] = Some(value);
            }
        }

        Ok(row)
    }

    fn field_set(&self, names: &[&str]) -> Result<BTreeSet<FieldId>, InternalError> {
        names
            .iter()
            .map(|name| self.field_by_name(name).map(|f| f.id))
            .collect()
    }

    fn index_not_found(&self, kind: &str, fields: &[&str]) -> InternalError {
        InternalError::not_found(
            ErrorOrigin::Schema,
            format!("{kind} index on '{}' ({})", self.name, fields.join(", ")),
        )
    }
}

///
/// EntityModelBuilder
///

#[derive(Clone, Debug)]
pub struct EntityModelBuilder {
    name: String,
    fields: Vec<FieldModel>,
    hash_indexes: Vec<Vec<String>>,
    prefix_indexes: Vec<Vec<String>>,
    interval_indexes: Vec<(Vec<String>, String, String)>,
}

impl EntityModelBuilder {
    #[must_use]
    pub fn field(mut self, id: u16, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldModel {
            id: FieldId(id),
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn hash_index(mut self, fields: &[&str]) -> Self {
        self.hash_indexes.push(to_owned(fields));
        self
    }

    #[must_use]
    pub fn prefix_index(mut self, fields: &[&str]) -> Self {
        self.prefix_indexes.push(to_owned(fields));
        self
    }

    #[must_use]
    pub fn interval_index(mut self, hashed: &[&str], begin: &str, end: &str) -> Self {
        self.interval_indexes
            .push((to_owned(hashed), begin.to_string(), end.to_string()));
        self
    }

    pub fn build(self) -> Result<EntityModel, SchemaError> {
        // Phase 1: fields.
        if self.name.is_empty() {
            return Err(SchemaError::EmptyEntityName);
        }

        let mut positions = BTreeMap::new();
        let mut names = BTreeSet::new();
        for (pos, field) in self.fields.iter().enumerate() {
            if positions.insert(field.id, pos).is_some() {
                return Err(SchemaError::DuplicateFieldId {
                    entity: self.name.clone(),
                    id: *field.id,
                });
            }
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateFieldName {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        // Phase 2: index declarations resolve to canonical field id lists.
        let mut seen_namespaces = BTreeSet::new();

        let mut hash_indexes = Vec::with_capacity(self.hash_indexes.len());
        for names in &self.hash_indexes {
            let fields = self.resolve(names, "hash", FieldKind::is_hashable)?;
            self.check_hashed_len(fields.len())?;
            let namespace = self.index_namespace("hash", &fields);
            hash_indexes.push(HashIndexModel { namespace, fields });
        }

        let mut prefix_indexes = Vec::with_capacity(self.prefix_indexes.len());
        for names in &self.prefix_indexes {
            let fields = self.resolve(names, "prefix", |k| k == FieldKind::Text)?;
            let namespace = self.index_namespace("prefix", &fields);
            prefix_indexes.push(PrefixIndexModel { namespace, fields });
        }

        let mut interval_indexes = Vec::with_capacity(self.interval_indexes.len());
        for (hashed, begin, end) in &self.interval_indexes {
            let hashed = if hashed.is_empty() {
                Vec::new()
            } else {
                self.resolve(hashed, "interval", FieldKind::is_hashable)?
            };
            self.check_hashed_len(hashed.len())?;
            let begin = self.resolve_one(begin, "interval", FieldKind::is_orderable)?;
            let end = self.resolve_one(end, "interval", FieldKind::is_orderable)?;

            let mut path = hashed.clone();
            path.push(begin);
            path.push(end);
            let namespace = self.index_namespace("interval", &path);

            interval_indexes.push(IntervalIndexModel {
                namespace,
                hashed,
                begin,
                end,
            });
        }

        for namespace in hash_indexes
            .iter()
            .map(|i| &i.namespace)
            .chain(prefix_indexes.iter().map(|i| &i.namespace))
            .chain(interval_indexes.iter().map(|i| &i.namespace))
        {
            if !seen_namespaces.insert(namespace.clone()) {
                return Err(SchemaError::DuplicateIndex(namespace.clone()));
            }
        }

        Ok(EntityModel {
            name: self.name,
            fields: self.fields,
            hash_indexes,
            prefix_indexes,
            interval_indexes,
            positions,
        })
    }

    fn resolve(
        &self,
        names: &[String],
        index: &'static str,
        allowed: impl Fn(FieldKind) -> bool,
    ) -> Result<Vec<FieldId>, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::EmptyIndex {
                entity: self.name.clone(),
            });
        }

        let mut ids = BTreeSet::new();
        for name in names {
            let field = self
                .fields
                .iter()
                .find(|f| &f.name == name)
                .ok_or_else(|| SchemaError::UnknownField {
                    entity: self.name.clone(),
                    field: name.clone(),
                })?;
            if !allowed(field.kind) {
                return Err(SchemaError::UnsupportedFieldKind {
                    entity: self.name.clone(),
                    field: name.clone(),
                    kind: field.kind,
                    index,
                });
            }
            ids.insert(field.id);
        }

        Ok(ids.into_iter().collect())
    }

    fn resolve_one(
        &self,
        name: &str,
        index: &'static str,
        allowed: impl Fn(FieldKind) -> bool,
    ) -> Result<FieldId, SchemaError> {
        let ids = self.resolve(&[name.to_string()], index, allowed)?;
        Ok(ids[0])
    }

    fn check_hashed_len(&self, count: usize) -> Result<(), SchemaError> {
        if count > MAX_INDEX_FIELDS {
            return Err(SchemaError::TooManyIndexFields {
                entity: self.name.clone(),
                count,
                max: MAX_INDEX_FIELDS,
            });
        }

        Ok(())
    }

    fn index_namespace(&self, kind: &str, fields: &[FieldId]) -> String {
        let mut out = format!("{}{NAMESPACE_SEPARATOR}{kind}", self.name);
        for id in fields {
            let name = self
                .fields
                .iter()
                .find(|f| f.id == *id)
                .map_or_else(|| id.to_string(), |f| f.name.clone());
            out.push(NAMESPACE_SEPARATOR);
            out.push_str(&name);
        }
        out
    }
}

fn to_owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(ToString::to_string).collect()
}
