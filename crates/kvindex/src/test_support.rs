use crate::{
    db::store::{KvStore, MemoryStore},
    model::EntityModel,
    value::{FieldKind, Value},
};

pub(crate) fn file_model() -> EntityModel {
    EntityModel::builder("app.file")
        .field(1, "name", FieldKind::Text)
        .field(2, "size", FieldKind::Int)
        .field(3, "content_type", FieldKind::Text)
        .field(4, "begin", FieldKind::Date)
        .field(5, "end", FieldKind::Date)
        .hash_index(&["size", "name"])
        .prefix_index(&["name", "content_type"])
        .interval_index(&["size"], "begin", "end")
        .build()
        .expect("valid model")
}

/// A store with every namespace of `model` created.
pub(crate) fn open_store(model: &EntityModel) -> MemoryStore {
    let store = MemoryStore::new();
    for namespace in model.namespaces() {
        store.create_namespace(namespace).expect("create namespace");
    }
    store
}

pub(crate) fn file_row(
    name: Option<&str>,
    size: Option<i64>,
    content_type: Option<&str>,
    span: Option<(i64, i64)>,
) -> Vec<Option<Value>> {
    vec![
        name.map(Value::from),
        size.map(Value::Int),
        content_type.map(Value::from),
        span.map(|(b, _)| Value::Date(b)),
        span.map(|(_, e)| Value::Date(e)),
    ]
}
