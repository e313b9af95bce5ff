#![allow(dead_code)]

use kvindex::{
    db::store::{Cursor, ReadView},
    prelude::*,
};

pub const DOC: &str = "app.doc";

/// Documents with a title/kind hash index, a title/tags prefix index and a
/// start/stop interval index grouped by kind.
pub fn doc_model() -> EntityModel {
    EntityModel::builder(DOC)
        .field(1, "title", FieldKind::Text)
        .field(2, "kind", FieldKind::Int)
        .field(3, "tags", FieldKind::Text)
        .field(4, "start", FieldKind::Date)
        .field(5, "stop", FieldKind::Date)
        .hash_index(&["title", "kind"])
        .prefix_index(&["title", "tags"])
        .interval_index(&["kind"], "start", "stop")
        .build()
        .expect("valid model")
}

pub fn open_db(config: DbConfig) -> Db<MemoryStore> {
    let registry = SchemaRegistry::builder()
        .entity(doc_model())
        .build()
        .expect("registry");

    Db::open(MemoryStore::new(), registry, config).expect("open")
}

pub fn titled(title: &str, tags: Option<&str>) -> Vec<Option<Value>> {
    let mut values = vec![("title", Value::from(title))];
    if let Some(tags) = tags {
        values.push(("tags", Value::from(tags)));
    }

    doc_model().row(values).expect("row")
}

pub fn span(kind: i64, start: i64, stop: i64) -> Vec<Option<Value>> {
    doc_model()
        .row([
            ("kind", Value::Int(kind)),
            ("start", Value::Date(start)),
            ("stop", Value::Date(stop)),
        ])
        .expect("row")
}

pub fn sorted(filter: &Filter, db: &Db<MemoryStore>) -> Vec<u64> {
    let mut ids = db
        .find(DOC, filter, &FieldSelection::All)
        .expect("find")
        .ids()
        .expect("ids");
    ids.sort_unstable();
    ids
}

pub fn search(db: &Db<MemoryStore>, phrase: &str) -> Vec<u64> {
    sorted(&PrefixFilter::new(&["title", "tags"], phrase).into(), db)
}

/// Every (key, value) pair of one namespace.
pub fn dump<V: ReadView>(view: &V, namespace: &str) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursor = Cursor::new(namespace);
    let mut out = Vec::new();
    let mut next = cursor.seek_first(view).expect("seek");
    while let Some(kv) = next {
        out.push((kv.key, kv.value));
        next = cursor.next(view).expect("next");
    }
    out
}
