use crate::{
    config::DbConfig,
    db::{
        Db,
        data::FieldSelection,
        maintenance::{self, SchemaMode},
        query::{Filter, HashFilter, IntervalFilter, PrefixFilter},
        sequence::{self, SEQUENCE_NAMESPACE},
        store::{Cursor, KvStore, MemoryStore, ReadView, Seek, Transaction},
    },
    model::{EntityModel, SchemaRegistry},
    test_support::{file_model, file_row},
    value::{FieldKind, Value},
};

const FILE: &str = "app.file";

fn registry_of(model: EntityModel) -> SchemaRegistry {
    SchemaRegistry::builder()
        .entity(model)
        .build()
        .expect("registry")
}

fn open_db() -> Db<MemoryStore> {
    Db::open(MemoryStore::new(), registry_of(file_model()), DbConfig::default()).expect("open")
}

fn seed(db: &Db<MemoryStore>) {
    let mut txn = db.begin().expect("begin");
    for row in [
        file_row(Some("hello world"), Some(10), Some("text/plain"), Some((0, 10))),
        file_row(Some("help"), Some(10), Some("text/html"), Some((5, 15))),
        file_row(Some("misc"), Some(20), None, Some((0, 100))),
    ] {
        txn.create(FILE, &row).expect("create");
    }
    txn.commit().expect("commit");
}

fn search(db: &Db<MemoryStore>, phrase: &str) -> Vec<u64> {
    let filter = PrefixFilter::new(&["name", "content_type"], phrase).into();
    let mut ids = db
        .find(FILE, &filter, &FieldSelection::All)
        .expect("find")
        .ids()
        .expect("ids");
    ids.sort_unstable();
    ids
}

fn key_count<V: ReadView>(view: &V, namespace: &str) -> usize {
    let mut cursor = Cursor::new(namespace);
    let mut count = 0;
    let mut next = cursor.seek_first(view).expect("seek");
    while next.is_some() {
        count += 1;
        next = cursor.next(view).expect("next");
    }
    count
}

fn clear_namespace(store: &MemoryStore, namespace: &str) {
    let mut txn = store.begin_transaction().expect("begin");
    while let Some(kv) = txn.seek(namespace, Seek::First).expect("seek") {
        txn.delete(namespace, &kv.key).expect("delete");
    }
    txn.commit().expect("commit");
}

#[test]
fn open_creates_every_namespace() {
    let db = open_db();
    let mut expected: Vec<String> = file_model()
        .namespaces()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    expected.push(SEQUENCE_NAMESPACE.to_string());
    expected.sort();

    assert_eq!(db.store().list_namespaces().expect("list"), expected);
    db.validate().expect("fresh store is consistent");
}

#[test]
fn create_allocates_ids_from_one() {
    let db = open_db();
    seed(&db);

    let ids = db
        .find(FILE, &Filter::All, &FieldSelection::All)
        .expect("find")
        .ids()
        .expect("ids");
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(sequence::current(db.store(), FILE).expect("sequence"), 3);

    let entity = db
        .get(FILE, 2, &FieldSelection::All)
        .expect("get")
        .expect("object 2");
    let name = entity.get_named(&file_model(), "name").expect("name");
    assert_eq!(name, Some(&Value::from("help")));
}

#[test]
fn writes_are_visible_inside_the_transaction_only() {
    let db = open_db();
    let mut txn = db.begin().expect("begin");
    let row = file_row(Some("draft"), Some(1), None, None);
    let id = txn.create(FILE, &row).expect("create");

    let filter = PrefixFilter::new(&["name", "content_type"], "dra").into();
    let seen = txn
        .find(FILE, &filter, &FieldSelection::All)
        .expect("find")
        .ids()
        .expect("ids");
    assert_eq!(seen, vec![id]);
    assert!(db.get(FILE, id, &FieldSelection::All).expect("get").is_none());

    drop(txn);
    assert!(search(&db, "dra").is_empty());
    assert_eq!(sequence::current(db.store(), FILE).expect("sequence"), 0);
}

#[test]
fn failed_write_rolls_back_the_whole_transaction() {
    let db = open_db();
    let mut txn = db.begin().expect("begin");
    txn.create(FILE, &file_row(Some("ok"), Some(1), None, Some((0, 5))))
        .expect("valid create");

    let err = txn
        .create(FILE, &file_row(Some("bad"), Some(1), None, Some((10, 5))))
        .expect_err("inverted interval");
    assert!(err.message.contains("ends before it begins"), "{err}");
    assert!(txn.commit().is_err());

    for namespace in db.store().list_namespaces().expect("list") {
        assert_eq!(key_count(db.store(), &namespace), 0, "{namespace}");
    }
}

#[test]
fn update_moves_index_entries() {
    let db = open_db();
    seed(&db);

    let mut txn = db.begin().expect("begin");
    txn.update(
        FILE,
        2,
        &file_row(Some("goodbye"), Some(30), Some("text/html"), Some((50, 60))),
    )
    .expect("update");
    txn.commit().expect("commit");

    assert_eq!(search(&db, "help"), Vec::<u64>::new());
    assert_eq!(search(&db, "good"), vec![2]);
    assert_eq!(search(&db, "html"), vec![2]);

    let by_hash = HashFilter::new()
        .equals("size", 30_i64)
        .equals("name", "GOODBYE")
        .into();
    let ids = db
        .find(FILE, &by_hash, &FieldSelection::All)
        .expect("find")
        .ids()
        .expect("ids");
    assert_eq!(ids, vec![2]);

    let at = |point| {
        let filter = IntervalFilter::contains("begin", "end", point)
            .group("size", Some(Value::Int(30)))
            .into();
        db.find(FILE, &filter, &FieldSelection::All)
            .expect("find")
            .ids()
            .expect("ids")
    };
    assert_eq!(at(55), vec![2]);
    assert_eq!(at(7), Vec::<u64>::new());
}

#[test]
fn update_of_missing_object_is_not_found() {
    let db = open_db();
    let mut txn = db.begin().expect("begin");
    let err = txn
        .update(FILE, 9, &file_row(None, None, None, None))
        .expect_err("missing");
    assert!(err.is_not_found());
}

#[test]
fn remove_deletes_object_and_index_entries() {
    let db = open_db();
    seed(&db);

    let mut txn = db.begin().expect("begin");
    assert!(txn.remove(FILE, 1).expect("remove"));
    assert!(!txn.remove(FILE, 1).expect("second remove"));
    txn.commit().expect("commit");

    assert!(db.get(FILE, 1, &FieldSelection::All).expect("get").is_none());
    assert_eq!(search(&db, "hel"), vec![2]);
    db.validate().expect("still consistent");
}

#[test]
fn insert_with_explicit_id_advances_the_sequence() {
    let db = open_db();
    let mut txn = db.begin().expect("begin");
    txn.insert(FILE, 5, &file_row(Some("five"), None, None, None))
        .expect("insert");
    assert!(txn.insert(FILE, 5, &file_row(None, None, None, None)).is_err());
    txn.commit().expect_err("failed insert poisons the transaction");

    let mut txn = db.begin().expect("begin");
    txn.insert(FILE, 5, &file_row(Some("five"), None, None, None))
        .expect("insert");
    let next = txn
        .create(FILE, &file_row(Some("six"), None, None, None))
        .expect("create");
    txn.commit().expect("commit");
    assert_eq!(next, 6);
}

#[test]
fn sequence_rejects_malformed_values() {
    let store = MemoryStore::new();
    store.create_namespace(SEQUENCE_NAMESPACE).expect("namespace");

    let mut txn = store.begin_transaction().expect("begin");
    assert_eq!(sequence::next_id(&mut txn, FILE).expect("first"), 1);
    assert_eq!(sequence::next_id(&mut txn, FILE).expect("second"), 2);
    assert_eq!(sequence::next_id(&mut txn, "other").expect("other"), 1);

    txn.put(SEQUENCE_NAMESPACE, FILE.as_bytes().to_vec(), vec![1, 2, 3])
        .expect("put");
    let err = sequence::next_id(&mut txn, FILE).expect_err("short value");
    assert!(err.is_malformed_key());
}

#[test]
fn validation_mode_reports_missing_namespaces() {
    let store = MemoryStore::new();
    let registry = registry_of(file_model());
    let config = DbConfig::default();

    let err = maintenance::ensure_schema(&store, &registry, SchemaMode::Validation, &config)
        .expect_err("nothing exists yet");
    assert!(err.is_inconsistent());

    maintenance::ensure_schema(&store, &registry, SchemaMode::Creation, &config).expect("create");
    maintenance::ensure_schema(&store, &registry, SchemaMode::Validation, &config)
        .expect("everything exists now");
}

#[test]
fn validate_reports_empty_hash_index_over_data() {
    let db = open_db();
    seed(&db);

    let namespace = file_model().hash_indexes[0].namespace.clone();
    clear_namespace(db.store(), &namespace);
    assert!(db.validate().expect_err("hash index emptied").is_inconsistent());

    assert_eq!(db.rebuild_index(FILE, &namespace).expect("rebuild"), 3);
    db.validate().expect("rebuilt");
}

#[test]
fn validate_reports_index_entries_without_data() {
    let db = open_db();
    seed(&db);

    clear_namespace(db.store(), FILE);
    assert!(db.validate().expect_err("data emptied").is_inconsistent());
}

#[test]
fn validate_reports_undeclared_index_namespace() {
    let db = open_db();
    db.store()
        .create_namespace("app.file.hash.content_type")
        .expect("namespace");
    assert!(db.validate().expect_err("orphan").is_inconsistent());

    db.store()
        .create_namespace("app.file.archive")
        .expect("namespace");
    db.store()
        .drop_namespace("app.file.hash.content_type")
        .expect("drop");
    db.validate().expect("non-index namespace is ignored");
}

#[test]
fn rebuild_restores_a_cleared_prefix_index() {
    let db = open_db();
    seed(&db);

    let namespace = file_model().prefix_indexes[0].namespace.clone();
    clear_namespace(db.store(), &namespace);
    assert!(search(&db, "hel").is_empty());

    assert_eq!(db.rebuild_index(FILE, &namespace).expect("rebuild"), 3);
    assert_eq!(search(&db, "hel"), vec![1, 2]);

    let err = db.rebuild_index(FILE, "app.file.hash.nothing").expect_err("unknown");
    assert!(err.is_not_found());
}

#[test]
fn new_index_is_populated_when_opened() {
    let bare = EntityModel::builder(FILE)
        .field(1, "name", FieldKind::Text)
        .field(2, "size", FieldKind::Int)
        .field(3, "content_type", FieldKind::Text)
        .field(4, "begin", FieldKind::Date)
        .field(5, "end", FieldKind::Date)
        .hash_index(&["size", "name"])
        .build()
        .expect("model");
    let db = Db::open(MemoryStore::new(), registry_of(bare), DbConfig::default()).expect("open");
    seed(&db);

    let db = Db::open(db.into_store(), registry_of(file_model()), DbConfig::default())
        .expect("reopen with more indexes");
    assert_eq!(search(&db, "hel"), vec![1, 2]);
    db.validate().expect("consistent");
}
