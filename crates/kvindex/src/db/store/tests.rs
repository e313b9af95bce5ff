use crate::db::store::{Cursor, Direction, KvStore, MemoryStore, ReadView, Seek, Transaction};

const NS: &str = "t";

fn store_with(keys: &[&[u8]]) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_namespace(NS).expect("create namespace");
    let mut txn = store.begin_transaction().expect("begin");
    for key in keys {
        txn.put(NS, key.to_vec(), b"v".to_vec()).expect("put");
    }
    txn.commit().expect("commit");
    store
}

fn seek_key(view: &impl ReadView, seek: Seek<'_>) -> Option<Vec<u8>> {
    view.seek(NS, seek).expect("seek").map(|kv| kv.key)
}

#[test]
fn seek_variants_follow_byte_order() {
    let store = store_with(&[b"b", b"d", b"f"]);

    assert_eq!(seek_key(&store, Seek::First), Some(b"b".to_vec()));
    assert_eq!(seek_key(&store, Seek::Last), Some(b"f".to_vec()));
    assert_eq!(seek_key(&store, Seek::AtOrAfter(b"d")), Some(b"d".to_vec()));
    assert_eq!(seek_key(&store, Seek::After(b"d")), Some(b"f".to_vec()));
    assert_eq!(seek_key(&store, Seek::Before(b"d")), Some(b"b".to_vec()));
    assert_eq!(seek_key(&store, Seek::Before(b"b")), None);
    assert_eq!(seek_key(&store, Seek::AtOrAfter(b"g")), None);
}

#[test]
fn transaction_reads_its_own_writes() {
    let store = store_with(&[b"a", b"c", b"e"]);
    let mut txn = store.begin_transaction().expect("begin");

    txn.put(NS, b"b".to_vec(), b"new".to_vec()).expect("put");
    txn.delete(NS, b"c").expect("delete");

    assert_eq!(txn.get(NS, b"b").expect("get"), Some(b"new".to_vec()));
    assert_eq!(txn.get(NS, b"c").expect("get"), None);
    assert_eq!(seek_key(&txn, Seek::After(b"a")), Some(b"b".to_vec()));
    assert_eq!(seek_key(&txn, Seek::After(b"b")), Some(b"e".to_vec()));
    assert_eq!(seek_key(&txn, Seek::Before(b"e")), Some(b"b".to_vec()));

    // committed state is untouched until commit
    assert_eq!(store.get(NS, b"b").expect("get"), None);
    assert_eq!(store.get(NS, b"c").expect("get"), Some(b"v".to_vec()));
}

#[test]
fn dropped_transaction_rolls_back() {
    let store = store_with(&[b"a"]);
    {
        let mut txn = store.begin_transaction().expect("begin");
        txn.put(NS, b"z".to_vec(), b"v".to_vec()).expect("put");
        txn.delete(NS, b"a").expect("delete");
        assert_eq!(txn.pending_writes(), 2);
    }

    assert_eq!(store.get(NS, b"z").expect("get"), None);
    assert_eq!(store.get(NS, b"a").expect("get"), Some(b"v".to_vec()));
}

#[test]
fn deleted_tail_is_skipped_in_both_directions() {
    let store = store_with(&[b"a", b"b", b"c"]);
    let mut txn = store.begin_transaction().expect("begin");
    txn.delete(NS, b"b").expect("delete");
    txn.delete(NS, b"c").expect("delete");

    assert_eq!(seek_key(&txn, Seek::After(b"a")), None);
    assert_eq!(seek_key(&txn, Seek::Last), Some(b"a".to_vec()));
}

#[test]
fn unknown_namespace_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get("missing", b"k").expect_err("missing namespace");
    assert!(err.is_not_found());

    let mut txn = store.begin_transaction().expect("begin");
    let err = txn
        .put("missing", b"k".to_vec(), Vec::new())
        .expect_err("put into missing namespace");
    assert!(err.is_not_found());
}

#[test]
fn namespace_lifecycle() {
    let store = MemoryStore::new();
    store.create_namespace("a").expect("create");
    store.create_namespace("b").expect("create");
    assert!(store.create_namespace("a").is_err());
    assert_eq!(store.list_namespaces().expect("list"), vec!["a", "b"]);

    store.drop_namespace("a").expect("drop");
    assert!(!store.contains_namespace("a").expect("contains"));
    assert!(store.drop_namespace("a").expect_err("second drop").is_not_found());
}

#[test]
fn cursor_observes_writes_made_while_open() {
    let store = store_with(&[b"a", b"c"]);
    let mut txn = store.begin_transaction().expect("begin");
    let mut cursor = Cursor::new(NS);

    let first = cursor.seek_first(&txn).expect("seek").expect("first key");
    assert_eq!(first.key, b"a");

    txn.put(NS, b"b".to_vec(), b"v".to_vec()).expect("put");

    let next = cursor.next(&txn).expect("next").expect("second key");
    assert_eq!(next.key, b"b");
    let back = cursor
        .step(&txn, Direction::Backward)
        .expect("step")
        .expect("back to first");
    assert_eq!(back.key, b"a");
}

#[test]
fn exhausted_cursor_stays_exhausted() {
    let store = store_with(&[b"a"]);
    let mut cursor = Cursor::new(NS);

    assert!(cursor.seek(&store, b"b").expect("seek").is_none());
    assert!(cursor.key().is_none());
    assert!(cursor.next(&store).expect("next").is_none());
}
