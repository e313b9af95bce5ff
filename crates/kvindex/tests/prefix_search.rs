mod common;

use common::{DOC, doc_model, dump, open_db, search, titled};
use kvindex::{PREFERRED_MAX_ID_COUNT_PER_BLOCK, db::index::prefix::IdBlock, prelude::*};

#[test]
fn search_matches_word_prefixes() {
    let db = open_db(DbConfig::default());
    let mut txn = db.begin().expect("begin");
    let hello = txn.create(DOC, &titled("hello world", None)).expect("create");
    let help = txn.create(DOC, &titled("help", None)).expect("create");
    txn.commit().expect("commit");

    assert_eq!(search(&db, "hel"), vec![hello, help]);
    assert_eq!(search(&db, "hello wor"), vec![hello]);
    assert_eq!(search(&db, "WORLD"), vec![hello]);
    assert_eq!(search(&db, "xyz"), Vec::<u64>::new());
    assert_eq!(search(&db, "   "), Vec::<u64>::new());
}

#[test]
fn punctuation_inside_a_search_word_must_match_a_lexeme() {
    let db = open_db(DbConfig::default());
    let mut txn = db.begin().expect("begin");
    let id = txn.create(DOC, &titled("foo bar", None)).expect("create");
    txn.commit().expect("commit");

    assert!(search(&db, "foo-bar").is_empty());
    assert!(search(&db, "foo, bar").is_empty());
    assert_eq!(search(&db, "foo bar"), vec![id]);
}

#[test]
fn every_word_must_prefix_some_lexeme_of_any_indexed_field() {
    let db = open_db(DbConfig::default());
    let mut txn = db.begin().expect("begin");
    let report = txn
        .create(DOC, &titled("Quarterly report", Some("finance q3-2024")))
        .expect("create");
    let memo = txn
        .create(DOC, &titled("report draft", Some("internal")))
        .expect("create");
    txn.commit().expect("commit");

    assert_eq!(search(&db, "rep"), vec![report, memo]);
    assert_eq!(search(&db, "rep fin"), vec![report]);
    assert_eq!(search(&db, "2024 quart"), vec![report]);
    assert_eq!(search(&db, "q3-20"), Vec::<u64>::new());
    assert_eq!(search(&db, "q3 20"), vec![report]);
    assert_eq!(search(&db, "rep zzz"), Vec::<u64>::new());
    assert_eq!(search(&db, "draft report internal"), vec![memo]);
}

#[test]
fn updates_and_removals_follow_live_values() {
    let db = open_db(DbConfig::default());
    let mut txn = db.begin().expect("begin");
    let id = txn.create(DOC, &titled("old name", None)).expect("create");
    txn.commit().expect("commit");

    let mut txn = db.begin().expect("begin");
    txn.update(DOC, id, &titled("new name", Some("renamed")))
        .expect("update");
    txn.commit().expect("commit");

    assert!(search(&db, "old").is_empty());
    assert_eq!(search(&db, "nam ren"), vec![id]);

    let mut txn = db.begin().expect("begin");
    assert!(txn.remove(DOC, id).expect("remove"));
    txn.commit().expect("commit");

    assert!(search(&db, "nam").is_empty());
    let namespace = &doc_model().prefix_indexes[0].namespace;
    assert!(dump(db.store(), namespace).is_empty(), "no orphan blocks");
}

#[test]
fn large_postings_split_into_blocks() {
    let db = open_db(DbConfig::default());
    let mut txn = db.begin().expect("begin");
    for _ in 0..2_050 {
        txn.create(DOC, &titled("shared", None)).expect("create");
    }
    txn.commit().expect("commit");

    let namespace = &doc_model().prefix_indexes[0].namespace;
    let blocks: Vec<IdBlock> = dump(db.store(), namespace)
        .iter()
        .map(|(_, value)| IdBlock::try_from_bytes(value).expect("block"))
        .collect();

    assert!(blocks.len() >= 3, "{} blocks", blocks.len());
    let (last, full) = blocks.split_last().expect("blocks");
    assert!(full.iter().all(|b| b.len() <= PREFERRED_MAX_ID_COUNT_PER_BLOCK));
    assert_eq!(full.iter().map(IdBlock::len).sum::<usize>() + last.len(), 2_050);

    let found = search(&db, "sha");
    assert_eq!(found, (1..=2_050).collect::<Vec<u64>>());
}

#[test]
fn configured_block_size_is_honoured() {
    let config = DbConfig::from_toml_str("[prefix]\npreferred_max_ids_per_block = 4\n")
        .expect("config");
    let db = open_db(config);

    let mut txn = db.begin().expect("begin");
    for _ in 0..10 {
        txn.create(DOC, &titled("tiny", None)).expect("create");
    }
    txn.commit().expect("commit");

    let namespace = &doc_model().prefix_indexes[0].namespace;
    let sizes: Vec<usize> = dump(db.store(), namespace)
        .iter()
        .map(|(_, value)| IdBlock::try_from_bytes(value).expect("block").len())
        .collect();
    assert_eq!(sizes, vec![4, 4, 2]);

    let mut txn = db.begin().expect("begin");
    for id in 1..=10 {
        assert!(txn.remove(DOC, id).expect("remove"));
    }
    txn.commit().expect("commit");
    assert!(dump(db.store(), namespace).is_empty());
}
