mod common;

use common::{DOC, doc_model, open_db, sorted};
use kvindex::{prelude::*, value::eq_for_index};
use proptest::prelude::*;
use std::collections::BTreeMap;

const TITLES: [&str; 5] = ["alpha", "ALPHA", "Beta", "beta ", "gamma"];
const KINDS: i64 = 3;
const OPS_PER_CASE: usize = 200;
const OPS_PER_TXN: usize = 10;
const LONG_HISTORY: usize = 10_000;
const CHECK_EVERY_TXNS: usize = 100;

#[derive(Clone, Debug)]
enum Op {
    Create(Option<usize>, Option<i64>),
    Update(usize, Option<usize>, Option<i64>),
    Remove(usize),
}

fn title() -> impl Strategy<Value = Option<usize>> {
    proptest::option::of(0..TITLES.len())
}

fn kind() -> impl Strategy<Value = Option<i64>> {
    proptest::option::of(0..KINDS)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (title(), kind()).prop_map(|(t, k)| Op::Create(t, k)),
        2 => (any::<usize>(), title(), kind()).prop_map(|(s, t, k)| Op::Update(s, t, k)),
        1 => any::<usize>().prop_map(Op::Remove),
    ]
}

fn row(title: Option<usize>, kind: Option<i64>) -> Vec<Option<Value>> {
    let mut values = Vec::new();
    if let Some(t) = title {
        values.push(("title", Value::from(TITLES[t])));
    }
    if let Some(k) = kind {
        values.push(("kind", Value::Int(k)));
    }

    doc_model().row(values).expect("row")
}

fn stored(title: Option<usize>, kind: Option<i64>) -> (Option<Value>, Option<Value>) {
    (title.map(|t| Value::from(TITLES[t])), kind.map(Value::Int))
}

fn nth_live(live: &BTreeMap<u64, (Option<Value>, Option<Value>)>, slot: usize) -> Option<u64> {
    if live.is_empty() {
        return None;
    }
    live.keys().nth(slot % live.len()).copied()
}

// Apply `ops` in transactions of OPS_PER_TXN, comparing every hash query
// with the live objects after each `check_every` transactions and at the end.
fn replay(ops: &[Op], check_every: usize) -> Result<(), TestCaseError> {
    let db = open_db(DbConfig::default());
    let mut live = BTreeMap::new();

    for (n, chunk) in ops.chunks(OPS_PER_TXN).enumerate() {
        let mut txn = db.begin().expect("begin");
        for op in chunk {
            match *op {
                Op::Create(t, k) => {
                    let id = txn.create(DOC, &row(t, k)).expect("create");
                    live.insert(id, stored(t, k));
                }
                Op::Update(slot, t, k) => {
                    if let Some(id) = nth_live(&live, slot) {
                        txn.update(DOC, id, &row(t, k)).expect("update");
                        live.insert(id, stored(t, k));
                    }
                }
                Op::Remove(slot) => {
                    if let Some(id) = nth_live(&live, slot) {
                        prop_assert!(txn.remove(DOC, id).expect("remove"));
                        live.remove(&id);
                    }
                }
            }
        }
        txn.commit().expect("commit");

        if (n + 1) % check_every == 0 {
            check(&db, &live)?;
        }
    }
    check(&db, &live)?;

    if live.is_empty() {
        let namespace = &doc_model().hash_indexes[0].namespace;
        prop_assert!(common::dump(db.store(), namespace).is_empty());
    } else {
        db.validate().expect("consistent");
    }

    Ok(())
}

fn check(
    db: &Db<MemoryStore>,
    live: &BTreeMap<u64, (Option<Value>, Option<Value>)>,
) -> Result<(), TestCaseError> {
    let titles = TITLES.iter().map(|t| Some(Value::from(*t))).chain([None]);
    for title in titles {
        for kind in (0..KINDS).map(|k| Some(Value::Int(k))).chain([None]) {
            let mut filter = HashFilter::new();
            filter = match &title {
                Some(value) => filter.equals("title", value.clone()),
                None => filter.null("title"),
            };
            filter = match &kind {
                Some(value) => filter.equals("kind", value.clone()),
                None => filter.null("kind"),
            };

            let expected: Vec<u64> = live
                .iter()
                .filter(|(_, (t, k))| {
                    eq_for_index(t.as_ref(), title.as_ref())
                        && eq_for_index(k.as_ref(), kind.as_ref())
                })
                .map(|(id, _)| *id)
                .collect();

            prop_assert_eq!(sorted(&filter.into(), db), expected);
        }
    }

    Ok(())
}

proptest! {
    // 50 cases x 200 ops
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn hash_query_returns_exactly_the_matching_objects(
        ops in proptest::collection::vec(op(), OPS_PER_CASE),
    ) {
        replay(&ops, usize::MAX)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2))]

    #[test]
    fn hash_query_stays_exact_over_a_long_history(
        ops in proptest::collection::vec(op(), LONG_HISTORY),
    ) {
        replay(&ops, CHECK_EVERY_TXNS)?;
    }
}
