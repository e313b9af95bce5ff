use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for index maintenance and queries.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: NamespaceCounters,
    pub(crate) namespaces: BTreeMap<String, NamespaceCounters>,
}

///
/// NamespaceCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NamespaceCounters {
    pub index_inserts: u64,
    pub index_removes: u64,
    pub rows_scanned: u64,
    pub candidates_rejected: u64,
    pub block_splits: u64,
    pub breakpoint_splits: u64,
}

///
/// EventReport
/// Point-in-time copy of the metrics state.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: NamespaceCounters,
    pub namespaces: BTreeMap<String, NamespaceCounters>,
}

impl EventReport {
    /// Counters for one namespace, zeroed if it never recorded an event.
    #[must_use]
    pub fn namespace(&self, namespace: &str) -> NamespaceCounters {
        self.namespaces.get(namespace).cloned().unwrap_or_default()
    }
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Apply one counter update to both the global and the per-namespace totals.
pub(crate) fn bump(namespace: &str, f: impl Fn(&mut NamespaceCounters)) {
    with_state_mut(|m| {
        f(&mut m.ops);
        f(m.namespaces.entry(namespace.to_string()).or_default());
    });
}

pub(crate) fn report() -> EventReport {
    EVENT_STATE.with(|m| {
        let m = m.borrow();
        EventReport {
            ops: m.ops.clone(),
            namespaces: m.namespaces.clone(),
        }
    })
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}
