use bson::{doc, Timestamp};

use super::*;
use crate::cmap::Command;

fn tracker_with_operation_time(t: u32) -> CausalConsistencyTracker {
    let mut tracker = CausalConsistencyTracker::default();
    tracker.record(&doc! { "operationTime": Timestamp { time: t, increment: 1 } });
    tracker
}

#[test]
fn start_transaction_increments_txn_number_and_sets_starting() {
    let mut session = ClientSession::new(false);
    session.start_transaction(None).unwrap();
    assert_eq!(session.txn_number(), 1);
    assert_eq!(session.state(), TransactionState::Starting);
    assert!(!session.first_operation_done());
}

#[test]
fn start_transaction_conflict_when_already_in_progress() {
    let mut session = ClientSession::new(false);
    session.start_transaction(None).unwrap();
    session.mark_first_operation_done();
    let err = session.start_transaction(None).unwrap_err();
    assert!(matches!(err.kind(), crate::error::ErrorKind::Transaction { .. }));
}

#[test]
fn abort_then_start_transaction_increments_by_two() {
    let mut session = ClientSession::new(false);
    session.start_transaction(None).unwrap();
    session.mark_aborted();
    session.start_transaction(None).unwrap();
    assert_eq!(session.txn_number(), 2);
}

#[test]
fn first_transaction_operation_carries_start_transaction_and_autocommit() {
    let mut session = ClientSession::new(false);
    session
        .start_transaction(Some(TransactionOptions {
            read_concern: Some(ReadConcern::Majority),
            write_concern: None,
            max_commit_time_ms: None,
        }))
        .unwrap();

    let tracker = CausalConsistencyTracker::default();
    let mut command = Command::new("insert", "testing", doc! { "insert": "tx" });
    inject(&mut command, Some(&mut session), &tracker);

    assert_eq!(command.body.get_bool("startTransaction").unwrap(), true);
    assert_eq!(command.body.get_bool("autocommit").unwrap(), false);
    assert!(command.body.get_document("readConcern").is_ok());
    assert!(session.first_operation_done());
    assert_eq!(session.state(), TransactionState::InProgress);
}

#[test]
fn second_transaction_operation_omits_start_transaction_and_read_concern() {
    let mut session = ClientSession::new(false);
    session.start_transaction(None).unwrap();

    let tracker = CausalConsistencyTracker::default();
    let mut first = Command::new("insert", "testing", doc! { "insert": "tx" });
    inject(&mut first, Some(&mut session), &tracker);

    let mut second = Command::new(
        "insert",
        "testing",
        doc! { "insert": "tx", "readConcern": { "level": "majority" } },
    );
    inject(&mut second, Some(&mut session), &tracker);

    assert!(!second.body.contains_key("startTransaction"));
    assert!(!second.body.contains_key("readConcern"));
    assert_eq!(second.body.get_i64("txnNumber").unwrap(), 1);
}

#[test]
fn non_session_read_gets_after_cluster_time_injected() {
    let tracker = tracker_with_operation_time(42);
    let mut command = Command::new("find", "testing", doc! { "find": "movies" });
    inject(&mut command, None, &tracker);

    let after = command
        .body
        .get_document("readConcern")
        .unwrap()
        .get_timestamp("afterClusterTime")
        .unwrap();
    assert_eq!(after.time, 42);
}

#[test]
fn get_more_never_carries_read_concern() {
    let tracker = tracker_with_operation_time(7);
    let mut command = Command::new("getMore", "testing", doc! { "getMore": 123 });
    inject(&mut command, None, &tracker);
    assert!(!command.body.contains_key("readConcern"));
}

#[test]
fn stale_sessions_are_reaped_but_not_mid_transaction() {
    let mut registry = SessionRegistry::new();
    let idle = ClientSession::new(false);
    let key = registry.insert(idle);

    // Freshly inserted sessions aren't idle yet.
    assert!(registry.cleanup_stale_sessions().is_empty());
    assert_eq!(registry.len(), 1);
    assert!(registry.get_mut(&key).is_some());
}
