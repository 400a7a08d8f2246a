use bson::doc;

use super::*;
use crate::client::session::CausalConsistencyTracker;

#[test]
fn write_errors_take_priority_over_everything_else() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! {
        "ok": 1.0,
        "n": 0,
        "writeErrors": [{ "index": 0, "code": 11000, "errmsg": "duplicate key" }],
    };
    let err = interpret(response, &mut tracker).unwrap_err();
    assert!(matches!(err.kind(), crate::error::ErrorKind::DuplicateKey { .. }));
}

#[test]
fn top_level_errmsg_raised_as_command_error() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! { "ok": 0.0, "code": 59, "codeName": "CommandNotFound", "errmsg": "no such command" };
    let err = interpret(response, &mut tracker).unwrap_err();
    match err.kind() {
        crate::error::ErrorKind::Command(c) => assert_eq!(c.code, 59),
        other => panic!("expected Command, got {other:?}"),
    }
}

#[test]
fn write_concern_error_raised_even_when_ok() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! {
        "ok": 1.0,
        "n": 1,
        "writeConcernError": { "code": 64, "errmsg": "waiting for replication timed out" },
    };
    let err = interpret(response, &mut tracker).unwrap_err();
    match err.kind() {
        crate::error::ErrorKind::Write(crate::error::WriteFailure::WriteConcernError(wce)) => {
            assert_eq!(wce.code, 64);
        }
        other => panic!("expected WriteConcernError, got {other:?}"),
    }
}

#[test]
fn top_level_errmsg_with_timeout_code_raised_as_timeout() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! { "ok": 0.0, "code": 50, "codeName": "MaxTimeMSExpired", "errmsg": "operation exceeded time limit" };
    let err = interpret(response, &mut tracker).unwrap_err();
    match err.kind() {
        crate::error::ErrorKind::Timeout { code, .. } => assert_eq!(*code, 50),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(err.code(), Some(50));
}

#[test]
fn n_and_ok_returns_count() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! { "ok": 1.0, "n": 3 };
    match interpret(response, &mut tracker).unwrap() {
        Interpreted::Count(n) => assert_eq!(n, 3),
        other => panic!("expected Count, got {other:?}"),
    }
}

#[test]
fn nonce_and_ok_returns_whole_document() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! { "ok": 1.0, "nonce": "abc123" };
    match interpret(response.clone(), &mut tracker).unwrap() {
        Interpreted::Document(doc) => assert_eq!(doc, response),
        other => panic!("expected Document, got {other:?}"),
    }
}

#[test]
fn bare_ok_returns_whole_document_even_with_cursor() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! {
        "ok": 1.0,
        "cursor": { "id": 0i64, "firstBatch": [{ "x": 1 }] },
    };
    let interpreted = interpret(response.clone(), &mut tracker).unwrap();
    match interpreted {
        Interpreted::Document(doc) => {
            assert_eq!(cursor_batch(&doc), vec![doc! { "x": 1 }]);
        }
        other => panic!("expected Document, got {other:?}"),
    }
}

#[test]
fn tracker_updated_even_on_error_response() {
    let mut tracker = CausalConsistencyTracker::default();
    let response = doc! {
        "ok": 0.0,
        "errmsg": "boom",
        "code": 1,
        "operationTime": bson::Timestamp { time: 10, increment: 0 },
    };
    let _ = interpret(response, &mut tracker);
    assert!(tracker.operation_time().is_some());
}
