//! Concern validation, independent of any live server.

use mongo_native::{Acknowledgment, ErrorKind, ReadConcern, WriteConcern};

#[test]
fn negative_w_is_rejected() {
    let concern = WriteConcern::builder().w(Some(Acknowledgment::Nodes(-1))).build();
    let err = concern.validate().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidConcern { .. }));
}

#[test]
fn unrecognized_read_concern_level_is_rejected() {
    let err = ReadConcern::from_level("eventual").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidConcern { .. }));
}

#[test]
fn every_documented_read_concern_level_round_trips() {
    for level in ["local", "available", "majority", "linearizable", "snapshot"] {
        let concern = ReadConcern::from_level(level).unwrap();
        assert_eq!(concern.as_str(), level);
    }
}
