use super::*;

#[test]
fn read_concern_rejects_unknown_level() {
    assert!(ReadConcern::from_level("local").is_ok());
    assert!(ReadConcern::from_level("majority").is_ok());
    assert!(ReadConcern::from_level("linearizable").is_ok());
    assert!(ReadConcern::from_level("available").is_ok());
    assert!(ReadConcern::from_level("snapshot").is_ok());
    assert!(ReadConcern::from_level("bogus").is_err());
}

#[test]
fn read_concern_serializes_as_level_document() {
    let doc = bson::to_document(&ReadConcern::Majority).unwrap();
    assert_eq!(doc, bson::doc! { "level": "majority" });
}

#[test]
fn write_concern_rejects_w0_and_journal() {
    let wc = WriteConcern {
        w: Some(Acknowledgment::Nodes(0)),
        journal: Some(true),
        w_timeout_ms: None,
    };
    assert!(wc.validate().is_err());
}

#[test]
fn write_concern_rejects_negative_w() {
    let wc = WriteConcern {
        w: Some(Acknowledgment::Nodes(-1)),
        journal: None,
        w_timeout_ms: None,
    };
    assert!(wc.validate().is_err());
}

#[test]
fn write_concern_accepts_majority() {
    let wc = WriteConcern {
        w: Some(Acknowledgment::Majority),
        journal: Some(true),
        w_timeout_ms: Some(1000),
    };
    assert!(wc.validate().is_ok());
    let doc = bson::to_document(&wc).unwrap();
    assert_eq!(doc.get_str("w").unwrap(), "majority");
    assert_eq!(doc.get_bool("j").unwrap(), true);
    assert_eq!(doc.get_i64("wtimeout"), Ok(1000));
}
