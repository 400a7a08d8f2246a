//! The literal end-to-end scenarios from spec.md §8 (S1-S6), run against a real `mongod`.
//!
//! These need a live server and are `#[ignore]`d by default — run with
//! `cargo test --features sync -- --ignored` against a `mongod` reachable at `mongo:27017`
//! with a `root`/`example` user, the same fixture spec.md's scenarios assume. A replica set is
//! required for S4/S5 (`startTransaction` fails against a standalone).

use bson::doc;
use mongo_native::{Client, ClientOptions};

async fn connect(database: &str) -> Client {
    let options = ClientOptions::builder()
        .host("mongo".to_string())
        .database(database.to_string())
        .username("root".to_string())
        .password("example".to_string())
        .build();
    Client::connect(options).await.expect("connect to the test mongod")
}

#[tokio::test]
#[ignore]
async fn s1_basic_insert_and_find() {
    let client = connect("testing").await;
    let movies = client.database("testing").collection("movies");

    let inserted = movies
        .insert_one(doc! { "name": "Armageddon", "country": "USA" }, Default::default())
        .await
        .unwrap();
    let id = inserted.inserted_id.as_str().expect("_id is a string");
    assert_eq!(id.len(), 36, "_id should be a 36-character UUID string");

    let found = movies
        .find(doc! { "name": "Armageddon" }, Default::default())
        .await
        .unwrap();
    assert_eq!(found.first_batch.len(), 1);
}

#[tokio::test]
#[ignore]
async fn s2_duplicate_key_error() {
    let client = connect("testing").await;
    let movies = client.database("testing").collection("movies_dup");

    movies
        .insert_one(doc! { "_id": 999 }, Default::default())
        .await
        .unwrap();
    let err = movies
        .insert_one(doc! { "_id": 999 }, Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(11000));
    assert!(matches!(err.kind(), mongo_native::ErrorKind::DuplicateKey { .. }));
}

#[tokio::test]
#[ignore]
async fn bulk_write_error_carries_partial_result() {
    let client = connect("testing").await;
    let movies = client.database("testing").collection("movies_bulk");

    movies
        .insert_one(doc! { "_id": 1 }, Default::default())
        .await
        .unwrap();

    let err = movies
        .insert_many(
            vec![doc! { "_id": 2 }, doc! { "_id": 1 }, doc! { "_id": 3 }],
            false,
            Default::default(),
        )
        .await
        .unwrap_err();

    match err.kind() {
        mongo_native::ErrorKind::BulkWrite(failure) => {
            assert!(!failure.write_errors.is_empty());
        }
        other => panic!("expected BulkWrite, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn s3_upsert_semantics() {
    let client = connect("testing").await;
    let movies = client.database("testing").collection("movies_upsert");

    movies
        .insert_one(
            doc! { "name": "Gone with the wind", "counter": 1 },
            Default::default(),
        )
        .await
        .unwrap();

    let ops = vec![
        mongo_native::UpsertOp {
            filter: doc! { "name": "Gone with the wind" },
            update: doc! { "$set": { "country": "USA" }, "$inc": { "counter": 3 } },
            multi: false,
        },
        mongo_native::UpsertOp {
            filter: doc! { "name": "The godfather" },
            update: doc! {
                "$set": { "name": "The godfather 2", "country": "USA", "language": "English" }
            },
            multi: false,
        },
    ];
    movies.upsert_many(ops, Default::default()).await.unwrap();

    let found = movies.find(doc! {}, Default::default()).await.unwrap();
    assert_eq!(found.first_batch.len(), 2);
    assert_eq!(found.first_batch[0].get_i32("counter").unwrap(), 4);
    assert_eq!(
        found.first_batch[1].get_str("name").unwrap(),
        "The godfather 2"
    );
}

#[tokio::test]
#[ignore]
async fn s4_transaction_happy_path() {
    let client = connect("testing").await;
    let session = client.start_session().await.unwrap();
    let options = mongo_native::client::session::TransactionOptions {
        read_concern: Some(mongo_native::ReadConcern::Majority),
        write_concern: Some(client.create_write_concern(1).unwrap()),
        max_commit_time_ms: None,
    };
    session.start_transaction(Some(options)).await.unwrap();

    let tx = client.database("testing").collection("tx");
    let opts = mongo_native::OperationOptions {
        session: Some(session.key()),
    };
    tx.insert_one(doc! { "x": 1 }, opts).await.unwrap();
    tx.insert_one(doc! { "x": 2 }, opts).await.unwrap();
    session.commit_transaction().await.unwrap();

    assert!(matches!(
        session.state().await,
        mongo_native::client::session::TransactionState::Committed
    ));
    let found = tx.find(doc! {}, Default::default()).await.unwrap();
    assert_eq!(found.first_batch.len(), 2);
}

#[tokio::test]
#[ignore]
async fn s5_transaction_abort() {
    let client = connect("testing").await;
    let session = client.start_session().await.unwrap();
    session.start_transaction(None).await.unwrap();

    let tx = client.database("testing").collection("tx_abort");
    let opts = mongo_native::OperationOptions {
        session: Some(session.key()),
    };
    tx.insert_one(doc! { "x": 1 }, opts).await.unwrap();
    session.abort_transaction().await.unwrap();

    assert!(matches!(
        session.state().await,
        mongo_native::client::session::TransactionState::Aborted
    ));
    let found = tx.find(doc! {}, Default::default()).await.unwrap();
    assert!(found.first_batch.is_empty());
}

#[tokio::test]
#[ignore]
async fn s6_causal_consistency() {
    let client = connect("testing").await;
    let coll = client.database("testing").collection("causal");
    coll.find(doc! {}, Default::default()).await.unwrap();

    let operation_time = client
        .get_operation_time()
        .await
        .expect("operationTime should be tracked after any read");

    coll.find(doc! {}, Default::default()).await.unwrap();
    let after = client.get_operation_time().await.unwrap();
    assert!(after >= operation_time);
}
