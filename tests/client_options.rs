//! Boundary behaviors around `ClientOptions` validation, independent of any live server.

use mongo_native::{Client, ClientOptions, ErrorKind};

#[tokio::test]
async fn port_zero_fails_with_invalid_argument() {
    let options = ClientOptions::builder()
        .host("localhost".to_string())
        .port(0)
        .database("testing".to_string())
        .build();

    let err = Client::connect(options).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

// `port` is a `u16`, so the out-of-range value `65536` the spec names as a boundary case is
// unrepresentable at the type level rather than a runtime check — a stronger guarantee than the
// validation this test exercises for the representable-but-invalid case.

#[tokio::test]
async fn empty_database_fails_with_invalid_argument() {
    let options = ClientOptions::builder()
        .host("localhost".to_string())
        .database(String::new())
        .build();

    let err = Client::connect(options).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[tokio::test]
async fn empty_host_fails_with_invalid_argument() {
    let options = ClientOptions::builder()
        .host(String::new())
        .database("testing".to_string())
        .build();

    let err = Client::connect(options).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[tokio::test]
async fn username_without_password_fails_with_invalid_argument() {
    let options = ClientOptions::builder()
        .host("localhost".to_string())
        .database("testing".to_string())
        .username("root".to_string())
        .build();

    let err = Client::connect(options).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[tokio::test]
async fn username_and_password_empty_strings_fail_with_invalid_argument() {
    let options = ClientOptions::builder()
        .host("localhost".to_string())
        .database("testing".to_string())
        .username(String::new())
        .password(String::new())
        .build();

    let err = Client::connect(options).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[tokio::test]
async fn default_port_is_27017() -> anyhow::Result<()> {
    let options = ClientOptions::builder()
        .host(String::new())
        .database("testing".to_string())
        .build();

    anyhow::ensure!(options.port == 27017, "default port should be 27017");
    Ok(())
}
