//! SCRAM authentication, conducted over the same Framer/Transport as user commands before any
//! session or transaction machinery is available (spec.md §4.3).

mod scram;

use bson::doc;
use rand::RngCore;

pub(crate) use scram::ScramMechanism;

use crate::{
    cmap::{execute, Command, Connection},
    error::{Error, ErrorKind, Result},
};

/// Credentials bound to a connection at `connect` time. Never logged or re-exposed.
#[derive(Clone)]
pub(crate) struct Credential {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) source: String,
    pub(crate) mechanism: Option<ScramMechanism>,
}

impl Credential {
    pub(crate) fn new(username: String, password: String, mechanism: Option<ScramMechanism>) -> Self {
        Self {
            username,
            password,
            source: "admin".to_string(),
            mechanism,
        }
    }
}

/// Runs the full SCRAM handshake over `conn`, negotiating SHA-256 vs SHA-1 via `hello`'s
/// `saslSupportedMechs` when the caller didn't pin a mechanism.
pub(crate) async fn authenticate(conn: &mut Connection, credential: &Credential) -> Result<()> {
    let mechanism = match credential.mechanism {
        Some(m) => m,
        None => negotiate_mechanism(conn, credential).await?,
    };

    mechanism
        .authenticate(conn, credential)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Authentication { .. } => e,
            _ => Error::new(ErrorKind::Connection {
                message: format!("transport failure during SCRAM handshake: {e}"),
            }),
        })
}

async fn negotiate_mechanism(
    conn: &mut Connection,
    credential: &Credential,
) -> Result<ScramMechanism> {
    let command = Command::new(
        "hello",
        "admin",
        doc! {
            "hello": 1,
            "saslSupportedMechs": format!("{}.{}", credential.source, credential.username),
        },
    );

    let response = execute(conn, command).await.map_err(|e| {
        Error::new(ErrorKind::Connection {
            message: format!("hello handshake failed before authentication: {e}"),
        })
    })?;

    let mechs = response
        .get_array("saslSupportedMechs")
        .map(|arr| {
            arr.iter()
                .filter_map(|b| b.as_str())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if mechs.iter().any(|m| m == "SCRAM-SHA-256") {
        Ok(ScramMechanism::Sha256)
    } else if mechs.iter().any(|m| m == "SCRAM-SHA-1") {
        Ok(ScramMechanism::Sha1)
    } else {
        // The server didn't list supported mechanisms (e.g. doesn't support mechanism
        // negotiation); SCRAM-SHA-256 is the modern default.
        Ok(ScramMechanism::Sha256)
    }
}

/// Generates the 24-byte random client nonce used to open a SCRAM conversation.
pub(crate) fn generate_nonce() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}
