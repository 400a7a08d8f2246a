//! RFC 5802 SCRAM-SHA-1/SCRAM-SHA-256, as the two mechanisms MongoDB speaks by default.

use std::{
    collections::HashMap,
    ops::BitXor,
    str,
    sync::{LazyLock, RwLock},
};

use base64::Engine;
use bson::{spec::BinarySubtype, Bson, Document};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::{
    cmap::{execute, Command, Connection},
    error::{Error, ErrorKind, Result},
};

use super::{generate_nonce, Credential};

const MIN_ITERATION_COUNT: usize = 4096;
const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

static SALTED_PASSWORD_CACHE: LazyLock<RwLock<HashMap<CacheKey, Vec<u8>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

#[derive(Hash, Eq, PartialEq, Clone)]
struct CacheKey {
    password: String,
    salt: Vec<u8>,
    iterations: usize,
    mechanism: ScramMechanism,
}

/// The two SCRAM variants this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ScramMechanism {
    Sha1,
    Sha256,
}

impl ScramMechanism {
    fn name(&self) -> &'static str {
        match self {
            ScramMechanism::Sha1 => "SCRAM-SHA-1",
            ScramMechanism::Sha256 => "SCRAM-SHA-256",
        }
    }

    pub(crate) async fn authenticate(
        &self,
        conn: &mut Connection,
        credential: &Credential,
    ) -> Result<()> {
        let nonce = generate_nonce();
        let client_first = ClientFirst::new(&credential.username, &nonce);

        let start_command = Command::new(
            "saslStart",
            credential.source.clone(),
            client_first.to_command(*self),
        );
        let server_first_response = execute(conn, start_command).await?;
        let server_first = ServerFirst::parse(server_first_response)?;
        server_first.validate(&nonce)?;

        let cache_key = CacheKey {
            password: credential.password.clone(),
            salt: server_first.salt.clone(),
            iterations: server_first.iterations,
            mechanism: *self,
        };
        let salted_password = match SALTED_PASSWORD_CACHE.read().unwrap().get(&cache_key) {
            Some(cached) => cached.clone(),
            None => {
                let computed = self.compute_salted_password(
                    &credential.username,
                    &credential.password,
                    server_first.iterations,
                    &server_first.salt,
                )?;
                SALTED_PASSWORD_CACHE
                    .write()
                    .unwrap()
                    .entry(cache_key)
                    .or_insert(computed)
                    .clone()
            }
        };

        let client_final = ClientFinal::new(&salted_password, &client_first, &server_first, *self);
        let continue_command = Command::new(
            "saslContinue",
            credential.source.clone(),
            client_final.to_command(),
        );
        let server_final_response = execute(conn, continue_command).await?;
        let server_final = ServerFinal::parse(server_final_response)?;
        server_final.validate(&salted_password, &client_final, *self)?;

        // Mongo-specific: the RFC handshake is done, but the server still expects one more
        // empty saslContinue before it reports `done: true`.
        let noop = bson::doc! {
            "saslContinue": 1,
            "conversationId": server_final.conversation_id.clone(),
            "payload": Bson::Binary(bson::Binary { subtype: BinarySubtype::Generic, bytes: Vec::new() }),
        };
        let noop_command = Command::new("saslContinue", credential.source.clone(), noop);
        let noop_response = execute(conn, noop_command).await?;

        if noop_response.get("conversationId") != Some(&server_final.conversation_id) {
            return Err(auth_error("mismatched conversationId"));
        }
        if !noop_response.get_bool("done").unwrap_or(false) {
            return Err(auth_error("authentication did not complete"));
        }

        Ok(())
    }

    fn hmac(&self, key: &[u8], input: &[u8]) -> Vec<u8> {
        match self {
            ScramMechanism::Sha1 => mac::<Hmac<Sha1>>(key, input),
            ScramMechanism::Sha256 => mac::<Hmac<Sha256>>(key, input),
        }
    }

    fn h(&self, input: &[u8]) -> Vec<u8> {
        match self {
            ScramMechanism::Sha1 => {
                use sha1::Digest as _;
                Sha1::digest(input).to_vec()
            }
            ScramMechanism::Sha256 => Sha256::digest(input).to_vec(),
        }
    }

    fn h_i(&self, normalized_password: &str, salt: &[u8], iterations: usize) -> Vec<u8> {
        match self {
            ScramMechanism::Sha1 => {
                let mut buf = [0u8; 20];
                pbkdf2::pbkdf2_hmac::<Sha1>(normalized_password.as_bytes(), salt, iterations as u32, &mut buf);
                buf.to_vec()
            }
            ScramMechanism::Sha256 => {
                let mut buf = [0u8; 32];
                pbkdf2::pbkdf2_hmac::<Sha256>(normalized_password.as_bytes(), salt, iterations as u32, &mut buf);
                buf.to_vec()
            }
        }
    }

    fn compute_salted_password(
        &self,
        username: &str,
        password: &str,
        iterations: usize,
        salt: &[u8],
    ) -> Result<Vec<u8>> {
        let normalized = match self {
            ScramMechanism::Sha1 => {
                use md5::{Digest as _, Md5};
                let digest = Md5::digest(format!("{username}:mongo:{password}").as_bytes());
                hex::encode(digest)
            }
            ScramMechanism::Sha256 => stringprep::saslprep(password)
                .map_err(|_| auth_error("SASLprep normalization failed"))?
                .into_owned(),
        };
        Ok(self.h_i(&normalized, salt, iterations))
    }
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x.bitxor(*y)).collect()
}

fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], input: &[u8]) -> Vec<u8> {
    let mut m = <M as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    m.update(input);
    m.finalize().into_bytes().to_vec()
}

fn auth_error(message: impl Into<String>) -> Error {
    ErrorKind::Authentication {
        message: message.into(),
    }
    .into()
}

fn parse_kvp(part: &str, expected_key: char) -> Result<String> {
    let mut chars = part.chars();
    if chars.next() != Some(expected_key) || chars.next() != Some('=') {
        return Err(auth_error("malformed SCRAM message"));
    }
    Ok(chars.collect())
}

fn validate_command_ok(doc: &Document) -> Result<()> {
    match doc.get_f64("ok").or_else(|_| doc.get_i32("ok").map(f64::from)) {
        Ok(ok) if ok == 1.0 => Ok(()),
        _ => Err(auth_error(
            doc.get_str("errmsg").unwrap_or("SCRAM step rejected by server"),
        )),
    }
}

struct ClientFirst {
    gs2_header: String,
    bare: String,
}

impl ClientFirst {
    fn new(username: &str, nonce: &str) -> Self {
        Self {
            gs2_header: "n,,".to_string(),
            bare: format!("n={username},r={nonce}"),
        }
    }

    fn message(&self) -> String {
        format!("{}{}", self.gs2_header, self.bare)
    }

    fn to_command(&self, mechanism: ScramMechanism) -> Document {
        bson::doc! {
            "saslStart": 1,
            "mechanism": mechanism.name(),
            "payload": Bson::Binary(bson::Binary {
                subtype: BinarySubtype::Generic,
                bytes: self.message().into_bytes(),
            }),
        }
    }
}

struct ServerFirst {
    conversation_id: Bson,
    message: String,
    nonce: String,
    salt: Vec<u8>,
    iterations: usize,
}

impl ServerFirst {
    fn parse(response: Document) -> Result<Self> {
        validate_command_ok(&response)?;
        let conversation_id = response
            .get("conversationId")
            .ok_or_else(|| auth_error("missing conversationId"))?
            .clone();
        let payload = response
            .get_binary_generic("payload")
            .map_err(|_| auth_error("missing payload in server-first response"))?;
        let message = str::from_utf8(payload)
            .map_err(|_| auth_error("server-first payload was not valid UTF-8"))?
            .to_string();

        let parts: Vec<&str> = message.split(',').collect();
        if parts.len() < 3 {
            return Err(auth_error("malformed server-first message"));
        }
        let nonce = parse_kvp(parts[0], 'r')?;
        let salt = B64
            .decode(parse_kvp(parts[1], 's')?)
            .map_err(|_| auth_error("malformed salt"))?;
        let iterations: usize = parse_kvp(parts[2], 'i')?
            .parse()
            .map_err(|_| auth_error("malformed iteration count"))?;

        Ok(Self {
            conversation_id,
            message,
            nonce,
            salt,
            iterations,
        })
    }

    fn validate(&self, client_nonce: &str) -> Result<()> {
        if !self.nonce.starts_with(client_nonce) {
            return Err(auth_error("server nonce does not extend client nonce"));
        }
        if self.iterations < MIN_ITERATION_COUNT {
            return Err(auth_error("iteration count too low"));
        }
        Ok(())
    }
}

struct ClientFinal {
    message: String,
    auth_message: String,
    conversation_id: Bson,
}

impl ClientFinal {
    fn new(
        salted_password: &[u8],
        client_first: &ClientFirst,
        server_first: &ServerFirst,
        mechanism: ScramMechanism,
    ) -> Self {
        let client_key = mechanism.hmac(salted_password, b"Client Key");
        let stored_key = mechanism.h(&client_key);

        let without_proof = format!(
            "c={},r={}",
            B64.encode(client_first.gs2_header.as_bytes()),
            server_first.nonce
        );
        let auth_message = format!(
            "{},{},{}",
            client_first.bare, server_first.message, without_proof
        );
        let client_signature = mechanism.hmac(&stored_key, auth_message.as_bytes());
        let client_proof = B64.encode(xor(&client_key, &client_signature));

        Self {
            message: format!("{without_proof},p={client_proof}"),
            auth_message,
            conversation_id: server_first.conversation_id.clone(),
        }
    }

    fn to_command(&self) -> Document {
        bson::doc! {
            "saslContinue": 1,
            "conversationId": self.conversation_id.clone(),
            "payload": Bson::Binary(bson::Binary {
                subtype: BinarySubtype::Generic,
                bytes: self.message.clone().into_bytes(),
            }),
        }
    }
}

enum ServerFinalBody {
    Error(String),
    Verifier(String),
}

struct ServerFinal {
    conversation_id: Bson,
    body: ServerFinalBody,
}

impl ServerFinal {
    fn parse(response: Document) -> Result<Self> {
        validate_command_ok(&response)?;
        let conversation_id = response
            .get("conversationId")
            .ok_or_else(|| auth_error("missing conversationId"))?
            .clone();
        let payload = response
            .get_binary_generic("payload")
            .map_err(|_| auth_error("missing payload in server-final response"))?;
        let message = str::from_utf8(payload)
            .map_err(|_| auth_error("server-final payload was not valid UTF-8"))?;

        let body = match message.chars().next() {
            Some('e') => ServerFinalBody::Error(parse_kvp(message, 'e')?),
            Some('v') => ServerFinalBody::Verifier(parse_kvp(message, 'v')?),
            _ => return Err(auth_error("malformed server-final message")),
        };

        Ok(Self {
            conversation_id,
            body,
        })
    }

    fn validate(
        &self,
        salted_password: &[u8],
        client_final: &ClientFinal,
        mechanism: ScramMechanism,
    ) -> Result<()> {
        match &self.body {
            ServerFinalBody::Error(e) => Err(auth_error(format!("server rejected proof: {e}"))),
            ServerFinalBody::Verifier(v) => {
                let server_key = mechanism.hmac(salted_password, b"Server Key");
                let server_signature =
                    mechanism.hmac(&server_key, client_final.auth_message.as_bytes());
                let expected = B64.encode(server_signature);
                if &expected != v {
                    return Err(auth_error("server signature mismatch"));
                }
                Ok(())
            }
        }
    }
}
