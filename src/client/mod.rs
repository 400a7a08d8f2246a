//! The `Client`: the single connected handle user code drives the rest of this library
//! through (spec.md §2, §4.3, §5).

pub mod auth;
pub mod session;

use std::sync::Arc;

use bson::{doc, Timestamp};
use tokio::sync::Mutex;

use crate::{
    cmap::{execute, Command, Connection, Scheduling},
    concern::{Acknowledgment, ReadConcern, WriteConcern},
    db::Database,
    error::{Error, ErrorKind, Result},
    operation::{build_abort_transaction, build_commit_transaction},
    response::{interpret, Interpreted},
};
use auth::{Credential, ScramMechanism};
use session::{CausalConsistencyTracker, ClientSession, SessionRegistry, TransactionOptions};

/// Everything needed to open a connection: host/port/database plus optional credentials.
/// Mirrors the teacher's `ClientOptions`, trimmed to the single-host, no-topology-discovery
/// scope this client covers.
#[derive(Clone, Debug, typed_builder::TypedBuilder)]
pub struct ClientOptions {
    pub host: String,
    #[builder(default = 27017)]
    pub port: u16,
    pub database: String,
    #[builder(default, setter(strip_option))]
    pub username: Option<String>,
    #[builder(default, setter(strip_option))]
    pub password: Option<String>,
    #[builder(default, setter(strip_option))]
    pub auth_mechanism: Option<String>,
    #[builder(default = Scheduling::Blocking)]
    pub scheduling: Scheduling,
    #[builder(default = false)]
    pub causal_consistency: bool,
}

impl ClientOptions {
    fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(invalid_argument("database name must not be empty"));
        }
        if self.host.is_empty() {
            return Err(invalid_argument("host must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid_argument("port must be in the range 1..=65535"));
        }
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                if u.is_empty() || p.is_empty() {
                    return Err(invalid_argument("username/password must not be empty"));
                }
            }
            (None, None) => {}
            _ => {
                return Err(invalid_argument(
                    "username and password must be supplied together",
                ))
            }
        }
        Ok(())
    }

    fn mechanism(&self) -> Result<Option<ScramMechanism>> {
        match self.auth_mechanism.as_deref() {
            None => Ok(None),
            Some("SCRAM-SHA-1") => Ok(Some(ScramMechanism::Sha1)),
            Some("SCRAM-SHA-256") => Ok(Some(ScramMechanism::Sha256)),
            Some(other) => Err(invalid_argument(format!(
                "unsupported auth mechanism: {other}"
            ))),
        }
    }
}

fn invalid_argument(message: impl Into<String>) -> Error {
    ErrorKind::InvalidArgument {
        message: message.into(),
    }
    .into()
}

fn max_retries_exhausted() -> Error {
    ErrorKind::Transaction {
        message: "maximum retries".into(),
    }
    .into()
}

/// Connection metadata exposed to callers via [`Client::connection_info`].
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub connection_id: String,
}

/// The connection, session registry, and causal-consistency tracker a [`Client`] shares across
/// every handle cloned from it. Not exposed directly; always accessed through the mutex inside
/// `Client`, reflecting spec.md §5's "one caller at a time" concurrency contract.
#[derive(Debug)]
struct ClientInner {
    conn: Connection,
    options: ClientOptions,
    sessions: SessionRegistry,
    tracker: CausalConsistencyTracker,
    is_replica_set: Option<bool>,
}

impl ClientInner {
    /// Applies per-command field injection (spec.md §4.5), sends `command`, and interprets the
    /// response (spec.md §4.6). Every collection/database operation funnels through here so the
    /// injection routine runs exactly once, immediately before framing, as the spec requires.
    async fn run(&mut self, mut command: Command, session_key: Option<&str>) -> Result<Interpreted> {
        match session_key {
            Some(key) => {
                let session = self.sessions.get_mut(key).ok_or_else(|| {
                    Error::new(ErrorKind::InvalidArgument {
                        message: format!("unknown session: {key}"),
                    })
                })?;
                session::inject(&mut command, Some(session), &self.tracker);
            }
            None => session::inject(&mut command, None, &self.tracker),
        }

        let response = execute(&mut self.conn, command).await?;
        interpret(response, &mut self.tracker)
    }
}

/// A handle to a connected MongoDB server. Cheap to clone — every clone shares the same
/// underlying connection and session registry behind a mutex, so concurrent callers are
/// serialized rather than left to corrupt shared state (spec.md §5).
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<Mutex<ClientInner>>,
}

impl Client {
    /// Validates `options`, opens the TCP connection, and runs SCRAM authentication if
    /// credentials were supplied (spec.md §2, §4.3).
    pub async fn connect(options: ClientOptions) -> Result<Self> {
        options.validate()?;

        let mut conn = Connection::connect(&options.host, options.port, options.scheduling).await?;

        if let (Some(username), Some(password)) = (&options.username, &options.password) {
            let credential = Credential::new(username.clone(), password.clone(), options.mechanism()?);
            auth::authenticate(&mut conn, &credential).await?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(ClientInner {
                conn,
                options,
                sessions: SessionRegistry::new(),
                tracker: CausalConsistencyTracker::default(),
                is_replica_set: None,
            })),
        })
    }

    pub(crate) async fn run(&self, command: Command, session_key: Option<&str>) -> Result<Interpreted> {
        self.inner.lock().await.run(command, session_key).await
    }

    pub fn database(&self, name: &str) -> Database {
        Database::new(self.clone(), name.to_string())
    }

    pub async fn database_name(&self) -> String {
        self.inner.lock().await.options.database.clone()
    }

    pub async fn connection_info(&self) -> ConnectionInfo {
        let inner = self.inner.lock().await;
        ConnectionInfo {
            host: inner.options.host.clone(),
            port: inner.options.port,
            database: inner.options.database.clone(),
            connection_id: inner.conn.connection_id().to_string(),
        }
    }

    pub async fn get_operation_time(&self) -> Option<Timestamp> {
        self.inner.lock().await.tracker.operation_time()
    }

    pub async fn get_cluster_time_document(&self) -> Option<bson::Document> {
        self.inner.lock().await.tracker.cluster_time().map(|ct| ct.as_document())
    }

    pub fn create_read_concern(&self, level: &str) -> Result<ReadConcern> {
        ReadConcern::from_level(level)
    }

    pub fn create_write_concern(&self, w: impl Into<Acknowledgment>) -> Result<WriteConcern> {
        let concern = WriteConcern::builder().w(Some(w.into())).build();
        concern.validate()?;
        Ok(concern)
    }

    /// Lazily runs `hello` once and caches whether the server identifies as a replica-set
    /// member, per spec.md §12 (topology discovery is otherwise out of scope for this client).
    pub async fn is_replica_set(&self) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if let Some(cached) = inner.is_replica_set {
            return Ok(cached);
        }
        let command = Command::new("hello", "admin", doc! { "hello": 1 });
        let response = execute(&mut inner.conn, command).await?;
        let is_rs = response.contains_key("setName");
        inner.is_replica_set = Some(is_rs);
        Ok(is_rs)
    }

    /// Begins a new logical session by sending `startSession` to `admin`, per spec.md §4.5.
    pub async fn start_session(&self) -> Result<Session> {
        let mut inner = self.inner.lock().await;
        let command = Command::new("startSession", "admin", doc! { "startSession": 1 });
        let response = execute(&mut inner.conn, command).await?;
        let id_document = response
            .get_document("id")
            .map_err(|_| ErrorKind::InvalidResponse {
                message: "startSession response missing `id`".into(),
            })?
            .clone();
        let session = ClientSession::from_server_id(id_document, inner.options.causal_consistency)?;
        let key = inner.sessions.insert(session);
        drop(inner);
        Ok(Session {
            client: self.clone(),
            key,
        })
    }

    /// Ends the named sessions: removes each from the registry, then sends a single
    /// `endSessions` command, per spec.md §4.5. Logs a warning for any session still
    /// mid-transaction when ended.
    pub async fn end_sessions(&self, keys: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut lsids = Vec::new();
        for key in keys {
            if let Some(session) = inner.sessions.remove(key) {
                #[cfg(feature = "tracing-unstable")]
                if session.in_transaction() {
                    tracing::warn!(session = %key, "ending session while a transaction is still in progress");
                }
                lsids.push(bson::Bson::Document(session.id_document().clone()));
            }
        }
        if lsids.is_empty() {
            return Ok(());
        }
        let command = Command::new("endSessions", "admin", doc! { "endSessions": lsids });
        execute(&mut inner.conn, command).await?;
        Ok(())
    }

    /// Ends any remaining tracked sessions (best effort) and closes the socket. No handle
    /// cloned from this client is usable after this returns (spec.md §5).
    pub async fn close(&self) {
        let keys: Vec<String> = self.inner.lock().await.sessions.keys().cloned().collect();
        let _ = self.end_sessions(&keys).await;
        self.inner.lock().await.conn.close().await;
    }
}

/// A logical session bound to the [`Client`] it was created from (spec.md §4.5). Dropping a
/// `Session` does not end it server-side — call [`Client::end_sessions`] explicitly, or rely on
/// [`session::SessionRegistry::cleanup_stale_sessions`]'s idle reaping.
pub struct Session {
    client: Client,
    key: String,
}

impl Session {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `startTransaction(session, options)`: fails with a `Transaction` error if a transaction
    /// is already in progress. No network call is made here (spec.md §4.5).
    pub async fn start_transaction(&self, options: Option<TransactionOptions>) -> Result<()> {
        let mut inner = self.client.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(&self.key)
            .expect("session removed while handle still live");
        session.start_transaction(options)
    }

    pub async fn state(&self) -> session::TransactionState {
        let mut inner = self.client.inner.lock().await;
        inner
            .sessions
            .get_mut(&self.key)
            .expect("session removed while handle still live")
            .state()
    }

    /// `commitTransaction(session, options)`, per spec.md §4.5.
    pub async fn commit_transaction(&self) -> Result<()> {
        let mut inner = self.client.inner.lock().await;
        let command = build_commit_transaction();
        let result = inner.run(command, Some(&self.key)).await;
        let session = inner
            .sessions
            .get_mut(&self.key)
            .expect("session removed while handle still live");
        match result {
            Ok(_) => {
                session.mark_committed();
                Ok(())
            }
            Err(err) => {
                if err.is_transient_transaction_error() || err.is_unknown_transaction_commit_result() {
                    Err(err)
                } else {
                    session.mark_aborted();
                    Err(err)
                }
            }
        }
    }

    /// `abortTransaction(session, options)`: unconditionally moves to `aborted`, per spec.md
    /// §4.5, even when the command itself fails.
    pub async fn abort_transaction(&self) -> Result<()> {
        let mut inner = self.client.inner.lock().await;
        let command = build_abort_transaction();
        let result = inner.run(command, Some(&self.key)).await;
        let session = inner
            .sessions
            .get_mut(&self.key)
            .expect("session removed while handle still live");
        session.mark_aborted();
        result.map(|_| ())
    }

    /// `withTransaction(session, callback, options)`: retries up to `max_retries` (default 3)
    /// full attempts on transient errors, and the commit itself up to 3 times on
    /// `UnknownTransactionCommitResult`, per spec.md §4.5.
    pub async fn with_transaction<F, Fut, T>(&self, mut callback: F, max_retries: u32) -> Result<T>
    where
        F: FnMut(&Session) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(100);
        const MAX_COMMIT_RETRIES: u32 = 3;

        let mut attempts = 0;
        loop {
            attempts += 1;
            self.start_transaction(None).await?;

            let callback_result = callback(self).await;
            let value = match callback_result {
                Ok(value) => value,
                Err(err) => {
                    self.abort_transaction().await.ok();
                    if err.is_transient_transaction_error() {
                        if attempts < max_retries {
                            tokio::time::sleep(RETRY_DELAY).await;
                            continue;
                        }
                        return Err(max_retries_exhausted());
                    }
                    return Err(err);
                }
            };

            let mut commit_attempts = 0;
            let mut retry_whole_transaction = false;
            loop {
                commit_attempts += 1;
                match self.commit_transaction().await {
                    Ok(()) => return Ok(value),
                    Err(err) if err.is_unknown_transaction_commit_result() && commit_attempts < MAX_COMMIT_RETRIES => {
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                    Err(err) if err.is_transient_transaction_error() => {
                        if attempts >= max_retries {
                            return Err(max_retries_exhausted());
                        }
                        retry_whole_transaction = true;
                        break;
                    }
                    Err(err) => return Err(err),
                }
            }
            if retry_whole_transaction {
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        }
    }
}
