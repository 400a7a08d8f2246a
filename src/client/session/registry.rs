use std::collections::HashMap;

use super::{ClientSession, SESSION_IDLE_TIMEOUT};

/// In-memory table of sessions owned by a single client, keyed by the session's registry key
/// (spec.md §3 Lifecycle). Mutated only by the thread/fiber that owns the connection; the
/// "one caller at a time" contract documented in spec.md §5 means no internal locking here.
#[derive(Debug, Default)]
pub(crate) struct SessionRegistry {
    sessions: HashMap<String, ClientSession>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, session: ClientSession) -> String {
        let key = session.registry_key();
        self.sessions.insert(key.clone(), session);
        key
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut ClientSession> {
        self.sessions.get_mut(key)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<ClientSession> {
        self.sessions.remove(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Reaps sessions idle for longer than [`SESSION_IDLE_TIMEOUT`], returning their keys so
    /// the caller can also send `endSessions` for them.
    pub(crate) fn cleanup_stale_sessions(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.idle_for() >= SESSION_IDLE_TIMEOUT && !s.in_transaction())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            self.sessions.remove(key);
        }
        stale
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &String> {
        self.sessions.keys()
    }
}
