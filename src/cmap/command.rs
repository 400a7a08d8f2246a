use bson::{Bson, Document, Timestamp};

use crate::{
    client::session::{ClientSession, ClusterTime},
    concern::{ReadConcern, WriteConcern},
    wire::Message,
};

/// Commands the `afterClusterTime`/readConcern injection rule must never touch, per spec.md
/// §4.5 and §6.
const READ_CONCERN_FORBIDDEN: [&str; 2] = ["getMore", "killCursors"];

/// A driver-side command about to be sent: the verb-first body plus the database it targets.
/// Mirrors the teacher's `cmap::conn::command::Command`, minus wire-compression concerns this
/// client doesn't implement.
#[derive(Debug, Clone)]
pub(crate) struct Command {
    pub(crate) name: &'static str,
    pub(crate) target_db: String,
    pub(crate) body: Document,
}

impl Command {
    pub(crate) fn new(name: &'static str, target_db: impl Into<String>, body: Document) -> Self {
        Self {
            name,
            target_db: target_db.into(),
            body,
        }
    }

    pub(crate) fn set_session(&mut self, session: &ClientSession) {
        self.body.insert("lsid", session.id_document().clone());
    }

    pub(crate) fn set_cluster_time(&mut self, cluster_time: &ClusterTime) {
        self.body
            .insert("$clusterTime", cluster_time.as_document().clone());
    }

    pub(crate) fn set_txn_number(&mut self, txn_number: i64) {
        self.body.insert("txnNumber", Bson::Int64(txn_number));
    }

    pub(crate) fn set_autocommit(&mut self) {
        self.body.insert("autocommit", false);
    }

    pub(crate) fn set_start_transaction(&mut self) {
        self.body.insert("startTransaction", true);
    }

    pub(crate) fn set_read_concern(&mut self, concern: &ReadConcern) {
        self.body
            .insert("readConcern", bson::to_bson(concern).unwrap());
    }

    pub(crate) fn set_write_concern(&mut self, concern: &WriteConcern) {
        self.body
            .insert("writeConcern", bson::to_bson(concern).unwrap());
    }

    pub(crate) fn remove_read_concern(&mut self) {
        self.body.remove("readConcern");
    }

    pub(crate) fn set_after_cluster_time(&mut self, operation_time: Timestamp) {
        let entry = self
            .body
            .entry("readConcern".to_string())
            .or_insert_with(|| Bson::Document(Document::new()));
        if let Bson::Document(rc) = entry {
            rc.insert("afterClusterTime", Bson::Timestamp(operation_time));
        }
    }

    pub(crate) fn forbids_read_concern(&self) -> bool {
        READ_CONCERN_FORBIDDEN.contains(&self.name)
    }

    pub(crate) fn has_read_concern_after_cluster_time(&self) -> bool {
        self.body
            .get_document("readConcern")
            .ok()
            .and_then(|d| d.get("afterClusterTime"))
            .is_some()
    }

    /// Finalizes the command into a wire message: `$db` is appended last, after all session
    /// and concern injection has happened, exactly as the teacher's `Message::with_command` does.
    pub(crate) fn into_message(mut self) -> Message {
        let target_db = self.target_db;
        self.body.insert("$db", target_db);
        Message::new_request(self.body)
    }
}
