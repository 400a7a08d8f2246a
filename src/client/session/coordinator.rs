//! The per-command field-injection algorithm, spec.md §4.5 — "the single most important
//! algorithm". Implemented as a free function operating on a [`Command`] in place, applied
//! immediately before framing.

use super::{CausalConsistencyTracker, ClientSession, TransactionState};
use crate::cmap::Command;

/// Applies session, transaction, and causal-consistency field injection to `command` in place.
/// `session` is `None` for commands issued outside any session.
pub(crate) fn inject(
    command: &mut Command,
    session: Option<&mut ClientSession>,
    tracker: &CausalConsistencyTracker,
) {
    match session {
        Some(session) => {
            command.set_session(session);

            if session.in_transaction() {
                command.set_txn_number(session.txn_number());
                command.set_autocommit();

                if !session.first_operation_done() {
                    command.set_start_transaction();
                    let options = session.transaction_options.clone();
                    if let Some(options) = options {
                        if let Some(rc) = &options.read_concern {
                            command.set_read_concern(rc);
                        }
                        if let Some(wc) = &options.write_concern {
                            command.set_write_concern(wc);
                        }
                    }
                    session.mark_first_operation_done();
                } else {
                    command.remove_read_concern();
                }
            }

            session.touch();
        }
        None => {
            if let Some(operation_time) = tracker.operation_time() {
                if !command.has_read_concern_after_cluster_time() && !command.forbids_read_concern() {
                    command.set_after_cluster_time(operation_time);
                }
            }
        }
    }

    // Belt-and-braces pass applied unconditionally, matching the pseudocode's trailing
    // "Additionally, for any command" block: readConcern must never leak onto getMore/
    // killCursors or a non-first transaction op, even if one of the branches above set it.
    if command.forbids_read_concern() {
        command.remove_read_concern();
    }

    if let Some(cluster_time) = tracker.cluster_time() {
        command.set_cluster_time(cluster_time);
    }
}

/// Whether `session` is currently mid-transaction, exposed for callers needing to decide
/// whether to route a command to a transaction-carrying connection.
pub(crate) fn in_transaction(session: &ClientSession) -> bool {
    matches!(
        session.state(),
        TransactionState::Starting | TransactionState::InProgress
    )
}
