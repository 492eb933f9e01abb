//! Snapshot reader: turns the stored record of a session into a message.
//!
//! The reader never fails. A missing key, a missing record and an
//! unreadable record each map to a fixed message.

use super::record::SnapshotRecord;
use crate::error::{StoreError, StoreResult};
use crate::store::{Namespace, SessionKey};

/// Returned when the event carries no usable session id
pub const UNAVAILABLE_MESSAGE: &str = "[CONTEXT] Tracking unavailable: no session id was provided.";

/// Returned when no record has been written for the session yet
pub const AWAITING_MESSAGE: &str = "[CONTEXT] Awaiting first status line update for this session.";

/// Looks up snapshot records by session key
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    namespace: Namespace,
}

impl SnapshotReader {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Load and decode the record for `key`
    pub fn load(&self, key: &SessionKey) -> StoreResult<SnapshotRecord> {
        let path = self.namespace.snapshot_path(key);
        let content = self.namespace.read(&path)?;
        serde_json::from_str(&content).map_err(|_| StoreError::Parse { path })
    }

    /// Record for `key`, or `None` when absent or unreadable
    pub fn lookup(&self, key: &SessionKey) -> Option<SnapshotRecord> {
        match self.load(key) {
            Ok(record) => Some(record),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::debug!("Treating snapshot of {} as absent: {}", key, e);
                None
            }
        }
    }

    /// Message describing the context usage of `session_id`
    pub fn report(&self, session_id: Option<&str>) -> String {
        let Some(key) = SessionKey::from_optional(session_id) else {
            return UNAVAILABLE_MESSAGE.to_string();
        };
        match self.lookup(&key) {
            Some(record) => format_report(&record),
            None => AWAITING_MESSAGE.to_string(),
        }
    }
}

/// One-line description of a record, tagged with its severity tier
pub fn format_report(record: &SnapshotRecord) -> String {
    let tier = record.tier();
    let mut line = format!(
        "[{}] {}% used ({}% free) of {}k window; {} input / {} output tokens; model {}.",
        tier.tag(),
        record.used_rounded(),
        record.remaining_rounded(),
        record.window_k(),
        record.input_tokens,
        record.output_tokens,
        record.model,
    );
    if let Some(directive) = tier.directive() {
        line.push(' ');
        line.push_str(directive);
    }
    line
}
