//! Snapshot writer: normalizes a status line event and persists it.

use chrono::Utc;

use super::record::SnapshotRecord;
use crate::config::RecordDefaults;
use crate::error::StoreResult;
use crate::hook::HookEvent;
use crate::store::{Namespace, SessionKey};

/// Result of one writer invocation
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Record built from the event, whether or not it was stored
    pub record: SnapshotRecord,
    /// True when the record reached storage
    pub persisted: bool,
}

/// Persists one [`SnapshotRecord`] per session key
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    namespace: Namespace,
    defaults: RecordDefaults,
}

impl SnapshotWriter {
    pub fn new(namespace: Namespace, defaults: RecordDefaults) -> Self {
        Self {
            namespace,
            defaults,
        }
    }

    /// Build the record and try to persist it
    ///
    /// Without a valid session id nothing is written. Write failures are
    /// swallowed: the record is still returned so the caller can render it.
    pub fn write(&self, event: &HookEvent) -> WriteOutcome {
        let key = SessionKey::from_optional(event.session_id.as_deref());
        let session_id = key.as_ref().map_or("", SessionKey::as_str);
        let record = SnapshotRecord::from_event(session_id, event, &self.defaults, Utc::now());

        let persisted = match key {
            Some(ref key) => match self.persist(key, &record) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Snapshot write for {} dropped: {}", key, e);
                    false
                }
            },
            None => false,
        };

        WriteOutcome { record, persisted }
    }

    /// Replace the stored record for `key`
    pub fn persist(&self, key: &SessionKey, record: &SnapshotRecord) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        self.namespace
            .write_atomic(&self.namespace.snapshot_path(key), &json)
    }
}
