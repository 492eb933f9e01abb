//! Session reaper: removes the records of ended sessions.
//!
//! With a key only that session's two records are deleted. Without one,
//! every file matching a record naming convention is deleted, which also
//! collects leftovers of sessions that ended without a cleanup call.

use crate::store::{Namespace, SessionKey};

/// What a cleanup pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: usize,
    pub failed: usize,
}

/// Deletes session records
#[derive(Debug, Clone)]
pub struct SessionReaper {
    namespace: Namespace,
}

impl SessionReaper {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Host-facing entry point
    ///
    /// A missing or empty session id sweeps the namespace. A non-empty id
    /// that fails validation deletes nothing, since the host did name a
    /// session.
    pub fn cleanup(&self, session_id: Option<&str>) -> ReapReport {
        match session_id.filter(|id| !id.is_empty()) {
            None => self.sweep(),
            Some(raw) => match SessionKey::parse(raw) {
                Ok(key) => self.reap(&key),
                Err(e) => {
                    tracing::debug!("Skipping cleanup: {}", e);
                    ReapReport::default()
                }
            },
        }
    }

    /// Delete the snapshot and counter of one session
    pub fn reap(&self, key: &SessionKey) -> ReapReport {
        let paths = [
            self.namespace.snapshot_path(key),
            self.namespace.counter_path(key),
        ];
        let mut report = ReapReport::default();
        for path in &paths {
            match self.namespace.remove(path) {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!("{}", e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Delete every record in the namespace, continuing past failures
    pub fn sweep(&self) -> ReapReport {
        let entries = match self.namespace.entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Sweep skipped: {}", e);
                return ReapReport::default();
            }
        };

        let mut report = ReapReport::default();
        for entry in entries {
            match self.namespace.remove(&entry.path) {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!("{}", e);
                    report.failed += 1;
                }
            }
        }
        tracing::debug!(
            "Swept {} records from {:?} ({} failed)",
            report.removed,
            self.namespace.root(),
            report.failed
        );
        report
    }
}
