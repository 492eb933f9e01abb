//! Per-session event counter driving sampled tool-use notifications.
//!
//! The increment is a plain read-modify-write without locking. If the host
//! ever runs two ticks for the same session at once, one increment can be
//! lost; the worst outcome is a shifted sampling boundary.

use crate::error::StoreResult;
use crate::snapshot::{SnapshotReader, SnapshotRecord};
use crate::store::{Namespace, SessionKey};

/// Label used when the event does not name the tool
pub const DEFAULT_LABEL: &str = "tool use";

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Counter value after this tick
    pub count: u64,
    /// Notification, present only on sampling boundaries with a stored snapshot
    pub message: Option<String>,
}

/// Counts events per session and samples every Nth one
#[derive(Debug, Clone)]
pub struct EventCounter {
    namespace: Namespace,
    reader: SnapshotReader,
    every: u64,
}

impl EventCounter {
    /// `every` is clamped to at least 1
    pub fn new(namespace: Namespace, every: u64) -> Self {
        Self {
            reader: SnapshotReader::new(namespace.clone()),
            namespace,
            every: every.max(1),
        }
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    /// Stored count for `key`; absent or garbled counters read as 0
    pub fn current(&self, key: &SessionKey) -> u64 {
        let path = self.namespace.counter_path(key);
        match self.namespace.read(&path) {
            Ok(content) => content.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::debug!("Resetting unparsable counter for {}", key);
                0
            }),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::debug!("Counter of {} unreadable: {}", key, e);
                }
                0
            }
        }
    }

    /// Increment and persist the counter, returning the new value
    ///
    /// A failed write is swallowed; the incremented value is still returned.
    pub fn increment(&self, key: &SessionKey) -> u64 {
        let next = self.current(key).saturating_add(1);
        if let Err(e) = self.store(key, next) {
            tracing::debug!("Counter write for {} dropped: {}", key, e);
        }
        next
    }

    fn store(&self, key: &SessionKey, value: u64) -> StoreResult<()> {
        self.namespace
            .write_atomic(&self.namespace.counter_path(key), value.to_string().as_bytes())
    }

    /// Count one event and build a notification on every Nth call
    pub fn tick(&self, key: &SessionKey, label: Option<&str>) -> TickOutcome {
        let count = self.increment(key);
        if count % self.every != 0 {
            return TickOutcome {
                count,
                message: None,
            };
        }

        let label = label.filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LABEL);
        let message = self
            .reader
            .lookup(key)
            .map(|record| format_tick(&record, count, label));

        TickOutcome { count, message }
    }
}

/// Periodic usage line: icon, tier tag, counter, triggering label, percentages
pub fn format_tick(record: &SnapshotRecord, count: u64, label: &str) -> String {
    let tier = record.tier();
    let mut line = format!(
        "{} [{}] Context check #{} after {}: {}% used ({}% free).",
        tier.icon(),
        tier.tag(),
        count,
        label,
        record.used_rounded(),
        record.remaining_rounded(),
    );
    if let Some(remediation) = tier.remediation() {
        line.push(' ');
        line.push_str(remediation);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordDefaults;
    use crate::hook::{ContextWindow, HookEvent};
    use crate::snapshot::SnapshotWriter;

    fn setup() -> (tempfile::TempDir, Namespace) {
        let dir = tempfile::tempdir().unwrap();
        let ns = Namespace::new(dir.path(), "ctx-", "count-").unwrap();
        (dir, ns)
    }

    fn key(raw: &str) -> SessionKey {
        SessionKey::parse(raw).unwrap()
    }

    fn write_snapshot(ns: &Namespace, session: &str, used: f64) {
        let event = HookEvent {
            session_id: Some(session.to_string()),
            context_window: Some(ContextWindow {
                used_percentage: Some(used),
                remaining_percentage: Some(100.0 - used),
                ..Default::default()
            }),
            ..Default::default()
        };
        SnapshotWriter::new(ns.clone(), RecordDefaults::default()).write(&event);
    }

    #[test]
    fn test_emits_on_every_fifth_call() {
        let (_dir, ns) = setup();
        write_snapshot(&ns, "s1", 65.0);
        let counter = EventCounter::new(ns, 5);

        let emitted: Vec<u64> = (0..15)
            .map(|_| counter.tick(&key("s1"), Some("Bash")))
            .filter(|t| t.message.is_some())
            .map(|t| t.count)
            .collect();

        assert_eq!(emitted, vec![5, 10, 15]);
        assert_eq!(counter.current(&key("s1")), 15);
    }

    #[test]
    fn test_boundary_without_snapshot_is_silent() {
        let (_dir, ns) = setup();
        let counter = EventCounter::new(ns, 5);

        for _ in 0..4 {
            assert!(counter.tick(&key("s1"), Some("Read")).message.is_none());
        }
        let fifth = counter.tick(&key("s1"), Some("Read"));
        assert_eq!(fifth.count, 5);
        assert!(fifth.message.is_none());
    }

    #[test]
    fn test_garbled_counter_restarts_at_one() {
        let (_dir, ns) = setup();
        ns.write_atomic(&ns.counter_path(&key("s1")), b"not a number").unwrap();
        let counter = EventCounter::new(ns, 5);

        assert_eq!(counter.increment(&key("s1")), 1);
    }

    #[test]
    fn test_counters_are_isolated() {
        let (_dir, ns) = setup();
        let counter = EventCounter::new(ns, 5);

        counter.increment(&key("a"));
        counter.increment(&key("a"));
        counter.increment(&key("b"));

        assert_eq!(counter.current(&key("a")), 2);
        assert_eq!(counter.current(&key("b")), 1);
    }

    #[test]
    fn test_message_contents() {
        let (_dir, ns) = setup();
        write_snapshot(&ns, "s1", 82.4);
        let counter = EventCounter::new(ns, 1);

        let message = counter.tick(&key("s1"), Some("Edit")).message.unwrap();
        assert!(message.starts_with("🔴 [CONTEXT CRITICAL]"), "{}", message);
        assert!(message.contains("#1 after Edit"));
        assert!(message.contains("82% used (18% free)"));
        assert!(message.contains("/compact"));
    }

    #[test]
    fn test_nominal_has_no_remediation() {
        let (_dir, ns) = setup();
        write_snapshot(&ns, "s1", 12.0);
        let counter = EventCounter::new(ns, 1);

        let message = counter.tick(&key("s1"), None).message.unwrap();
        assert_eq!(
            message,
            "🟢 [CONTEXT OK] Context check #1 after tool use: 12% used (88% free)."
        );
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let (_dir, ns) = setup();
        assert_eq!(EventCounter::new(ns, 0).every(), 1);
    }
}
