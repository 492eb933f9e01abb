//! ctxwatch-core: session-scoped context usage bridge.
//!
//! Short-lived hook processes share state only through a directory of
//! per-session files:
//!
//! - [`SnapshotWriter`] persists the status line payload as a [`SnapshotRecord`]
//! - [`SnapshotReader`] turns a stored record into a tiered message
//! - [`EventCounter`] counts tool uses and samples every Nth one
//! - [`SessionReaper`] deletes a session's records, or sweeps all of them

pub mod config;
pub mod counter;
pub mod error;
pub mod hook;
pub mod reaper;
pub mod severity;
pub mod snapshot;
pub mod statusline;
pub mod store;

pub use counter::{EventCounter, TickOutcome};
pub use error::{StoreError, StoreResult};
pub use hook::{HookEvent, HookOutput};
pub use reaper::{ReapReport, SessionReaper};
pub use severity::SeverityTier;
pub use snapshot::{SnapshotReader, SnapshotRecord, SnapshotWriter, WriteOutcome};
pub use store::{Namespace, SessionKey};
