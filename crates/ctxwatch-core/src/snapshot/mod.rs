//! Snapshot records: the latest context usage of one session.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{format_report, SnapshotReader, AWAITING_MESSAGE, UNAVAILABLE_MESSAGE};
pub use record::SnapshotRecord;
pub use writer::{SnapshotWriter, WriteOutcome};
