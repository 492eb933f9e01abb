//! Shared durable namespace holding per-session records.
//!
//! Every object is a file directly under one root directory, named by a
//! fixed prefix plus the session key. There is no index: listing and
//! sweeping are filters over `read_dir`.

pub mod key;
pub mod namespace;

pub use key::SessionKey;
pub use namespace::{Namespace, RecordEntry, RecordKind};
