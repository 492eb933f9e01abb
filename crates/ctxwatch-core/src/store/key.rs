//! Session key validation.
//!
//! Keys come from the host and are untrusted. Restricting them to
//! `[A-Za-z0-9_-]{1,128}` keeps `prefix + key` collision-free and rules out
//! path traversal.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Maximum accepted key length in bytes
pub const MAX_KEY_LEN: usize = 128;

/// A validated, host-assigned session identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Validate a raw session id
    pub fn parse(raw: &str) -> StoreResult<Self> {
        if raw.is_empty() || raw.len() > MAX_KEY_LEN || !raw.chars().all(is_key_char) {
            return Err(StoreError::InvalidKey {
                key: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Validate an optional session id, treating anything invalid as absent
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match Self::parse(raw) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::debug!("Ignoring session id: {}", e);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Regex fragment matching exactly the valid key alphabet
pub(crate) const KEY_PATTERN: &str = "[A-Za-z0-9_-]{1,128}";
