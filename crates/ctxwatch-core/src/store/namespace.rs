use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::key::{SessionKey, KEY_PATTERN};
use crate::config::Settings;
use crate::error::{StoreError, StoreResult};

const SNAPSHOT_EXT: &str = ".json";
const TEMP_EXT: &str = ".tmp";
const TEMP_RAND_LEN: usize = 8;

/// Which record type a namespace entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Snapshot,
    Counter,
}

/// A file in the namespace whose name matches a record naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub path: PathBuf,
    pub key: String,
    pub kind: RecordKind,
    /// Leftover temp file of an interrupted write
    pub temp: bool,
}

/// Handle on the record directory
#[derive(Debug, Clone)]
pub struct Namespace {
    root: PathBuf,
    snapshot_prefix: String,
    counter_prefix: String,
    pattern: Regex,
}

impl Namespace {
    /// Create a namespace rooted at `root`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(
        root: impl Into<PathBuf>,
        snapshot_prefix: &str,
        counter_prefix: &str,
    ) -> StoreResult<Self> {
        let pattern = Regex::new(&format!(
            r"^(?:{snap}(?P<skey>{key}){ext}|{count}(?P<ckey>{key}))(?P<tmp>\.[A-Za-z0-9]{{1,32}}{tmp})?$",
            snap = regex::escape(snapshot_prefix),
            count = regex::escape(counter_prefix),
            key = KEY_PATTERN,
            ext = regex::escape(SNAPSHOT_EXT),
            tmp = regex::escape(TEMP_EXT),
        ))?;

        Ok(Self {
            root: root.into(),
            snapshot_prefix: snapshot_prefix.to_string(),
            counter_prefix: counter_prefix.to_string(),
            pattern,
        })
    }

    /// Create a namespace from resolved settings
    pub fn from_settings(settings: &Settings) -> StoreResult<Self> {
        Self::new(
            settings.state_dir(),
            &settings.snapshot_prefix,
            &settings.counter_prefix,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the snapshot record for `key`
    pub fn snapshot_path(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join(format!("{}{}{}", self.snapshot_prefix, key, SNAPSHOT_EXT))
    }

    /// Path of the counter record for `key`
    pub fn counter_path(&self, key: &SessionKey) -> PathBuf {
        self.root.join(format!("{}{}", self.counter_prefix, key))
    }

    /// Replace the whole content of `path`
    ///
    /// Each write goes to its own uniquely named temp file in the root
    /// (`<name>.<random>.tmp`, created O_EXCL), is synced, then renamed over
    /// the target. Concurrent writers of one path never share a temp file, so
    /// readers only ever see a complete record from one of them.
    pub fn write_atomic(&self, path: &Path, contents: &[u8]) -> StoreResult<()> {
        self.ensure_root()?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().unwrap_or(&self.root);

        let mut temp = tempfile::Builder::new()
            .prefix(&format!("{}.", file_name))
            .suffix(TEMP_EXT)
            .rand_bytes(TEMP_RAND_LEN)
            .tempfile_in(parent)
            .map_err(|e| StoreError::io("create", parent, e))?;

        temp.write_all(contents)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io("write", temp.path(), e))?;

        // Dropping an unpersisted temp file removes it
        temp.persist(path)
            .map(|_| ())
            .map_err(|e| StoreError::io("rename", path, e.error))
    }

    /// Read a record file to a string
    pub fn read(&self, path: &Path) -> StoreResult<String> {
        fs::read_to_string(path).map_err(|e| StoreError::io("read", path, e))
    }

    /// Remove a record file; returns whether something was deleted
    ///
    /// A missing file is not an error.
    pub fn remove(&self, path: &Path) -> StoreResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("remove", path, e)),
        }
    }

    /// Classify a bare file name against the record naming conventions
    pub fn classify(&self, file_name: &str) -> Option<(RecordKind, String, bool)> {
        let caps = self.pattern.captures(file_name)?;
        let temp = caps.name("tmp").is_some();
        if let Some(key) = caps.name("skey") {
            return Some((RecordKind::Snapshot, key.as_str().to_string(), temp));
        }
        caps.name("ckey")
            .map(|key| (RecordKind::Counter, key.as_str().to_string(), temp))
    }

    /// All files under the root that match a record naming convention
    ///
    /// A missing root yields an empty list. Unreadable directory entries and
    /// non-UTF-8 names are skipped.
    pub fn entries(&self) -> StoreResult<Vec<RecordEntry>> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("list", &self.root, e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((kind, key, temp)) = self.classify(name) {
                entries.push(RecordEntry {
                    path: entry.path(),
                    key,
                    kind,
                    temp,
                });
            }
        }

        Ok(entries)
    }

    /// Distinct session keys that currently own at least one record, sorted
    pub fn session_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries()?
            .into_iter()
            .filter(|e| !e.temp)
            .map(|e| e.key)
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Ensure the root directory exists with owner-only permissions (0700)
    fn ensure_root(&self) -> StoreResult<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io("create", &self.root, e))?;
        fs::set_permissions(&self.root, fs::Permissions::from_mode(0o700))
            .map_err(|e| StoreError::io("chmod", &self.root, e))
    }
}
