use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::key::is_key_char;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Session-scoped context usage bridge for Claude Code hooks"
)]
pub struct Config {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding per-session records
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Emit a tick notification every N tool uses
    #[arg(short = 'n', long, global = true)]
    pub every: Option<u64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands, one per host lifecycle point
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Persist the status line payload and print the status line
    Statusline,
    /// Report the stored context usage as hook context
    Context,
    /// Count a tool use and report usage every Nth call
    Tick,
    /// Remove the records of the session named on stdin (sweeps when absent)
    Cleanup,
    /// Remove every record in the namespace
    Sweep,
    /// List session ids that currently have records
    Sessions,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Namespace root; resolved by [`default_state_dir`] when unset
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// File name prefix of snapshot records
    #[serde(default = "default_snapshot_prefix")]
    pub snapshot_prefix: String,

    /// File name prefix of counter records
    #[serde(default = "default_counter_prefix")]
    pub counter_prefix: String,

    /// Sampling interval of the tick notification
    #[serde(default = "default_sample_every")]
    pub sample_every: u64,

    /// Upper bound for waiting on the host's event (milliseconds)
    #[serde(default = "default_stdin_timeout")]
    pub stdin_timeout_ms: u64,

    /// Values used when the status line payload omits a field
    #[serde(default)]
    pub defaults: RecordDefaults,

    /// Status line rendering
    #[serde(default)]
    pub statusline: StatuslineSettings,
}

fn default_snapshot_prefix() -> String {
    "ctx-".to_string()
}

fn default_counter_prefix() -> String {
    "count-".to_string()
}

fn default_sample_every() -> u64 {
    5
}

fn default_stdin_timeout() -> u64 {
    2000
}

/// Defaults applied to optional snapshot fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefaults {
    /// Context window capacity in tokens
    #[serde(default = "default_window_size")]
    pub window_size: u64,

    /// Model name placeholder
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_window_size() -> u64 {
    200_000
}

fn default_model() -> String {
    "Claude".to_string()
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            model: default_model(),
        }
    }
}

/// Status line settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatuslineSettings {
    /// Enable ANSI colors
    #[serde(default = "default_color")]
    pub color: bool,

    /// Number of cells in the usage bar
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

fn default_color() -> bool {
    true
}

fn default_bar_width() -> usize {
    10
}

impl Default for StatuslineSettings {
    fn default() -> Self {
        Self {
            color: default_color(),
            bar_width: default_bar_width(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: None,
            snapshot_prefix: default_snapshot_prefix(),
            counter_prefix: default_counter_prefix(),
            sample_every: default_sample_every(),
            stdin_timeout_ms: default_stdin_timeout(),
            defaults: RecordDefaults::default(),
            statusline: StatuslineSettings::default(),
        }
    }
}

/// Default namespace root, preferring XDG_RUNTIME_DIR for per-user isolation
pub fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(xdg).join("ctxwatch")
    } else {
        let uid = unsafe { libc::getuid() };
        std::env::temp_dir().join(format!("ctxwatch-{}", uid))
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::read_file(p);
            }
            tracing::warn!(
                "Config file {:?} not found, falling back to default locations",
                p
            );
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("ctxwatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/ctxwatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".ctxwatch.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::read_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(ref state_dir) = cli.state_dir {
            self.state_dir = Some(state_dir.clone());
        }
        if let Some(every) = cli.every {
            self.sample_every = every;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Prefixes must be non-empty and free of path separators, otherwise the
    /// sweep could match foreign files or records could escape the namespace.
    pub fn validate(&mut self) {
        if self.sample_every == 0 {
            self.sample_every = 1;
        }
        if self.stdin_timeout_ms == 0 {
            self.stdin_timeout_ms = 1;
        }
        if self.statusline.bar_width == 0 {
            self.statusline.bar_width = 1;
        }
        if !is_valid_prefix(&self.snapshot_prefix) {
            tracing::warn!(
                "Invalid snapshot_prefix {:?}, using default",
                self.snapshot_prefix
            );
            self.snapshot_prefix = default_snapshot_prefix();
        }
        if !is_valid_prefix(&self.counter_prefix) {
            tracing::warn!(
                "Invalid counter_prefix {:?}, using default",
                self.counter_prefix
            );
            self.counter_prefix = default_counter_prefix();
        }
        if self.snapshot_prefix == self.counter_prefix {
            tracing::warn!("snapshot_prefix and counter_prefix are equal, using defaults");
            self.snapshot_prefix = default_snapshot_prefix();
            self.counter_prefix = default_counter_prefix();
        }
    }

    /// Resolved namespace root
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(|c| is_key_char(c) || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.sample_every, 5);
        assert_eq!(settings.snapshot_prefix, "ctx-");
        assert_eq!(settings.counter_prefix, "count-");
        assert_eq!(settings.defaults.window_size, 200_000);
        assert!(settings.statusline.color);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            sample_every = 3
            state_dir = "/tmp/ctxwatch-test"

            [defaults]
            model = "Sonnet"

            [statusline]
            color = false
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.sample_every, 3);
        assert_eq!(settings.state_dir(), PathBuf::from("/tmp/ctxwatch-test"));
        assert_eq!(settings.defaults.model, "Sonnet");
        assert_eq!(settings.defaults.window_size, 200_000);
        assert!(!settings.statusline.color);
        assert_eq!(settings.statusline.bar_width, 10);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sample_every = 7\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.sample_every, 7);
    }

    #[test]
    fn test_load_missing_explicit_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        temp_env::with_vars(
            [
                ("HOME", Some(dir.path().as_os_str())),
                ("XDG_CONFIG_HOME", Some(dir.path().as_os_str())),
            ],
            || {
                let settings = Settings::load(Some(&path)).unwrap();
                assert_eq!(settings.sample_every, 5);
            },
        );
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sample_every = \"often\"\n").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let cli = Config::parse_from(["ctxwatch", "--every", "2", "--state-dir", "/x", "tick"]);
        let mut settings = Settings::default();
        settings.merge_cli(&cli);

        assert_eq!(cli.command, Command::Tick);
        assert_eq!(settings.sample_every, 2);
        assert_eq!(settings.state_dir(), PathBuf::from("/x"));
    }

    #[test]
    fn test_validate_clamps_and_resets() {
        let mut settings = Settings {
            sample_every: 0,
            stdin_timeout_ms: 0,
            snapshot_prefix: String::new(),
            counter_prefix: "../evil-".to_string(),
            ..Default::default()
        };
        settings.validate();

        assert_eq!(settings.sample_every, 1);
        assert_eq!(settings.stdin_timeout_ms, 1);
        assert_eq!(settings.snapshot_prefix, "ctx-");
        assert_eq!(settings.counter_prefix, "count-");
    }

    #[test]
    fn test_validate_rejects_equal_prefixes() {
        let mut settings = Settings {
            snapshot_prefix: "same-".to_string(),
            counter_prefix: "same-".to_string(),
            ..Default::default()
        };
        settings.validate();
        assert_ne!(settings.snapshot_prefix, settings.counter_prefix);
    }

    #[test]
    fn test_default_state_dir_prefers_xdg() {
        temp_env::with_var("XDG_RUNTIME_DIR", Some("/run/user/1000"), || {
            assert_eq!(default_state_dir(), PathBuf::from("/run/user/1000/ctxwatch"));
        });
    }

    #[test]
    fn test_default_state_dir_without_xdg() {
        temp_env::with_var_unset("XDG_RUNTIME_DIR", || {
            let dir = default_state_dir();
            let name = dir.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("ctxwatch-"));
        });
    }
}
