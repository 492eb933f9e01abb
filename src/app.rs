//! Command dispatch: one host event in, at most one line out.

use anyhow::Result;

use ctxwatch_core::config::{Command, Settings};
use ctxwatch_core::hook::HookOutput;
use ctxwatch_core::snapshot::UNAVAILABLE_MESSAGE;
use ctxwatch_core::statusline;
use ctxwatch_core::{
    EventCounter, HookEvent, Namespace, ReapReport, SessionKey, SessionReaper, SnapshotReader,
    SnapshotWriter,
};

/// Host event tag used by `context` when the event does not name itself
pub const PROMPT_EVENT: &str = "UserPromptSubmit";
/// Host event tag used by `tick` when the event does not name itself
pub const TOOL_EVENT: &str = "PostToolUse";

/// Wires settings into the four components
pub struct App {
    settings: Settings,
    namespace: Namespace,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let namespace = Namespace::from_settings(&settings)?;
        Ok(Self {
            settings,
            namespace,
        })
    }

    /// Run `command` against `event`, returning what to print on stdout
    pub fn dispatch(&self, command: Command, event: &HookEvent) -> Option<String> {
        match command {
            Command::Statusline => Some(self.statusline(event)),
            Command::Context => Some(self.context(event)),
            Command::Tick => self.tick(event),
            Command::Cleanup => {
                self.cleanup(event);
                None
            }
            Command::Sweep => {
                let report = self.sweep();
                Some(format!(
                    "Removed {} records from {}",
                    report.removed,
                    self.namespace.root().display()
                ))
            }
            Command::Sessions => {
                let keys = self.sessions();
                if keys.is_empty() {
                    None
                } else {
                    Some(keys.join("\n"))
                }
            }
        }
    }

    /// Persist the payload and render the status line from it
    pub fn statusline(&self, event: &HookEvent) -> String {
        let writer = SnapshotWriter::new(self.namespace.clone(), self.settings.defaults.clone());
        let outcome = writer.write(event);
        statusline::render(&outcome.record, &self.settings.statusline)
    }

    /// Hook JSON describing the stored usage; always produced
    pub fn context(&self, event: &HookEvent) -> String {
        let reader = SnapshotReader::new(self.namespace.clone());
        let message = reader.report(event.session_id.as_deref());
        hook_json(event_name(event, PROMPT_EVENT), message)
    }

    /// Hook JSON on sampling boundaries, otherwise nothing
    pub fn tick(&self, event: &HookEvent) -> Option<String> {
        let key = SessionKey::from_optional(event.session_id.as_deref())?;
        let counter = EventCounter::new(self.namespace.clone(), self.settings.sample_every);
        let outcome = counter.tick(&key, event.tool_name.as_deref());
        tracing::debug!("Tick {} for {}", outcome.count, key);
        let message = outcome.message?;
        Some(hook_json(event_name(event, TOOL_EVENT), message))
    }

    pub fn cleanup(&self, event: &HookEvent) -> ReapReport {
        SessionReaper::new(self.namespace.clone()).cleanup(event.session_id.as_deref())
    }

    pub fn sweep(&self) -> ReapReport {
        SessionReaper::new(self.namespace.clone()).sweep()
    }

    /// Session ids that currently own records
    pub fn sessions(&self) -> Vec<String> {
        self.namespace.session_keys().unwrap_or_else(|e| {
            tracing::warn!("Failed to list sessions: {}", e);
            Vec::new()
        })
    }
}

/// Output when the components could not be constructed at all
pub fn fallback_output(command: Command, event: &HookEvent) -> Option<String> {
    match command {
        Command::Context => Some(hook_json(event_name(event, PROMPT_EVENT), UNAVAILABLE_MESSAGE)),
        _ => None,
    }
}

fn event_name<'a>(event: &'a HookEvent, default: &'a str) -> &'a str {
    event
        .hook_event_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(default)
}

fn hook_json(event_name: &str, message: impl Into<String>) -> String {
    let output = HookOutput::additional_context(event_name, message);
    output.to_json().unwrap_or_else(|e| {
        tracing::warn!("Failed to encode hook output: {}", e);
        String::new()
    })
}
