use serde::Serialize;

/// Hook response carrying extra context for the model
///
/// Serializes as
/// `{"hookSpecificOutput":{"hookEventName":..,"additionalContext":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub additional_context: String,
}

impl HookOutput {
    pub fn additional_context(event_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event_name.into(),
                additional_context: message.into(),
            },
        }
    }

    /// The free-text message the host injects
    pub fn message(&self) -> &str {
        &self.hook_specific_output.additional_context
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
