//! Lenient decoding of host events.
//!
//! Every field is optional. A block with an unexpected shape is dropped on
//! its own instead of invalidating the whole event, and input that is not a
//! JSON object decodes to [`HookEvent::default`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Usage block of the status line payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContextWindow {
    #[serde(default)]
    pub used_percentage: Option<f64>,
    #[serde(default)]
    pub remaining_percentage: Option<f64>,
    #[serde(default)]
    pub context_window_size: Option<u64>,
    #[serde(default)]
    pub total_input_tokens: Option<u64>,
    #[serde(default)]
    pub total_output_tokens: Option<u64>,
}

/// Model block of the status line payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ModelInfo {
    /// Human-facing name, falling back to the model id
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Cost block of the status line payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CostInfo {
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

/// One event delivered by the host on stdin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookEvent {
    pub session_id: Option<String>,
    pub hook_event_name: Option<String>,
    pub tool_name: Option<String>,
    pub context_window: Option<ContextWindow>,
    pub model: Option<ModelInfo>,
    pub cost: Option<CostInfo>,
}

impl HookEvent {
    /// Decode raw stdin bytes; anything unparsable yields an empty event
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                tracing::debug!("Malformed hook input, treating as empty event: {}", e);
                Self::default()
            }
        }
    }

    /// Extract the recognized fields from a decoded JSON value
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            tracing::debug!("Hook input is not a JSON object, treating as empty event");
            return Self::default();
        };

        let string = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            session_id: string("session_id"),
            hook_event_name: string("hook_event_name"),
            tool_name: string("tool_name"),
            context_window: block(obj.get("context_window")),
            model: block(obj.get("model")),
            cost: block(obj.get("cost")),
        }
    }
}

fn block<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    let value = value?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Ignoring malformed block: {}", e);
            None
        }
    }
}
