use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RecordDefaults;
use crate::hook::HookEvent;
use crate::severity::{round_percent, SeverityTier};

/// Persisted usage snapshot of one session
///
/// A write always replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub session_id: String,
    /// Percentage of the window in use (0-100, unrounded)
    pub used_pct: f64,
    /// Percentage of the window still free (0-100, unrounded)
    pub remaining_pct: f64,
    /// Window capacity in tokens
    pub window_size: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
    /// Session cost in USD
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

impl SnapshotRecord {
    /// Normalize a status line event into a record
    ///
    /// Absent fields take their defaults: 0% used, 100% free, the configured
    /// window size and model placeholder, zero tokens and zero cost.
    pub fn from_event(
        session_id: &str,
        event: &HookEvent,
        defaults: &RecordDefaults,
        now: DateTime<Utc>,
    ) -> Self {
        let window = event.context_window.clone().unwrap_or_default();
        let model = event
            .model
            .as_ref()
            .and_then(|m| m.name())
            .unwrap_or(defaults.model.as_str())
            .to_string();
        let cost = event
            .cost
            .as_ref()
            .and_then(|c| c.total_cost_usd)
            .filter(|c| c.is_finite())
            .map_or(0.0, |c| c.max(0.0));

        Self {
            session_id: session_id.to_string(),
            used_pct: clamp_pct(window.used_percentage.unwrap_or(0.0)),
            remaining_pct: clamp_pct(window.remaining_percentage.unwrap_or(100.0)),
            window_size: window
                .context_window_size
                .filter(|&size| size > 0)
                .unwrap_or(defaults.window_size),
            input_tokens: window.total_input_tokens.unwrap_or(0),
            output_tokens: window.total_output_tokens.unwrap_or(0),
            model,
            cost,
            timestamp: now,
        }
    }

    pub fn used_rounded(&self) -> i64 {
        round_percent(self.used_pct)
    }

    pub fn remaining_rounded(&self) -> i64 {
        round_percent(self.remaining_pct)
    }

    pub fn tier(&self) -> SeverityTier {
        SeverityTier::from_percent(self.used_rounded())
    }

    /// Window capacity in thousands of tokens, rounded
    pub fn window_k(&self) -> u64 {
        self.window_size / 1000 + u64::from(self.window_size % 1000 >= 500)
    }
}

fn clamp_pct(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{ContextWindow, CostInfo, ModelInfo};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_for_missing_fields() {
        let now = Utc::now();
        let record = SnapshotRecord::from_event("s1", &HookEvent::default(), &RecordDefaults::default(), now);

        assert_eq!(
            record,
            SnapshotRecord {
                session_id: "s1".to_string(),
                used_pct: 0.0,
                remaining_pct: 100.0,
                window_size: 200_000,
                input_tokens: 0,
                output_tokens: 0,
                model: "Claude".to_string(),
                cost: 0.0,
                timestamp: now,
            }
        );
    }

    #[test]
    fn test_copies_recognized_fields() {
        let event = HookEvent {
            session_id: Some("s1".to_string()),
            context_window: Some(ContextWindow {
                used_percentage: Some(79.6),
                remaining_percentage: Some(20.4),
                context_window_size: Some(1_000_000),
                total_input_tokens: Some(500),
                total_output_tokens: Some(20),
            }),
            model: Some(ModelInfo {
                id: Some("opus-id".to_string()),
                display_name: Some("Opus".to_string()),
            }),
            cost: Some(CostInfo {
                total_cost_usd: Some(1.25),
            }),
            ..Default::default()
        };
        let record = SnapshotRecord::from_event("s1", &event, &RecordDefaults::default(), Utc::now());

        assert_eq!(record.used_rounded(), 80);
        assert_eq!(record.remaining_rounded(), 20);
        assert_eq!(record.tier(), SeverityTier::Critical);
        assert_eq!(record.window_k(), 1000);
        assert_eq!(record.model, "Opus");
        assert_eq!(record.cost, 1.25);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let event = HookEvent {
            context_window: Some(ContextWindow {
                used_percentage: Some(130.0),
                remaining_percentage: Some(-30.0),
                context_window_size: Some(0),
                ..Default::default()
            }),
            cost: Some(CostInfo {
                total_cost_usd: Some(-2.0),
            }),
            ..Default::default()
        };
        let record = SnapshotRecord::from_event("s1", &event, &RecordDefaults::default(), Utc::now());

        assert_eq!(record.used_pct, 100.0);
        assert_eq!(record.remaining_pct, 0.0);
        assert_eq!(record.window_size, 200_000);
        assert_eq!(record.cost, 0.0);
    }

    #[test]
    fn test_window_k_rounding_and_bounds() {
        let with_window = |size: u64| {
            let event = HookEvent::parse(
                format!(r#"{{"context_window":{{"context_window_size":{}}}}}"#, size).as_bytes(),
            );
            SnapshotRecord::from_event("s1", &event, &RecordDefaults::default(), Utc::now())
        };

        assert_eq!(with_window(200_000).window_k(), 200);
        assert_eq!(with_window(128_499).window_k(), 128);
        assert_eq!(with_window(128_500).window_k(), 129);
        assert_eq!(with_window(499).window_k(), 0);
        assert_eq!(with_window(u64::MAX).window_k(), u64::MAX / 1000 + 1);
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let record = SnapshotRecord::from_event("s1", &HookEvent::default(), &RecordDefaults::default(), Utc::now());
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
