//! Severity tiers derived from context usage.
//!
//! Thresholds are closed above: 80 is Critical, 79 is High.

use serde::{Deserialize, Serialize};

/// Four fixed bands of context usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    /// Below 40%
    Nominal,
    /// 40% to 59%
    Moderate,
    /// 60% to 79%
    High,
    /// 80% and above
    Critical,
}

impl SeverityTier {
    pub const CRITICAL_AT: i64 = 80;
    pub const HIGH_AT: i64 = 60;
    pub const MODERATE_AT: i64 = 40;

    /// Classify a rounded usage percentage
    pub fn from_percent(used: i64) -> Self {
        if used >= Self::CRITICAL_AT {
            Self::Critical
        } else if used >= Self::HIGH_AT {
            Self::High
        } else if used >= Self::MODERATE_AT {
            Self::Moderate
        } else {
            Self::Nominal
        }
    }

    /// Bracketed message tag
    pub fn tag(self) -> &'static str {
        match self {
            Self::Nominal => "CONTEXT OK",
            Self::Moderate => "CONTEXT MODERATE",
            Self::High => "CONTEXT HIGH",
            Self::Critical => "CONTEXT CRITICAL",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Nominal => "🟢",
            Self::Moderate => "🟡",
            Self::High => "🟠",
            Self::Critical => "🔴",
        }
    }

    /// Instruction appended to the prompt-time message
    pub fn directive(self) -> Option<&'static str> {
        match self {
            Self::Critical => Some(
                "Context is nearly exhausted: suggest running /compact or starting a fresh session before continuing.",
            ),
            Self::High => Some("Keep responses brief and avoid reading large files unless required."),
            Self::Moderate | Self::Nominal => None,
        }
    }

    /// Remediation appended to the periodic tool-use message
    pub fn remediation(self) -> Option<&'static str> {
        match self {
            Self::Critical => Some("Wrap up the current step and run /compact or start a fresh session."),
            Self::High => Some("Prefer targeted reads and concise output."),
            Self::Moderate => Some("Keep an eye on context growth."),
            Self::Nominal => None,
        }
    }
}

/// Round a percentage half away from zero (79.6 -> 80, 42.4 -> 42)
pub fn round_percent(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}
