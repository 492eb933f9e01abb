//! Status line rendering for the snapshot writer.

use owo_colors::{AnsiColors, OwoColorize};

use crate::config::StatuslineSettings;
use crate::severity::SeverityTier;
use crate::snapshot::SnapshotRecord;

const SEPARATOR: &str = " │ ";

/// Render one status line from an in-memory record
///
/// `<model> │ <bar> <used>% │ <in> in / <out> out │ $<cost>`
pub fn render(record: &SnapshotRecord, settings: &StatuslineSettings) -> String {
    let used = record.used_rounded();
    let tier = record.tier();
    let gauge = format!("{} {}%", bar(used, settings.bar_width), used);
    let tokens = format!(
        "{} in / {} out",
        compact_count(record.input_tokens),
        compact_count(record.output_tokens)
    );
    let cost = format!("${:.2}", record.cost);

    if !settings.color {
        return [record.model.as_str(), gauge.as_str(), tokens.as_str(), cost.as_str()].join(SEPARATOR);
    }

    let gauge = match tier {
        SeverityTier::Critical => gauge.color(tier_color(tier)).bold().to_string(),
        _ => gauge.color(tier_color(tier)).to_string(),
    };
    [
        record.model.cyan().bold().to_string(),
        gauge,
        tokens.dimmed().to_string(),
        cost.dimmed().to_string(),
    ]
    .join(SEPARATOR)
}

fn tier_color(tier: SeverityTier) -> AnsiColors {
    match tier {
        SeverityTier::Nominal => AnsiColors::Green,
        SeverityTier::Moderate => AnsiColors::Yellow,
        SeverityTier::High => AnsiColors::BrightRed,
        SeverityTier::Critical => AnsiColors::Red,
    }
}

/// Usage bar with `width` cells, filled proportionally to `used`
fn bar(used: i64, width: usize) -> String {
    let width = width.max(1);
    let used = used.clamp(0, 100) as usize;
    let filled = ((used * width) + 50) / 100;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// 950 -> "950", 84000 -> "84k", 12500 -> "12.5k", 1200000 -> "1.2M"
fn compact_count(n: u64) -> String {
    let (value, suffix) = if n >= 1_000_000 {
        (n as f64 / 1_000_000.0, "M")
    } else if n >= 1_000 {
        (n as f64 / 1_000.0, "k")
    } else {
        return n.to_string();
    };
    let formatted = format!("{:.1}", value);
    format!("{}{}", formatted.trim_end_matches(".0"), suffix)
}
