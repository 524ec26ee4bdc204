// Renderer module - formatting utilities
// Most rendering logic is in layout.rs, this module holds the shared
// display formatters

use chrono::{DateTime, Utc};

/// Format a payout/revenue amount for display
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format a conversion rate for display
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate)
}

/// Wall-clock time of an event, in the local column width
pub fn format_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Trim long free-text fields (ids, offer names) to a column width
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}
