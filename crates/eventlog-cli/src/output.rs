//! Output formatting utilities.

use chrono::SecondsFormat;
use eventlog_cache::CachedRecord;
use serde::Serialize;

/// One cached event as printed by `list --json`.
#[derive(Debug, Serialize)]
pub struct EventSummary<'a> {
    pub position: &'a str,
    pub stream_id: String,
    pub event_number: i64,
    pub event_type: &'a str,
    pub timestamp: String,
    pub data: String,
    pub metadata: String,
}

impl<'a> From<&'a CachedRecord> for EventSummary<'a> {
    fn from(cached: &'a CachedRecord) -> Self {
        let record = &cached.record;
        Self {
            position: &cached.position,
            stream_id: record.stream_id.to_string(),
            event_number: record.event_number,
            event_type: &record.event_type,
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            data: String::from_utf8_lossy(&record.data).into_owned(),
            metadata: String::from_utf8_lossy(&record.metadata).into_owned(),
        }
    }
}

/// Formats a cached event as a table row.
pub fn format_table_row(cached: &CachedRecord) -> String {
    let record = &cached.record;
    format!(
        "{:<12} {:<30} {:>8} {:<20} {}",
        truncate(&cached.position, 12),
        truncate(&record.stream_id.to_string(), 30),
        record.event_number,
        truncate(&record.event_type, 20),
        record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<12} {:<30} {:>8} {:<20} {}",
        "POSITION", "STREAM", "NUMBER", "TYPE", "TIMESTAMP"
    );
    println!("{}", "-".repeat(100));
}

/// Shortens `s` to at most `max_len` characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("orders-1", 12), "orders-1");
        assert_eq!(truncate("a-very-long-stream-name", 10), "a-very-...");
    }
}
