/// Helper utilities for dockmon

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, Utc};
use std::time::Duration;

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T12:00:00Z`, with offset) as well as the
/// naive ISO form the backend emits for `datetime.utcnow()` values
/// (`2024-01-01T12:00:00.123456`), which is interpreted as UTC. Docker log
/// timestamps carry nanoseconds and a `Z` suffix, both of which RFC 3339
/// parsing handles.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Short local clock time for a backend timestamp, falling back to the raw text
pub fn format_clock(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}

/// The last `days` calendar dates ending at `today`, newest first
pub fn recent_dates(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as i64)
        .filter_map(|offset| today.checked_sub_signed(ChronoDuration::days(offset)))
        .collect()
}

/// Format bytes to human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format megabytes the way the dashboard cards do (GB above 1024 MB)
pub fn format_megabytes(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.2} GB", mb / 1024.0)
    } else {
        format!("{:.0} MB", mb)
    }
}

/// "12s ago" style label for the last-updated indicator
pub fn format_elapsed(since: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - since).num_seconds().max(0) as u64;
    format!("{} ago", humantime::format_duration(Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_and_naive() {
        let zulu = parse_timestamp("2024-01-01T12:00:00Z").unwrap();
        let naive = parse_timestamp("2024-01-01T12:00:00").unwrap();
        let spaced = parse_timestamp("2024-01-01 12:00:00.5").unwrap();
        assert_eq!(zulu, naive);
        assert_eq!(spaced, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + ChronoDuration::milliseconds(500));
    }

    #[test]
    fn test_parse_docker_nanoseconds() {
        let ts = parse_timestamp("2025-10-21T08:48:40.123456789Z").unwrap();
        assert_eq!(ts.timestamp(), Utc.with_ymd_and_hms(2025, 10, 21, 8, 48, 40).unwrap().timestamp());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_recent_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let dates = recent_dates(today, 3);
        assert_eq!(
            dates,
            vec![
                today,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            ]
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(512.4), "512 MB");
        assert_eq!(format_megabytes(2048.0), "2.00 GB");
    }
}
