/// Severity classification and filtering of container log entries
///
/// The backend tags most entries with a level, but older entries and some
/// live-tail payloads arrive without one. For those the level is inferred
/// from the message text with the same keyword rules the backend uses:
/// - `error|500|502|503|504|failed|exception|fatal` => ERROR
/// - `warn|warning|deprecated` => WARNING
/// - anything else => INFO
///
/// Matching is case-insensitive and on word boundaries, so "errors" or
/// "5000" do not count. The footer counters use this same function.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::core::models::{LogEntry, LogLevel};

/// Infer a level from a raw log message
pub fn infer_level(message: &str) -> LogLevel {
    static ERROR_RE: OnceLock<Regex> = OnceLock::new();
    static WARNING_RE: OnceLock<Regex> = OnceLock::new();

    let error_re = ERROR_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(error|500|502|503|504|failed|exception|fatal)\b").unwrap()
    });

    let warning_re = WARNING_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(warn|warning|deprecated)\b").unwrap()
    });

    if error_re.is_match(message) {
        LogLevel::Error
    } else if warning_re.is_match(message) {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }
}

/// Severity filter applied to the log viewer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFilter {
    #[default]
    All,
    Error,
    Warning,
    Info,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Error => entry.effective_level() == LogLevel::Error,
            LogFilter::Warning => entry.effective_level() == LogLevel::Warning,
            LogFilter::Info => entry.effective_level() == LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFilter::All => "all",
            LogFilter::Error => "error",
            LogFilter::Warning => "warning",
            LogFilter::Info => "info",
        }
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(LogFilter::All),
            "error" | "errors" => Ok(LogFilter::Error),
            "warning" | "warn" | "warnings" => Ok(LogFilter::Warning),
            "info" => Ok(LogFilter::Info),
            other => Err(format!("unknown log filter '{}' (expected all, error, warning, info)", other)),
        }
    }
}

/// Per-level totals shown in the log viewer footer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl LogCounts {
    pub fn tally<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match entry.effective_level() {
                LogLevel::Error => counts.error += 1,
                LogLevel::Warning => counts.warning += 1,
                LogLevel::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Total size of the message text, in bytes (UTF-8)
pub fn message_bytes<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> u64 {
    entries.into_iter().map(|e| e.message.len() as u64).sum()
}
