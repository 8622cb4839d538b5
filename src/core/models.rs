/// Wire types returned by the monitor backend

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::log_parser::infer_level;

/// One host resource sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetricSample {
    pub timestamp: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    #[serde(default)]
    pub disk_read_kb: f64,
    #[serde(default)]
    pub disk_write_mb: f64,
    #[serde(default)]
    pub network_in_mbit: f64,
    #[serde(default)]
    pub network_out_mbit: f64,
}

/// One container resource sample. Many samples share a `container_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetricSample {
    pub container_id: String,
    pub container_name: String,
    pub timestamp: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_limit_mb: f64,
}

/// Docker container state as reported by the inventory endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerStatus {
    Running,
    Exited,
    Paused,
    Other(String),
}

impl ContainerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerStatus::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContainerStatus::Running => "running",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ContainerStatus {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "running" => ContainerStatus::Running,
            "exited" => ContainerStatus::Exited,
            "paused" => ContainerStatus::Paused,
            _ => ContainerStatus::Other(raw),
        }
    }
}

impl From<ContainerStatus> for String {
    fn from(status: ContainerStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Capitalized for tables: "Running", "Exited", ...
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

/// Entry of the container inventory (running and stopped containers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInventoryEntry {
    pub id: String,
    pub name: String,
    pub status: ContainerStatus,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub uptime_label: String,
    #[serde(default)]
    pub uptime_display: String,
}

/// Aggregate size of all containers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    #[serde(default)]
    pub total_size_gb: f64,
    #[serde(default)]
    pub container_count: u64,
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    #[serde(alias = "WARN")]
    Warning,
    Info,
}

impl LogLevel {
    /// Parse a backend level label; unknown labels yield `None`
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARNING" | "WARN" => Some(LogLevel::Warning),
            "INFO" => Some(LogLevel::Info),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN ",
            LogLevel::Info => "INFO ",
        }
    }
}

/// A single container log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl LogEntry {
    /// Reported level, or the level inferred from the message text
    pub fn effective_level(&self) -> LogLevel {
        self.level.unwrap_or_else(|| infer_level(&self.message))
    }
}

/// Levels the backend may add later (DEBUG, TRACE, ...) fall back to inference
fn lenient_level<'de, D>(deserializer: D) -> Result<Option<LogLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(LogLevel::from_label))
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub host_metrics: Vec<HostMetricSample>,
    #[serde(default)]
    pub container_metrics: Vec<ContainerMetricSample>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryResponse {
    #[serde(default)]
    pub containers: Vec<ContainerInventoryEntry>,
}

/// `/logs` response; the backend reports failures in-band via `error`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `/logs/live` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LiveLogs {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub latest_timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_sample_defaults_io_fields() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00","cpu_percent":12.5,
            "memory_percent":40.0,"memory_used_mb":2048.0,"memory_total_mb":8192.0}"#;
        let sample: HostMetricSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.cpu_percent, 12.5);
        assert_eq!(sample.disk_read_kb, 0.0);
        assert_eq!(sample.network_out_mbit, 0.0);
    }

    #[test]
    fn test_inventory_status_mapping() {
        let json = r#"{"containers":[
            {"id":"a1","name":"web","status":"running","image":"nginx:latest",
             "uptime_label":"Up","uptime_display":"2h 5m","cpu_percent":0.0},
            {"id":"b2","name":"db","status":"created"}]}"#;
        let response: InventoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.containers[0].status, ContainerStatus::Running);
        assert_eq!(response.containers[1].status, ContainerStatus::Other("created".to_string()));
        assert_eq!(response.containers[1].status.to_string(), "Created");
        assert!(response.containers[1].image.is_empty());
    }

    #[test]
    fn test_log_entry_level_inference() {
        let json = r#"{"logs":[
            {"timestamp":"2024-01-01T00:00:00Z","message":"GET / 502","level":null},
            {"message":"all good","level":"WARNING","details":{"severity":"medium"}}]}"#;
        let response: LogsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.logs[0].effective_level(), LogLevel::Error);
        assert_eq!(response.logs[1].effective_level(), LogLevel::Warning);
        assert!(response.error.is_none());
    }

    #[test]
    fn test_unknown_level_falls_back_to_inference() {
        let json = r#"{"message":"deprecated flag used","level":"DEBUG"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert!(entry.level.is_none());
        assert_eq!(entry.effective_level(), LogLevel::Warning);
    }

    #[test]
    fn test_backend_error_envelope() {
        let json = r#"{"error":"Container not found","logs":[]}"#;
        let response: LiveLogs = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.as_deref(), Some("Container not found"));
        assert!(response.latest_timestamp.is_none());
    }
}
