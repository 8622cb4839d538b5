/// Backend endpoints, polling cadences and display limits
///
/// Values mirror what the monitor backend and its web dashboard use, so the
/// terminal client behaves the same way against the same server.

use std::time::Duration;

/// Backend address used by local development and docker-compose setups
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Frontend dev-server ports that talk to the fixed local backend
pub const DEV_ORIGIN_PORTS: &[u16] = &[3000, 5173];

// Endpoint paths (relative to the resolved base URL)
pub const METRICS_PATH: &[&str] = &["api", "metrics"];
pub const CONTAINERS_PATH: &[&str] = &["api", "containers", "all"];
pub const CONTAINER_STATS_PATH: &[&str] = &["api", "containers", "stats"];

/// Host + container metric snapshot refresh
pub const METRICS_INTERVAL: Duration = Duration::from_millis(30_000);
/// Container inventory refresh (running + stopped)
pub const INVENTORY_INTERVAL: Duration = Duration::from_millis(5_000);
/// Total size / container count refresh
pub const STATS_INTERVAL: Duration = Duration::from_millis(30_000);
/// Full log window refetch while in static mode
pub const LOG_REFRESH_INTERVAL: Duration = Duration::from_millis(3_000);
/// Incremental tail poll while in real-time mode
pub const LOG_TAIL_INTERVAL: Duration = Duration::from_millis(2_000);

/// Lines requested per log window fetch
pub const LOG_TAIL_LINES: usize = 500;

/// Number of days offered by the log date picker (today first)
pub const LOG_HISTORY_DAYS: usize = 10;

/// CPU / memory percentage above which an alert is raised
pub const ALERT_THRESHOLD: f64 = 75.0;

/// Rows shown in the dashboard summary rankings
pub const SUMMARY_TOP: usize = 3;
/// Rows shown in the ranking tables
pub const RANKING_TOP: usize = 5;

/// HTTP request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
