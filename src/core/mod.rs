pub mod models;
pub mod api;
pub mod log_parser;
pub mod aggregate;
pub mod snapshot;
pub mod registry;
pub mod alerts;
pub mod log_session;
pub mod poller;

pub use api::{ApiClient, ApiError, MonitorBackend};
pub use models::{
    ContainerInventoryEntry, ContainerMetricSample, ContainerStats, ContainerStatus, HostMetricSample, LiveLogs,
    LogEntry, LogLevel, MetricsResponse,
};
pub use log_parser::{infer_level, LogCounts, LogFilter};
pub use aggregate::{LatestCache, RankBy};
pub use snapshot::SnapshotStore;
pub use registry::{ContainerRegistry, ContainerRow, StatusFilter};
pub use alerts::{Alert, Severity};
pub use log_session::{ApplyOutcome, ContainerRef, LogMode, LogRequest, LogResponse, LogSession, SessionState, TimerKind};
pub use poller::{LogTicker, PollHandle};
