/// Metric snapshot store
///
/// Holds the last successful `/api/metrics` response. Every poll replaces
/// the series wholesale; a failed poll only sets the error banner.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::core::api::ApiError;
use crate::core::models::{ContainerMetricSample, HostMetricSample, MetricsResponse};

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pub host_metrics: Vec<HostMetricSample>,
    pub container_metrics: Vec<ContainerMetricSample>,
    /// Raw message of the last failed poll, cleared by the next success
    pub error: Option<String>,
    /// True until the first poll resolves
    pub loading: bool,
    pub last_updated: Option<DateTime<Local>>,
    version: u64,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self {
            host_metrics: Vec::new(),
            container_metrics: Vec::new(),
            error: None,
            loading: true,
            last_updated: None,
            version: 0,
        }
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented on every successful apply
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, result: Result<MetricsResponse, ApiError>) {
        self.apply_at(result, Local::now());
    }

    pub fn apply_at(&mut self, result: Result<MetricsResponse, ApiError>, now: DateTime<Local>) {
        self.loading = false;

        match result {
            Ok(response) => {
                debug!(
                    host = response.host_metrics.len(),
                    containers = response.container_metrics.len(),
                    "Metrics snapshot applied"
                );
                self.host_metrics = response.host_metrics;
                self.container_metrics = response.container_metrics;
                self.error = None;
                self.last_updated = Some(now);
                self.version += 1;
            }
            Err(e) => {
                warn!("Metrics poll failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Mark a manual refetch: the "last updated" label restarts from now
    pub fn touch(&mut self) {
        self.last_updated = Some(Local::now());
    }

    pub fn is_empty(&self) -> bool {
        self.host_metrics.is_empty() && self.container_metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::tests::{host, sample};

    fn response(cpu: f64) -> MetricsResponse {
        MetricsResponse {
            host_metrics: vec![host(cpu, 10.0, "2024-01-01T00:00:00")],
            container_metrics: vec![sample("web", cpu, "2024-01-01T00:00:00")],
        }
    }

    #[test]
    fn test_starts_loading() {
        let store = SnapshotStore::new();
        assert!(store.loading);
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_success_replaces_in_full() {
        let mut store = SnapshotStore::new();
        store.apply(Ok(response(10.0)));
        store.apply(Ok(response(20.0)));

        assert_eq!(store.host_metrics.len(), 1);
        assert_eq!(store.container_metrics.len(), 1);
        assert_eq!(store.container_metrics[0].cpu_percent, 20.0);
        assert_eq!(store.version(), 2);
        assert!(!store.loading);
        assert!(store.last_updated.is_some());
    }

    #[test]
    fn test_failure_keeps_data_and_sets_error() {
        let mut store = SnapshotStore::new();
        store.apply(Ok(response(10.0)));
        store.apply(Err(ApiError::Backend("connection reset".to_string())));

        assert_eq!(store.container_metrics[0].cpu_percent, 10.0);
        assert_eq!(store.error.as_deref(), Some("backend error: connection reset"));
        assert_eq!(store.version(), 1);

        store.apply(Ok(response(30.0)));
        assert!(store.error.is_none());
    }

    #[test]
    fn test_first_failure_ends_loading() {
        let mut store = SnapshotStore::new();
        store.apply(Err(ApiError::Backend("down".to_string())));
        assert!(!store.loading);
        assert!(store.last_updated.is_none());
    }
}
