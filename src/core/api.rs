/// HTTP client for the monitor backend
///
/// `MonitorBackend` is the seam between the pollers / log session and the
/// network; `ApiClient` is the reqwest implementation used at runtime.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::core::models::{
    ContainerInventoryEntry, ContainerStats, InventoryResponse, LiveLogs, LogEntry, LogsResponse,
    MetricsResponse,
};
use crate::utils::constants::{CONTAINERS_PATH, CONTAINER_STATS_PATH, METRICS_PATH};
use crate::utils::ApiConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Operations the dashboard needs from the backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonitorBackend: Send + Sync {
    /// `GET /api/metrics`
    async fn metrics(&self) -> Result<MetricsResponse, ApiError>;

    /// `GET /api/containers/all`
    async fn containers(&self) -> Result<Vec<ContainerInventoryEntry>, ApiError>;

    /// `GET /api/containers/stats`
    async fn container_stats(&self) -> Result<ContainerStats, ApiError>;

    /// `GET /api/containers/{name}/logs?tail=N&date=YYYY-MM-DD`
    async fn logs(&self, container: &str, date: NaiveDate, tail: usize) -> Result<Vec<LogEntry>, ApiError>;

    /// `GET /api/containers/{name}/logs/live?since=...` (empty `since` = fresh tail)
    async fn live_logs(&self, container: &str, since: Option<String>) -> Result<LiveLogs, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments (each segment is percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url_str = url.to_string();
        debug!(url = %url_str, "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url_str.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url: url_str, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url: url_str, source })
    }
}

#[async_trait]
impl MonitorBackend for ApiClient {
    async fn metrics(&self) -> Result<MetricsResponse, ApiError> {
        self.get_json(self.endpoint(METRICS_PATH), &[]).await
    }

    async fn containers(&self) -> Result<Vec<ContainerInventoryEntry>, ApiError> {
        let response: InventoryResponse = self.get_json(self.endpoint(CONTAINERS_PATH), &[]).await?;
        Ok(response.containers)
    }

    async fn container_stats(&self) -> Result<ContainerStats, ApiError> {
        self.get_json(self.endpoint(CONTAINER_STATS_PATH), &[]).await
    }

    async fn logs(&self, container: &str, date: NaiveDate, tail: usize) -> Result<Vec<LogEntry>, ApiError> {
        let url = self.endpoint(&["api", "containers", container, "logs"]);
        let query = [
            ("tail", tail.to_string()),
            ("date", date.format("%Y-%m-%d").to_string()),
        ];
        let response: LogsResponse = self.get_json(url, &query).await?;

        match response.error {
            Some(err) => Err(ApiError::Backend(err)),
            None => Ok(response.logs),
        }
    }

    async fn live_logs(&self, container: &str, since: Option<String>) -> Result<LiveLogs, ApiError> {
        let url = self.endpoint(&["api", "containers", container, "logs", "live"]);
        let query = [("since", since.unwrap_or_default())];
        let mut response: LiveLogs = self.get_json(url, &query).await?;

        match response.error.take() {
            Some(err) => Err(ApiError::Backend(err)),
            None => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = client("http://localhost:8000");
        assert_eq!(api.endpoint(METRICS_PATH).as_str(), "http://localhost:8000/api/metrics");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://monitor.example.com/dockmon/");
        assert_eq!(
            api.endpoint(CONTAINERS_PATH).as_str(),
            "https://monitor.example.com/dockmon/api/containers/all"
        );
    }

    #[test]
    fn test_container_name_is_encoded() {
        let api = client("http://localhost:8000");
        let url = api.endpoint(&["api", "containers", "web/../x", "logs"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/containers/web%2F..%2Fx/logs");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) is closed on CI machines
        let api = client("http://127.0.0.1:9");
        match api.metrics().await {
            Err(ApiError::Transport { url, .. }) => assert!(url.ends_with("/api/metrics")),
            other => panic!("expected transport error, got {:?}", other.map(|_| ())),
        }
    }
}
