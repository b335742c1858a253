use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::args::{PositiveU64, ResourceKind};
use crate::error::HttpError;

use super::probe::error_message;

const CONCURRENT_PATH: &str = "/test/concurrent";
const STRESS_PATH: &str = "/test/stress";
const SYSTEM_PATH: &str = "/test/system";

/// Standard backend response wrapper; only `data` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Pre-aggregated result of a backend load or stress run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggregateStats {
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub average_response_ms: u64,
    pub min_response_ms: u64,
    pub max_response_ms: u64,
    pub requests_per_second: f64,
    pub duration_ms: u64,
    /// Epoch seconds.
    pub start_time: i64,
    /// Epoch seconds.
    pub end_time: i64,
}

/// The backend reports `alloc_mb` and `sys_mb` as fractional megabytes and
/// the remaining sizes in bytes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MemoryInfo {
    pub alloc_mb: f64,
    #[serde(default)]
    pub total_alloc: Option<u64>,
    pub sys_mb: f64,
    #[serde(default)]
    pub heap_alloc: Option<u64>,
    #[serde(default)]
    pub heap_sys: Option<u64>,
    pub heap_objects: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GcInfo {
    pub num_gc: u64,
    pub pause_total_ns: u64,
    #[serde(default)]
    pub pause_avg_ns: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub go_version: Option<String>,
    pub cpu_count: u64,
    pub goroutine_count: u64,
    pub memory: MemoryInfo,
    pub gc: GcInfo,
    /// Epoch seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentParams {
    pub concurrency: PositiveU64,
    pub requests: PositiveU64,
    pub delay_ms: u64,
}

impl Default for ConcurrentParams {
    fn default() -> Self {
        Self {
            concurrency: PositiveU64::try_from(10).unwrap_or(PositiveU64::MIN),
            requests: PositiveU64::try_from(100).unwrap_or(PositiveU64::MIN),
            delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressParams {
    pub duration_secs: PositiveU64,
    pub concurrency: PositiveU64,
}

impl Default for StressParams {
    fn default() -> Self {
        Self {
            duration_secs: PositiveU64::try_from(60).unwrap_or(PositiveU64::MIN),
            concurrency: PositiveU64::try_from(20).unwrap_or(PositiveU64::MIN),
        }
    }
}

/// Thin typed client for the backend's own test endpoints. The backend does
/// the work; this side only encodes parameters and decodes `data`.
#[derive(Debug, Clone)]
pub struct RemoteLoadTrigger {
    client: Client,
    base_url: Url,
}

impl RemoteLoadTrigger {
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Asks the backend to run a concurrent load test.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails or the response cannot be decoded.
    pub async fn trigger_concurrent(
        &self,
        params: ConcurrentParams,
    ) -> Result<AggregateStats, HttpError> {
        let query = [
            ("concurrency", params.concurrency.get().to_string()),
            ("requests", params.requests.get().to_string()),
            ("delay", params.delay_ms.to_string()),
        ];
        self.fetch_data(CONCURRENT_PATH, &query).await
    }

    /// Asks the backend to run a stress test.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails or the response cannot be decoded.
    pub async fn trigger_stress(&self, params: StressParams) -> Result<AggregateStats, HttpError> {
        let query = [
            ("duration", params.duration_secs.get().to_string()),
            ("concurrency", params.concurrency.get().to_string()),
        ];
        self.fetch_data(STRESS_PATH, &query).await
    }

    /// Fetches the backend's runtime information.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails or the response cannot be decoded.
    pub async fn system_info(&self) -> Result<SystemInfo, HttpError> {
        self.fetch_data(SYSTEM_PATH, &[]).await
    }

    /// Runs one of the backend resource tests with its default parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails or the response cannot be decoded.
    pub async fn resource_test(&self, kind: ResourceKind) -> Result<serde_json::Value, HttpError> {
        let path = format!("/test/{}", kind.as_str());
        let query: Vec<(&str, String)> = kind
            .default_query()
            .iter()
            .map(|(key, value)| (*key, (*value).to_owned()))
            .collect();
        self.fetch_data(&path, &query).await
    }

    async fn fetch_data<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| HttpError::JoinUrlFailed {
                url: path.to_owned(),
                source: err,
            })?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        let url_text = url.to_string();

        debug!("Calling backend endpoint {}", url_text);
        let response = self.client.get(url).send().await.map_err(|err| {
            warn!("Backend call to {} failed: {}", url_text, error_message(&err));
            HttpError::RequestFailed {
                url: url_text.clone(),
                source: err,
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| HttpError::ReadBodyFailed {
                url: url_text.clone(),
                source: err,
            })?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|err| HttpError::DecodeFailed {
                url: url_text,
                status,
                source: err,
            })?;
        Ok(envelope.data)
    }
}
