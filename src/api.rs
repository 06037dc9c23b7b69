// Scenic-spot API client: request building, transport-status validation and
// JSON parsing for the PTX tourism feed.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://ptx.transportdata.tw/MOTC/v2/Tourism/ScenicSpot";

// Error types for the fetch/validate/parse chain
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Error in request: {0}")]
    Http(String),

    #[error("Malformed response body: {0}")]
    Parse(String),
}

/// One tourist-spot record as the feed returns it. `Description` is often
/// empty; `DescriptionDetail` carries the longer fallback text. The feed is
/// ragged, so every field defaults to empty when missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Attraction {
    pub name: String,
    pub description: String,
    pub description_detail: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Seam between the browser and the network, so tests run against
/// `mock_api::MockApi` and production against `HttpScenicSpotApi`.
#[async_trait]
pub trait ScenicSpotApi: Send + Sync + 'static {
    /// Fetch one page of attractions for a city. `skip` is the offset of
    /// the first record, `None` for the first page.
    async fn fetch_page(
        &self,
        city: &str,
        top: usize,
        skip: Option<usize>,
    ) -> Result<Vec<Attraction>, ApiError>;
}

pub struct HttpScenicSpotApi {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpScenicSpotApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    // The feed uses OData-style paging parameters; the city is a raw path
    // segment.
    fn request_url(&self, city: &str, top: usize, skip: Option<usize>) -> String {
        match skip {
            Some(n) => format!("{}/{}?$top={}&$skip={}", self.config.base_url, city, top, n),
            None => format!("{}/{}?$top={}", self.config.base_url, city, top),
        }
    }
}

/// Pass the response through only when the transport-level status indicates
/// success; otherwise fail with the status text. Applied identically to
/// first-page and next-page requests.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::Http(text))
    }
}

#[async_trait]
impl ScenicSpotApi for HttpScenicSpotApi {
    async fn fetch_page(
        &self,
        city: &str,
        top: usize,
        skip: Option<usize>,
    ) -> Result<Vec<Attraction>, ApiError> {
        let url = self.request_url(city, top, skip);
        tracing::debug!(%url, "requesting attraction page");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let response = check_status(response)?;

        // Read the body first so a bad payload surfaces as a parse error
        // rather than a transport one.
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

// Mock API for testing (benches use it too, so it stays out of cfg(test))
pub mod mock_api {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// One recorded fetch: (city, top, skip).
    pub type RequestRecord = (String, usize, Option<usize>);

    /// In-memory scenic-spot feed: per-city fixture data sliced by
    /// top/skip, a fail-next counter, a configurable delay with jitter and
    /// a request log for asserting offsets.
    #[derive(Default)]
    pub struct MockApi {
        cities: Mutex<HashMap<String, Vec<Attraction>>>,
        requests: Mutex<Vec<RequestRecord>>,
        request_count: AtomicUsize,
        fail_next: AtomicUsize,
        delay_ms: AtomicUsize,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_city(&self, city: &str, attractions: Vec<Attraction>) {
            let mut cities = self.cities.lock().await;
            cities.insert(city.to_string(), attractions);
        }

        /// Fail the next `count` fetches with a 503-style status text.
        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next.store(count, Ordering::SeqCst);
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        pub async fn requests(&self) -> Vec<RequestRecord> {
            self.requests.lock().await.clone()
        }
    }

    /// Fixture helper.
    pub fn attraction(name: &str, description: &str, detail: &str) -> Attraction {
        Attraction {
            name: name.to_string(),
            description: description.to_string(),
            description_detail: detail.to_string(),
        }
    }

    #[async_trait]
    impl ScenicSpotApi for MockApi {
        async fn fetch_page(
            &self,
            city: &str,
            top: usize,
            skip: Option<usize>,
        ) -> Result<Vec<Attraction>, ApiError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .await
                .push((city.to_string(), top, skip));

            // Simulate latency, with jitter for realism
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                let jitter = rand::random::<usize>() % delay;
                tokio::time::sleep(Duration::from_millis((delay + jitter / 4) as u64)).await;
            }

            let fail_count = self.fail_next.load(Ordering::SeqCst);
            if fail_count > 0 {
                self.fail_next.store(fail_count - 1, Ordering::SeqCst);
                return Err(ApiError::Http("Service Unavailable".to_string()));
            }

            let cities = self.cities.lock().await;
            let all = match cities.get(city) {
                Some(list) => list,
                None => return Ok(vec![]),
            };
            let start = skip.unwrap_or(0).min(all.len());
            let end = (start + top).min(all.len());
            Ok(all[start..end].to_vec())
        }
    }
}
