//! Google Directions HTTP client.
//!
//! Provides the production [`RoutingOracle`]. Handles authentication,
//! concurrency limiting, and mapping API statuses to [`DirectionsError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use super::error::DirectionsError;
use super::query::{DirectionsQuery, RoutingOracle};
use super::types::DirectionsResponse;

/// Default base URL for the Directions API.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Path of the JSON directions endpoint.
const DIRECTIONS_PATH: &str = "/maps/api/directions/json";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the directions client.
#[derive(Debug, Clone)]
pub struct DirectionsConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the API (defaults to Google)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DirectionsConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Google Directions API client.
///
/// Uses a semaphore to limit concurrent requests so a large fan-out does not
/// trip the API's rate limits.
#[derive(Debug, Clone)]
pub struct GoogleDirectionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    semaphore: Arc<Semaphore>,
}

impl GoogleDirectionsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DirectionsConfig) -> Result<Self, DirectionsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, DIRECTIONS_PATH)
    }
}

/// Classify a transport failure, keeping timeouts distinct.
fn transport_error(e: reqwest::Error) -> DirectionsError {
    if e.is_timeout() {
        DirectionsError::Timeout
    } else {
        DirectionsError::Http(e)
    }
}

/// Map a parsed response's `status` field to a result.
fn check_status(resp: DirectionsResponse) -> Result<DirectionsResponse, DirectionsError> {
    match resp.status.as_str() {
        "OK" => Ok(resp),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(DirectionsError::RateLimited),
        "REQUEST_DENIED" => Err(DirectionsError::Unauthorized),
        _ => Err(DirectionsError::Status {
            message: resp.error_message.unwrap_or_default(),
            status: resp.status,
        }),
    }
}

#[async_trait]
impl RoutingOracle for GoogleDirectionsClient {
    async fn directions(
        &self,
        query: &DirectionsQuery,
    ) -> Result<DirectionsResponse, DirectionsError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DirectionsError::Unavailable("semaphore closed".to_string()))?;

        debug!(
            waypoints = query.waypoints.len(),
            "sending directions request"
        );

        let mut params = query.params();
        params.push(("key", self.api_key.clone()));

        let response = self
            .http
            .get(self.url())
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DirectionsError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DirectionsError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectionsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(transport_error)?;

        let parsed: DirectionsResponse =
            serde_json::from_str(&body).map_err(|e| DirectionsError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        check_status(parsed)
    }
}
