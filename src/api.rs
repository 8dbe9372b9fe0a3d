//! HTTP adapter for the bulk robot fetch.
//!
//! A thin client over the fleet management API's robot listing endpoint.
//! Everything else the API offers (missions, scheduling, authentication)
//! is out of scope for this component and not wrapped here.

use std::future::Future;
use std::time::Duration;

use crate::backend::RobotFetcher;
use crate::error::Result;
use crate::models::Robot;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    /// Read configuration from `FLEET_API_BASE_URL` and
    /// `FLEET_API_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url =
            std::env::var("FLEET_API_BASE_URL").unwrap_or(defaults.base_url);
        let timeout = std::env::var("FLEET_API_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);

        Self { base_url, timeout }
    }
}

/// HTTP client for the robot listing endpoint.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch the current full list of known robots.
    pub async fn get_robots(&self) -> Result<Vec<Robot>> {
        let url = format!("{}/robots", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let robots = response.json::<Vec<Robot>>().await?;

        tracing::debug!(count = robots.len(), "fetched robot list");
        Ok(robots)
    }
}

impl RobotFetcher for ApiClient {
    fn fetch_all(&self) -> impl Future<Output = anyhow::Result<Vec<Robot>>> + Send {
        async move { Ok(self.get_robots().await?) }
    }
}
