use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// HTTP client that keeps a minimum gap between consecutive requests
pub struct ThrottledClient {
    client: Client,
    min_gap: Duration,
    last_request: Option<Instant>,
}

impl ThrottledClient {
    pub fn new(user_agent: &str, timeout_secs: u64, min_gap_ms: u64) -> Result<Self> {
        let client = Self::build_client(user_agent, timeout_secs)?;

        Ok(Self {
            client,
            min_gap: Duration::from_millis(min_gap_ms),
            last_request: None,
        })
    }

    pub async fn get(&mut self, url: &str) -> Result<reqwest::Response> {
        self.throttle().await;
        self.send_get_request(url).await
    }

    /// GET a URL and parse the body as JSON, failing on non-2xx statuses
    pub async fn get_json(&mut self, url: &str) -> Result<Value> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            bail!("{} returned status {}", url, status);
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))
    }

    fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            sleep_until(last + self.min_gap).await;
        }
        self.last_request = Some(Instant::now());
    }

    async fn send_get_request(&self, url: &str) -> Result<reqwest::Response> {
        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))
    }
}
