//! `LangSmith` HTTP client

use crate::error::{Error, Result};
use crate::run::{RunCreate, RunUpdate};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

// Environment variable names (matching dashflow::core::config_loader::env_vars constants)
// Note: Cannot import from dashflow due to cyclic dependency
const LANGSMITH_API_KEY: &str = "LANGSMITH_API_KEY";
const LANGCHAIN_API_KEY: &str = "LANGCHAIN_API_KEY";
const LANGSMITH_ENDPOINT: &str = "LANGSMITH_ENDPOINT";
const LANGCHAIN_ENDPOINT: &str = "LANGCHAIN_ENDPOINT";
const LANGSMITH_PROJECT: &str = "LANGSMITH_PROJECT";
const LANGCHAIN_PROJECT: &str = "LANGCHAIN_PROJECT";

/// Helper to read a string from environment variable
fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Default API URL for `LangSmith`
pub const DEFAULT_API_URL: &str = "https://api.smith.dashflow.com";

/// Default timeout for API requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `LangSmith` client for creating and managing runs
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http_client: reqwest::Client,
    api_url: String,
    project_name: Option<String>,
}

impl Client {
    /// Create a new client builder
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from environment variables
    ///
    /// Reads:
    /// - `LANGSMITH_API_KEY` or `LANGCHAIN_API_KEY` for authentication
    /// - `LANGSMITH_ENDPOINT` or `LANGCHAIN_ENDPOINT` for API URL
    /// - `LANGSMITH_PROJECT` or `LANGCHAIN_PROJECT` for default project
    pub fn from_env() -> Result<Self> {
        ClientBuilder::default().from_env()?.build()
    }

    /// Create a run
    pub async fn create_run(&self, run: &RunCreate) -> Result<()> {
        let url = format!("{}/runs", self.inner.api_url);

        debug!("Creating run: {} ({})", run.name, run.id);

        let response = self.inner.http_client.post(&url).json(run).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Failed to create run: {} - {}", status, body);
            return Err(Error::api_error(status, body));
        }

        debug!("Successfully created run: {}", run.id);
        Ok(())
    }

    /// Update a run
    pub async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()> {
        let url = format!("{}/runs/{}", self.inner.api_url, run_id);

        debug!("Updating run: {}", run_id);

        let response = self
            .inner
            .http_client
            .patch(&url)
            .json(update)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Failed to update run: {} - {}", status, body);
            return Err(Error::api_error(status, body));
        }

        debug!("Successfully updated run: {}", run_id);
        Ok(())
    }

    /// Batch create/update runs
    pub async fn batch_ingest_runs(&self, batch: &BatchIngest) -> Result<()> {
        let url = format!("{}/runs/batch", self.inner.api_url);

        debug!(
            "Batch ingesting {} creates and {} updates",
            batch.post.len(),
            batch.patch.len()
        );

        let response = self.inner.http_client.post(&url).json(batch).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Failed to batch ingest runs: {} - {}", status, body);
            return Err(Error::api_error(status, body));
        }

        debug!(
            "Successfully batch ingested {} runs",
            batch.post.len() + batch.patch.len()
        );
        Ok(())
    }

    /// Get the default project name
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.inner.project_name.as_deref()
    }

    /// Get the API URL
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }
}

/// Batch ingestion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIngest {
    /// Runs to create
    pub post: Vec<RunCreate>,
    /// Run updates (`run_id`, update)
    pub patch: Vec<(Uuid, RunUpdate)>,
}

impl BatchIngest {
    /// Create a new empty batch
    pub fn new() -> Self {
        Self {
            post: Vec::new(),
            patch: Vec::new(),
        }
    }

    /// Add a run creation to the batch
    pub fn add_create(&mut self, run: RunCreate) {
        self.post.push(run);
    }

    /// Add a run update to the batch
    pub fn add_update(&mut self, run_id: Uuid, update: RunUpdate) {
        self.patch.push((run_id, update));
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.post.is_empty() && self.patch.is_empty()
    }

    /// Get the total number of operations
    pub fn len(&self) -> usize {
        self.post.len() + self.patch.len()
    }
}

impl Default for BatchIngest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `LangSmith` client
#[derive(Default)]
pub struct ClientBuilder {
    api_url: Option<String>,
    api_key: Option<String>,
    project_name: Option<String>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Set the API URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the default project name
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables
    pub fn from_env(mut self) -> Result<Self> {
        // Try LANGSMITH_* variables first, then LANGCHAIN_* as fallback
        if self.api_key.is_none() {
            self.api_key = env_string(LANGSMITH_API_KEY).or_else(|| env_string(LANGCHAIN_API_KEY));
        }

        if self.api_url.is_none() {
            self.api_url =
                env_string(LANGSMITH_ENDPOINT).or_else(|| env_string(LANGCHAIN_ENDPOINT));
        }

        if self.project_name.is_none() {
            self.project_name =
                env_string(LANGSMITH_PROJECT).or_else(|| env_string(LANGCHAIN_PROJECT));
        }

        Ok(self)
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::config("API key is required"))?;

        let api_url = self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        // Build headers
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::config(format!("Invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Build HTTP client with optimized connection pooling
        // Note: We apply HTTP client optimizations (pool size, keepalive, etc.) manually
        // because reqwest doesn't allow rebuilding a client with additional headers
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32) // LLM-optimized connection pooling
            .pool_idle_timeout(Duration::from_secs(90)) // Longer connection reuse
            .tcp_keepalive(Duration::from_secs(60)) // Proactive broken connection detection
            .connect_timeout(Duration::from_secs(10)) // Connection establishment timeout
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                api_url,
                project_name: self.project_name,
            }),
        })
    }
}
