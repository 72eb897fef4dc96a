//! `RemoteRunnable` client for calling `LangServe` servers over HTTP
//!
//! # Retry Support (M-196)
//!
//! The client supports automatic retries for transient network errors using
//! exponential backoff with jitter. Use `with_retry_policy()` to configure:
//!
//! ```rust,ignore
//! use dashflow_langserve::client::RemoteRunnable;
//! use dashflow::core::retry::RetryPolicy;
//!
//! let remote = RemoteRunnable::new("http://localhost:8000/my_runnable/")?
//!     .with_retry_policy(RetryPolicy::default_jitter(3)); // 3 retries
//! ```

use crate::error::{LangServeError, Result};
use crate::schema::{
    BatchRequest, BatchResponse, InvokeRequest, InvokeResponse, RunnableConfig, StreamRequest,
};
use async_stream::stream;
use dashflow::core::error::Error as DashFlowError;
use dashflow::core::http_client;
use dashflow::core::retry::{with_retry, RetryPolicy};
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::pin::Pin;
use url::Url;

/// A `RemoteRunnable` is a runnable that is executed on a remote server via HTTP.
///
/// This client implements the `DashFlow` Runnable interface for calling remote
/// `LangServe` servers. It provides methods for invoke, batch, and stream operations.
///
/// # Example
///
/// ```no_run
/// use dashflow_langserve::client::RemoteRunnable;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     let remote = RemoteRunnable::new("http://localhost:8000/my_runnable/")
///         .expect("Failed to create RemoteRunnable");
///
///     let result = remote.invoke(json!({"text": "Hello"}), None).await
///         .expect("Failed to invoke");
///
///     println!("Result: {:?}", result);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RemoteRunnable {
    /// Base URL for the remote runnable endpoint
    base_url: Url,

    /// HTTP client for making requests
    client: Client,

    /// Request timeout in seconds
    timeout: Option<u64>,

    /// Retry policy for transient errors (M-196)
    retry_policy: RetryPolicy,
}

impl RemoteRunnable {
    /// Create a new `RemoteRunnable` client
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the remote runnable (e.g., "<http://localhost:8000/my_runnable>/")
    ///
    /// # Returns
    ///
    /// A Result containing the `RemoteRunnable` or an error if the URL is invalid
    pub fn new(url: &str) -> Result<Self> {
        // Ensure URL ends with trailing slash
        let url_with_slash = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };

        let base_url = Url::parse(&url_with_slash).map_err(|e| {
            LangServeError::InvalidRequest(format!("Invalid URL '{url_with_slash}': {e}"))
        })?;

        let client = http_client::create_llm_client().map_err(|e| {
            LangServeError::InternalError(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            base_url,
            client,
            timeout: None,
            retry_policy: RetryPolicy::default(), // Default uses jitter (M-195)
        })
    }

    /// Set the retry policy for transient network errors (M-196)
    ///
    /// By default, the client uses exponential backoff with jitter (3 retries).
    /// Use this method to customize retry behavior.
    ///
    /// # Arguments
    ///
    /// * `policy` - The retry policy to use
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use dashflow_langserve::client::RemoteRunnable;
    /// use dashflow::core::retry::RetryPolicy;
    ///
    /// let remote = RemoteRunnable::new("http://localhost:8000/my_runnable/")?
    ///     .with_retry_policy(RetryPolicy::exponential(5)); // 5 retries
    /// ```
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Create a new `RemoteRunnable` with a custom timeout
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the remote runnable
    /// * `timeout_secs` - Request timeout in seconds
    pub fn with_timeout(url: &str, timeout_secs: u64) -> Result<Self> {
        let mut remote = Self::new(url)?;
        remote.timeout = Some(timeout_secs);

        // Rebuild client with timeout (using optimized client settings)
        let timeout = std::time::Duration::from_secs(timeout_secs);
        remote.client = http_client::HttpClientBuilder::new()
            .with_llm_defaults()
            .request_timeout(timeout)
            .build()
            .map_err(|e| {
                LangServeError::InternalError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(remote)
    }

    /// Create a new `RemoteRunnable` with custom client configuration
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the remote runnable
    /// * `client` - A custom `reqwest::Client`
    pub fn with_client(url: &str, client: Client) -> Result<Self> {
        let url_with_slash = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };

        let base_url = Url::parse(&url_with_slash).map_err(|e| {
            LangServeError::InvalidRequest(format!("Invalid URL '{url_with_slash}': {e}"))
        })?;

        Ok(Self {
            base_url,
            client,
            timeout: None,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Invoke the remote runnable with the given input
    ///
    /// # Arguments
    ///
    /// * `input` - The input value to pass to the runnable
    /// * `config` - Optional runnable configuration
    ///
    /// # Returns
    ///
    /// The output from the runnable
    ///
    /// # Retry Behavior (M-196)
    ///
    /// This method automatically retries on transient network errors using
    /// the configured retry policy. Non-retryable errors (4xx client errors,
    /// authentication failures) are returned immediately.
    pub async fn invoke(&self, input: Value, config: Option<RunnableConfig>) -> Result<Value> {
        let url = self
            .base_url
            .join("invoke")
            .map_err(|e| LangServeError::InternalError(format!("Failed to construct URL: {e}")))?;

        let client = self.client.clone();
        let url_clone = url.clone();

        let invoke_response = with_retry(&self.retry_policy, || {
            let client = client.clone();
            let url = url_clone.clone();
            let request = InvokeRequest {
                input: input.clone(),
                config: config.clone(),
                kwargs: None,
            };
            async move {
                let response = client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_connect() || e.is_timeout() {
                            DashFlowError::network(format!("Request failed: {e}"))
                        } else {
                            DashFlowError::api(format!("Request failed: {e}"))
                        }
                    })?;

                // Check status code - 5xx errors are retryable, 4xx are not
                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return if status.is_server_error() || status.as_u16() == 429 {
                        // Server errors and rate limits are retryable
                        if status.as_u16() == 429 {
                            Err(DashFlowError::rate_limit(format!(
                                "Rate limited: {error_text}"
                            )))
                        } else {
                            Err(DashFlowError::network(format!(
                                "Server error {status}: {error_text}"
                            )))
                        }
                    } else {
                        // Client errors are not retryable
                        Err(DashFlowError::api(format!(
                            "Server returned error {status}: {error_text}"
                        )))
                    };
                }

                response.json::<InvokeResponse>().await.map_err(|e| {
                    DashFlowError::api(format!("Failed to deserialize response: {e}"))
                })
            }
        })
        .await
        .map_err(|e| LangServeError::ExecutionError(e.to_string()))?;

        Ok(invoke_response.output)
    }

    /// Batch invoke the remote runnable with multiple inputs
    ///
    /// # Arguments
    ///
    /// * `inputs` - Vector of input values to pass to the runnable
    /// * `config` - Optional runnable configuration (applied to all inputs)
    ///
    /// # Returns
    ///
    /// Vector of outputs from the runnable
    ///
    /// # Retry Behavior (M-196)
    ///
    /// This method automatically retries on transient network errors using
    /// the configured retry policy. Non-retryable errors (4xx client errors,
    /// authentication failures) are returned immediately.
    pub async fn batch(
        &self,
        inputs: Vec<Value>,
        config: Option<RunnableConfig>,
    ) -> Result<Vec<Value>> {
        let url = self
            .base_url
            .join("batch")
            .map_err(|e| LangServeError::InternalError(format!("Failed to construct URL: {e}")))?;

        let client = self.client.clone();
        let url_clone = url.clone();

        let batch_response = with_retry(&self.retry_policy, || {
            let client = client.clone();
            let url = url_clone.clone();
            let request = BatchRequest {
                inputs: inputs.clone(),
                config: config.clone(),
                configs: None,
                kwargs: None,
            };
            async move {
                let response = client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_connect() || e.is_timeout() {
                            DashFlowError::network(format!("Request failed: {e}"))
                        } else {
                            DashFlowError::api(format!("Request failed: {e}"))
                        }
                    })?;

                // Check status code - 5xx errors are retryable, 4xx are not
                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return if status.is_server_error() || status.as_u16() == 429 {
                        if status.as_u16() == 429 {
                            Err(DashFlowError::rate_limit(format!(
                                "Rate limited: {error_text}"
                            )))
                        } else {
                            Err(DashFlowError::network(format!(
                                "Server error {status}: {error_text}"
                            )))
                        }
                    } else {
                        Err(DashFlowError::api(format!(
                            "Server returned error {status}: {error_text}"
                        )))
                    };
                }

                response.json::<BatchResponse>().await.map_err(|e| {
                    DashFlowError::api(format!("Failed to deserialize response: {e}"))
                })
            }
        })
        .await
        .map_err(|e| LangServeError::ExecutionError(e.to_string()))?;

        Ok(batch_response.output)
    }

    /// Stream outputs from the remote runnable
    ///
    /// # Arguments
    ///
    /// * `input` - The input value to pass to the runnable
    /// * `config` - Optional runnable configuration
    ///
    /// # Returns
    ///
    /// A stream of output values
    pub async fn stream(
        &self,
        input: Value,
        config: Option<RunnableConfig>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Value>> + Send>>> {
        let request = StreamRequest {
            input,
            config,
            kwargs: None,
        };

        let url = self
            .base_url
            .join("stream")
            .map_err(|e| LangServeError::InternalError(format!("Failed to construct URL: {e}")))?;

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LangServeError::ExecutionError(format!("Request failed: {e}")))?;

        // Check status code
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LangServeError::ExecutionError(format!(
                "Server returned error {status}: {error_text}"
            )));
        }

        // Parse SSE stream
        let mut event_stream = response.bytes_stream().eventsource();

        let output_stream = stream! {
            while let Some(event_result) = event_stream.next().await {
                match event_result {
                    Ok(event) => {
                        // Parse the event type and data
                        let event_type = event.event.as_str();

                        match event_type {
                            "" | "data" => {
                                // Default event type or explicit "data" event
                                // Parse the data as JSON
                                match serde_json::from_str::<Value>(&event.data) {
                                    Ok(data) => yield Ok(data),
                                    Err(e) => {
                                        yield Err(LangServeError::SerializationError(e));
                                        return;
                                    }
                                }
                            }
                            "error" => {
                                // Server sent an error event
                                yield Err(LangServeError::StreamingError(format!(
                                    "Server error: {}",
                                    event.data
                                )));
                                return;
                            }
                            "end" => {
                                // Stream complete
                                return;
                            }
                            "metadata" => {
                                // Metadata event, skip for now
                                continue;
                            }
                            _ => {
                                // Unknown event type, skip
                                continue;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(LangServeError::StreamingError(format!(
                            "Stream error: {e}"
                        )));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(output_stream))
    }

    /// Get the input schema from the remote runnable
    pub async fn input_schema(&self) -> Result<Value> {
        self.get_schema("input_schema").await
    }

    /// Get the output schema from the remote runnable
    pub async fn output_schema(&self) -> Result<Value> {
        self.get_schema("output_schema").await
    }

    /// Get the config schema from the remote runnable
    pub async fn config_schema(&self) -> Result<Value> {
        self.get_schema("config_schema").await
    }

    /// Helper method to fetch a schema endpoint
    async fn get_schema(&self, endpoint: &str) -> Result<Value> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| LangServeError::InternalError(format!("Failed to construct URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LangServeError::ExecutionError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LangServeError::SchemaError(format!(
                "Failed to fetch schema: {status} - {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LangServeError::SchemaError(format!("Failed to deserialize schema: {e}")))
    }
}
