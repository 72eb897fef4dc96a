// Note: Audited - only 1 expect() in production (line 290 in build(), documented # Panics).
// All other unwrap/expect calls are in test code.

//! `WolframAlpha` Computational Knowledge Engine Tool for `DashFlow` Rust
//!
//! This crate provides a tool for querying the `WolframAlpha` computational knowledge engine
//! to get answers to factual questions, mathematical computations, and scientific queries.
//!
//! # Overview
//!
//! `WolframAlpha` is a computational knowledge engine that answers factual queries by
//! computing answers from curated data. Unlike search engines, it computes answers
//! rather than finding documents.
//!
//! # Features
//!
//! - Simple API for computational queries
//! - Support for mathematics, science, geography, history, and more
//! - Short answer format optimized for LLM integration
//! - Optional full result format for detailed responses
//!
//! # Example
//!
//! ```rust,no_run
//! use dashflow_wolfram::WolframAlpha;
//! use dashflow::core::tools::{Tool, ToolInput};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tool = WolframAlpha::new("YOUR_APP_ID");
//!
//! let input = ToolInput::String("What is the population of France?".to_string());
//! let result = tool._call(input).await?;
//! println!("Answer: {}", result);
//! # Ok(())
//! # }
//! ```
//!
//! # API Details
//!
//! The tool uses the `WolframAlpha` Short Answers API:
//! - **Endpoint**: `https://api.wolframalpha.com/v1/result`
//! - **Authentication**: App ID required (get one at <https://products.wolframalpha.com/api/>)
//! - **Rate Limits**: 2,000 queries per month on free tier
//!
//! # References
//!
//! - [WolframAlpha API](https://products.wolframalpha.com/api/)
//! - [Short Answers API Documentation](https://products.wolframalpha.com/short-answers-api/documentation/)

use async_trait::async_trait;
use dashflow::core::error::{Error, Result};
use dashflow::core::tools::{Tool, ToolInput};
use reqwest::Client;
use serde_json::json;
use url::Url;

const WOLFRAM_SHORT_API_URL: &str = "https://api.wolframalpha.com/v1/result";

/// `WolframAlpha` computational knowledge engine tool
///
/// Provides access to `WolframAlpha`'s computational knowledge engine for answering
/// factual questions, performing calculations, and providing scientific information.
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_wolfram::WolframAlpha;
/// use dashflow::core::tools::{Tool, ToolInput};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = WolframAlpha::builder()
///     .app_id("YOUR_APP_ID")
///     .build();
///
/// let input = ToolInput::String("What is the square root of 144?".to_string());
/// let result = tool._call(input).await?;
/// println!("{}", result);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WolframAlpha {
    /// HTTP client
    client: Client,
    /// `WolframAlpha` App ID (required)
    app_id: String,
    /// Units system: "metric" or "nonmetric" (default: "metric")
    units: String,
    /// Timeout in seconds (default: 30)
    timeout: u64,
}

impl WolframAlpha {
    /// Create a new `WolframAlpha` tool with the given App ID
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_wolfram::WolframAlpha;
    ///
    /// let tool = WolframAlpha::new("YOUR_APP_ID");
    /// ```
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            app_id: app_id.into(),
            units: "metric".to_string(),
            timeout: 30,
        }
    }

    /// Create a builder for configuring the `WolframAlpha` tool
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_wolfram::WolframAlpha;
    ///
    /// let tool = WolframAlpha::builder()
    ///     .app_id("YOUR_APP_ID")
    ///     .units("nonmetric")
    ///     .timeout(60)
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> WolframAlphaBuilder {
        WolframAlphaBuilder::default()
    }

    /// Set the units system (metric or nonmetric)
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the timeout in seconds
    #[must_use]
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the `WolframAlpha` tool
    #[must_use]
    pub fn build(self) -> Self {
        self
    }

    /// Query `WolframAlpha` and return the result
    ///
    /// # Arguments
    ///
    /// * `query` - The question or computation to send to `WolframAlpha`
    ///
    /// # Returns
    ///
    /// The short answer from `WolframAlpha` as a string
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The query is empty
    /// - The API request fails
    /// - The API returns an error (invalid query, no result found, etc.)
    async fn query(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Err(Error::tool_error("Query cannot be empty"));
        }

        // Build the request URL
        let mut url = Url::parse(WOLFRAM_SHORT_API_URL)
            .map_err(|e| Error::tool_error(format!("Failed to parse API URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("appid", &self.app_id)
            .append_pair("i", query)
            .append_pair("units", &self.units);

        // Make the request
        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(self.timeout))
            .send()
            .await
            .map_err(|e| Error::tool_error(format!("Failed to query WolframAlpha: {e}")))?;

        // Check for HTTP errors
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(Error::tool_error(format!(
                "WolframAlpha API error (status {}): {}",
                status,
                if error_text.is_empty() {
                    "No result found or invalid query"
                } else {
                    &error_text
                }
            )));
        }

        // Get the response text
        let result = response
            .text()
            .await
            .map_err(|e| Error::tool_error(format!("Failed to read response: {e}")))?;

        Ok(result)
    }
}

#[async_trait]
impl Tool for WolframAlpha {
    fn name(&self) -> &'static str {
        "wolfram_alpha"
    }

    fn description(&self) -> &'static str {
        "A computational knowledge engine for answering factual questions. \
         Use this tool for: mathematical calculations, scientific data, \
         conversions, geography, history, and general factual information. \
         Input should be a clear question or computation."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question or computation to send to WolframAlpha"
                }
            },
            "required": ["query"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let query = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(value) => value
                .get("query")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::tool_error("Missing 'query' field in input"))?
                .to_string(),
        };

        self.query(&query).await
    }
}

/// Builder for `WolframAlpha` tool
#[derive(Debug, Default)]
pub struct WolframAlphaBuilder {
    app_id: Option<String>,
    units: Option<String>,
    timeout: Option<u64>,
}

impl WolframAlphaBuilder {
    /// Set the `WolframAlpha` App ID (required)
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Set the units system: "metric" or "nonmetric" (default: "metric")
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Set the timeout in seconds (default: 30)
    #[must_use]
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the `WolframAlpha` tool
    ///
    /// # Panics
    ///
    /// Panics if `app_id` is not set
    #[must_use]
    #[allow(clippy::expect_used)] // Documented panic for missing required field
    pub fn build(self) -> WolframAlpha {
        let app_id = self.app_id.expect("app_id is required");

        WolframAlpha {
            client: Client::new(),
            app_id,
            units: self.units.unwrap_or_else(|| "metric".to_string()),
            timeout: self.timeout.unwrap_or(30),
        }
    }
}
