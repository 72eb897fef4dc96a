//! # `DuckDuckGo` Search Tool
//!
//! `DuckDuckGo` is a privacy-focused search engine that doesn't track users.
//! This tool provides web search functionality for `DashFlow` agents.
//!
//! ## Features
//!
//! - Privacy-focused web search (no user tracking)
//! - HTML-based search results extraction
//! - Configurable result count
//! - No API key required
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dashflow_duckduckgo::DuckDuckGoSearchTool;
//! use dashflow::core::tools::Tool;
//!
//! # tokio_test::block_on(async {
//! let ddg = DuckDuckGoSearchTool::new();
//!
//! // Search the web
//! let results = ddg._call_str("Rust programming language".to_string()).await.unwrap();
//! println!("Search results: {}", results);
//! # });
//! ```

use async_trait::async_trait;
use dashflow::core::tools::{Tool, ToolInput};
use dashflow::core::Result;
use dashflow::{
    DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_REQUEST_TIMEOUT, DEFAULT_POOL_IDLE_TIMEOUT,
    DEFAULT_TCP_KEEPALIVE,
};
use scraper::{Html, Selector};
use serde_json::json;

/// `DuckDuckGo` search tool for `DashFlow` agents
///
/// This tool provides privacy-focused web search functionality, allowing agents
/// to search the internet without tracking.
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_duckduckgo::DuckDuckGoSearchTool;
/// use dashflow::core::tools::Tool;
///
/// # tokio_test::block_on(async {
/// let ddg = DuckDuckGoSearchTool::builder()
///     .max_results(5)
///     .build();
///
/// let results = ddg._call_str("quantum computing".to_string())
///     .await
///     .unwrap();
/// println!("Found: {}", results);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearchTool {
    max_results: usize,
    client: reqwest::Client,
}

impl DuckDuckGoSearchTool {
    /// Create a new `DuckDuckGo` search tool with default settings
    ///
    /// Default settings:
    /// - `max_results`: 5
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_duckduckgo::DuckDuckGoSearchTool;
    ///
    /// let ddg = DuckDuckGoSearchTool::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_results: 5,
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
                .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
                .pool_max_idle_per_host(32)
                .pool_idle_timeout(DEFAULT_POOL_IDLE_TIMEOUT)
                .tcp_keepalive(DEFAULT_TCP_KEEPALIVE)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a builder for `DuckDuckGoSearchTool`
    #[must_use]
    pub fn builder() -> DuckDuckGoSearchToolBuilder {
        DuckDuckGoSearchToolBuilder::default()
    }

    /// Search `DuckDuckGo` and retrieve search results
    async fn search(&self, query: String) -> Result<String> {
        // Build the search URL
        let encoded_query = urlencoding::encode(&query);
        let url = format!("https://html.duckduckgo.com/html/?q={encoded_query}");

        // Make the HTTP request
        let response = self.client.get(&url).send().await.map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to fetch search results: {e}"))
        })?;

        let html = response.text().await.map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to read response body: {e}"))
        })?;

        // Parse the HTML
        let document = Html::parse_document(&html);

        // Select search result elements
        // DuckDuckGo HTML uses <div class="result"> for each result
        let result_selector = Selector::parse("div.result").map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to parse result selector: {e}"))
        })?;

        let title_selector = Selector::parse("a.result__a").map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to parse title selector: {e}"))
        })?;

        let snippet_selector = Selector::parse("a.result__snippet").map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to parse snippet selector: {e}"))
        })?;

        let url_selector = Selector::parse("a.result__url").map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to parse URL selector: {e}"))
        })?;

        // Extract results
        let mut results = Vec::new();
        for result in document.select(&result_selector).take(self.max_results) {
            let title = result.select(&title_selector).next().map_or_else(
                || "No title".to_string(),
                |el| el.text().collect::<String>(),
            );

            let snippet = result.select(&snippet_selector).next().map_or_else(
                || "No snippet".to_string(),
                |el| el.text().collect::<String>(),
            );

            let url = result
                .select(&url_selector)
                .next()
                .map_or_else(|| "No URL".to_string(), |el| el.text().collect::<String>());

            results.push(format!(
                "[{}]\nURL: {}\nSnippet: {}\n",
                title.trim(),
                url.trim(),
                snippet.trim()
            ));
        }

        if results.is_empty() {
            Ok(format!(
                "No search results found for query: '{query}'\n\nTry:\n- Using different keywords\n- Making the query more specific\n- Checking for typos"
            ))
        } else {
            Ok(format!(
                "DuckDuckGo Search Results for: '{}'\n\nFound {} results:\n\n{}",
                query,
                results.len(),
                results.join("\n")
            ))
        }
    }
}

impl Default for DuckDuckGoSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearchTool {
    fn name(&self) -> &'static str {
        "duckduckgo_search"
    }

    fn description(&self) -> &'static str {
        "Search DuckDuckGo for web results. \
         Input should be a search query string. \
         Returns search results with titles, URLs, and snippets. \
         DuckDuckGo is privacy-focused and doesn't track users."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to look up on DuckDuckGo"
                }
            },
            "required": ["query"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let query = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(v) => v
                .get("query")
                .and_then(|q| q.as_str())
                .ok_or_else(|| {
                    dashflow::core::Error::tool_error(
                        "Missing 'query' field in structured input".to_string(),
                    )
                })?
                .to_string(),
        };

        self.search(query).await
    }
}

/// Builder for `DuckDuckGoSearchTool`
///
/// # Example
///
/// ```rust
/// use dashflow_duckduckgo::DuckDuckGoSearchTool;
///
/// let ddg = DuckDuckGoSearchTool::builder()
///     .max_results(10)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuckDuckGoSearchToolBuilder {
    max_results: Option<usize>,
}

impl DuckDuckGoSearchToolBuilder {
    /// Set the maximum number of search results to return
    ///
    /// Default: 5
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_duckduckgo::DuckDuckGoSearchTool;
    ///
    /// let ddg = DuckDuckGoSearchTool::builder()
    ///     .max_results(10)
    ///     .build();
    /// ```
    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Build the `DuckDuckGoSearchTool`
    #[must_use]
    pub fn build(self) -> DuckDuckGoSearchTool {
        DuckDuckGoSearchTool {
            max_results: self.max_results.unwrap_or(5),
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
                .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
                .pool_max_idle_per_host(32)
                .pool_idle_timeout(DEFAULT_POOL_IDLE_TIMEOUT)
                .tcp_keepalive(DEFAULT_TCP_KEEPALIVE)
                .build()
                .unwrap_or_default(),
        }
    }
}
