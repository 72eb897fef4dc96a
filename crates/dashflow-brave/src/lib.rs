//! # Brave Search Tool
//!
//! Brave Search is a privacy-focused web search API built on Brave's independent web index.
//! It provides high-quality search results without tracking users, with reduced SEO spam.
//!
//! ## Features
//!
//! - Privacy-focused web search with independent index
//! - No user tracking or data collection
//! - Fresh and recent content
//! - Multiple search types: web, news, images, videos
//! - Reduced SEO spam
//!
//! ## Usage
//!
//! ```no_run
//! use dashflow_brave::BraveSearchTool;
//! use dashflow::core::tools::Tool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let brave = BraveSearchTool::new("YOUR_API_KEY");
//!
//! // Simple search
//! let results = brave._call_str("Who is Leo Messi?".to_string()).await?;
//! println!("Search results: {}", results);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use dashflow::constants::{DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_REQUEST_TIMEOUT};
use dashflow::core::http_client::{json_with_limit, SEARCH_RESPONSE_SIZE_LIMIT};
use dashflow::core::tools::{Tool, ToolInput};
use dashflow::core::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Create an HTTP client with standard timeouts
fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
        .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Search type for Brave API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Web search (default)
    #[default]
    Web,
    /// News search
    News,
    /// Image search
    Images,
    /// Video search
    Videos,
}

/// Freshness filter for search results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Past day
    #[serde(rename = "pd")]
    PastDay,
    /// Past week
    #[serde(rename = "pw")]
    PastWeek,
    /// Past month
    #[serde(rename = "pm")]
    PastMonth,
    /// Past year
    #[serde(rename = "py")]
    PastYear,
}

/// A single web search result from Brave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BraveWebResult {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Content description/snippet
    pub description: String,
    /// Age of content (e.g., "2 days ago")
    #[serde(default)]
    pub age: Option<String>,
    /// Extra snippets
    #[serde(default)]
    pub extra_snippets: Option<Vec<String>>,
}

/// Query metadata from Brave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveQuery {
    /// Original query
    pub original: String,
    /// Altered query (if spell-corrected)
    #[serde(default)]
    pub altered: Option<String>,
}

/// Mixed response type containing web results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveMixed {
    /// Type of result (should be "search")
    #[serde(rename = "type")]
    pub result_type: String,
    /// Web search results
    #[serde(default)]
    pub results: Option<Vec<BraveWebResult>>,
}

/// Response from Brave search API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveSearchResponse {
    /// Query information
    pub query: BraveQuery,
    /// Mixed results (web, news, etc.)
    #[serde(default)]
    pub mixed: Option<BraveMixed>,
    /// Web results (alternative location)
    #[serde(default)]
    pub web: Option<WebResults>,
}

/// Web results container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResults {
    /// Search results
    pub results: Vec<BraveWebResult>,
}

/// Brave search tool for `DashFlow` agents
///
/// This tool provides access to Brave's privacy-focused search API, which uses
/// Brave's independent web index to return high-quality search results without
/// user tracking.
///
/// # Example
///
/// ```no_run
/// use dashflow_brave::BraveSearchTool;
/// use dashflow::core::tools::Tool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let brave = BraveSearchTool::builder()
///     .api_key("YOUR_API_KEY")
///     .count(5)
///     .build()?;
///
/// let results = brave._call_str("latest AI research".to_string())
///     .await?;
/// println!("Found: {}", results);
/// # Ok(())
/// # }
/// ```
pub struct BraveSearchTool {
    api_key: String,
    count: u32,
    search_lang: String,
    country: String,
    safesearch: String,
    freshness: Option<String>,
    client: reqwest::Client,
}

impl BraveSearchTool {
    /// Create a new Brave search tool
    ///
    /// # Arguments
    ///
    /// * `api_key` - Your Brave Search API key (X-Subscription-Token)
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_brave::BraveSearchTool;
    ///
    /// let brave = BraveSearchTool::new("YOUR_API_KEY");
    /// ```
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            count: 10,
            search_lang: "en".to_string(),
            country: "US".to_string(),
            safesearch: "moderate".to_string(),
            freshness: None,
            client: create_http_client(),
        }
    }

    /// Create a builder for `BraveSearchTool`
    #[must_use]
    pub fn builder() -> BraveSearchToolBuilder {
        BraveSearchToolBuilder::default()
    }

    /// Perform a search using the Brave API
    async fn search(&self, query: String) -> Result<BraveSearchResponse> {
        let mut url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={}",
            urlencoding::encode(&query),
            self.count
        );

        // Add optional parameters
        url.push_str(&format!("&search_lang={}", self.search_lang));
        url.push_str(&format!("&country={}", self.country));
        url.push_str(&format!("&safesearch={}", self.safesearch));

        if let Some(ref freshness) = self.freshness {
            url.push_str(&format!("&freshness={freshness}"));
        }

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                dashflow::core::Error::tool_error(format!("Brave API request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(dashflow::core::Error::tool_error(format!(
                "Brave API error ({status}): {error_text}"
            )));
        }

        // M-216: Use size-limited JSON parsing to prevent memory exhaustion
        let search_response: BraveSearchResponse =
            json_with_limit(response, SEARCH_RESPONSE_SIZE_LIMIT).await.map_err(|e| {
                dashflow::core::Error::tool_error(format!("Failed to parse Brave response: {e}"))
            })?;

        Ok(search_response)
    }

    /// Format search results as a string
    fn format_results(&self, response: BraveSearchResponse) -> String {
        let mut output = String::new();

        // Show spell correction if present
        if let Some(ref altered) = response.query.altered {
            output.push_str(&format!("Showing results for: {altered}\n\n"));
        }

        // Extract results from either mixed or web
        let results = if let Some(mixed) = response.mixed {
            mixed.results.unwrap_or_default()
        } else if let Some(web) = response.web {
            web.results
        } else {
            vec![]
        };

        if results.is_empty() {
            output.push_str("No results found.");
            return output;
        }

        output.push_str(&format!("Found {} results:\n\n", results.len()));

        for (i, result) in results.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, result.title));
            output.push_str(&format!("   URL: {}\n", result.url));

            // Truncate description to 250 chars
            let snippet = if result.description.len() > 250 {
                format!("{}...", &result.description[..250])
            } else {
                result.description.clone()
            };
            output.push_str(&format!("   Description: {snippet}\n"));

            if let Some(ref age) = result.age {
                output.push_str(&format!("   Age: {age}\n"));
            }

            output.push('\n');
        }

        output
    }
}

#[async_trait]
impl Tool for BraveSearchTool {
    fn name(&self) -> &'static str {
        "brave_search"
    }

    fn description(&self) -> &'static str {
        "Search the web using Brave's privacy-focused search API. \
         Returns high-quality search results from Brave's independent web index. \
         No user tracking, reduced SEO spam, and fresh content. \
         Best for privacy-conscious applications and general web search."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to execute"
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

        let response = self.search(query).await?;
        Ok(self.format_results(response))
    }
}

/// Builder for `BraveSearchTool`
#[derive(Default)]
pub struct BraveSearchToolBuilder {
    api_key: Option<String>,
    count: Option<u32>,
    search_lang: Option<String>,
    country: Option<String>,
    safesearch: Option<String>,
    freshness: Option<String>,
}

impl BraveSearchToolBuilder {
    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the maximum number of results (1-20)
    #[must_use]
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count.clamp(1, 20));
        self
    }

    /// Set the search language (default: "en")
    pub fn search_lang(mut self, lang: impl Into<String>) -> Self {
        self.search_lang = Some(lang.into());
        self
    }

    /// Set the country code (default: "US")
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the safe search level ("off", "moderate", "strict")
    pub fn safesearch(mut self, level: impl Into<String>) -> Self {
        self.safesearch = Some(level.into());
        self
    }

    /// Set freshness filter ("pd" = past day, "pw" = past week, "pm" = past month, "py" = past year)
    pub fn freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = Some(freshness.into());
        self
    }

    /// Build the `BraveSearchTool`
    pub fn build(self) -> Result<BraveSearchTool> {
        let api_key = self.api_key.ok_or_else(|| {
            dashflow::core::Error::tool_error("API key is required for Brave search".to_string())
        })?;

        Ok(BraveSearchTool {
            api_key,
            count: self.count.unwrap_or(10),
            search_lang: self.search_lang.unwrap_or_else(|| "en".to_string()),
            country: self.country.unwrap_or_else(|| "US".to_string()),
            safesearch: self.safesearch.unwrap_or_else(|| "moderate".to_string()),
            freshness: self.freshness,
            client: create_http_client(),
        })
    }
}
