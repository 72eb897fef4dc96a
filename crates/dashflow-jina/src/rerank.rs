use async_trait::async_trait;
use dashflow::core::config_loader::env_vars::{env_string, JINA_API_KEY};
use dashflow::core::documents::{Document, DocumentCompressor};
use dashflow::core::error::Error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const JINA_API_URL: &str = "https://api.jina.ai/v1/rerank";
const DEFAULT_MODEL: &str = "jina-reranker-v1-base-en";

/// Response from Jina Rerank API
#[derive(Debug, Deserialize)]
struct JinaRerankResponse {
    results: Vec<JinaRerankResult>,
}

/// Individual result from Jina Rerank API
#[derive(Debug, Deserialize)]
struct JinaRerankResult {
    index: usize,
    relevance_score: f64,
}

/// Request body for Jina Rerank API
#[derive(Debug, Serialize)]
struct JinaRerankRequest {
    query: String,
    documents: Vec<String>,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_n: Option<usize>,
}

/// Document compressor using Jina's Rerank API.
///
/// Jina Rerank uses specialized reranking models to reorder documents
/// by relevance to a query. This is useful for improving retrieval quality
/// in RAG pipelines.
///
/// # Models
/// - `jina-reranker-v1-base-en` (default): Base English reranker
/// - `jina-reranker-v1-turbo-en`: Faster English reranker
/// - `jina-reranker-v1-tiny-en`: Smallest/fastest English reranker
///
/// # Example
/// ```no_run
/// use dashflow_jina::rerank::JinaRerank;
/// use dashflow::core::documents::{Document, DocumentCompressor};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Set JINA_API_KEY environment variable
/// std::env::set_var("JINA_API_KEY", "your-api-key");
///
/// let reranker = JinaRerank::new()?;
/// let docs = vec![
///     Document::new("Paris is the capital of France."),
///     Document::new("Berlin is the capital of Germany."),
///     Document::new("The sky is blue."),
/// ];
///
/// let reranked = reranker.compress_documents(docs, "What is the capital of France?", None).await?;
/// // Returns: [Paris doc, Berlin doc] (sky doc filtered out by top_n=2)
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JinaRerank {
    client: Client,
    api_key: String,
    model: String,
    top_n: Option<usize>,
    user_agent: String,
}

impl JinaRerank {
    /// Create a new `JinaRerank` compressor.
    ///
    /// Reads API key from `JINA_API_KEY` environment variable.
    ///
    /// # Errors
    /// Returns error if `JINA_API_KEY` is not set.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Create a builder for `JinaRerank`.
    #[must_use]
    pub fn builder() -> JinaRerankBuilder {
        JinaRerankBuilder::default()
    }

    /// Rerank documents and return results with relevance scores.
    ///
    /// This is the core reranking method that calls the Jina API.
    ///
    /// # Arguments
    /// * `documents` - Documents to rerank (can be strings or Documents)
    /// * `query` - Query to rerank documents against
    ///
    /// # Returns
    /// Vec of (index, `relevance_score`) tuples, ordered by relevance
    async fn rerank_internal(
        &self,
        documents: &[String],
        query: &str,
    ) -> Result<Vec<JinaRerankResult>, Error> {
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let request = JinaRerankRequest {
            query: query.to_string(),
            documents: documents.to_vec(),
            model: self.model.clone(),
            top_n: self.top_n,
        };

        let response = self
            .client
            .post(JINA_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept-Encoding", "identity")
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Jina API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Api(format!(
                "Jina API error ({status}): {error_text}"
            )));
        }

        let rerank_response: JinaRerankResponse = response
            .json()
            .await
            .map_err(|e| Error::ApiFormat(format!("Failed to parse Jina API response: {e}")))?;

        Ok(rerank_response.results)
    }
}

#[async_trait]
impl DocumentCompressor for JinaRerank {
    /// Compress documents using Jina's reranking API.
    ///
    /// Documents are reordered by relevance to the query, with the most
    /// relevant documents first. Only the top N documents are returned
    /// (if `top_n` is set), with relevance scores added to metadata.
    ///
    /// # Metadata
    /// Adds `relevance_score` to each document's metadata.
    async fn compress_documents(
        &self,
        documents: Vec<Document>,
        query: &str,
        _config: Option<&dashflow::core::config::RunnableConfig>,
    ) -> Result<Vec<Document>, Error> {
        let doc_texts: Vec<String> = documents
            .iter()
            .map(|doc| doc.page_content.clone())
            .collect();

        let results = self.rerank_internal(&doc_texts, query).await?;

        let mut compressed = Vec::new();
        for result in results {
            if result.index < documents.len() {
                let doc = &documents[result.index];
                let mut new_doc = doc.clone();
                new_doc
                    .metadata
                    .insert("relevance_score".to_string(), result.relevance_score.into());
                compressed.push(new_doc);
            }
        }

        Ok(compressed)
    }
}

/// Builder for `JinaRerank`
pub struct JinaRerankBuilder {
    api_key: Option<String>,
    model: Option<String>,
    top_n: Option<usize>,
    user_agent: Option<String>,
}

impl Default for JinaRerankBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            top_n: Some(3), // Default to top 3 results
            user_agent: Some("dashflow".to_string()),
        }
    }
}

impl JinaRerankBuilder {
    /// Set the Jina API key.
    ///
    /// If not set, will read from `JINA_API_KEY` environment variable.
    #[must_use]
    pub fn api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the reranking model.
    ///
    /// Defaults to `jina-reranker-v1-base-en`.
    ///
    /// Available models:
    /// - `jina-reranker-v1-base-en` (default)
    /// - `jina-reranker-v1-turbo-en`
    /// - `jina-reranker-v1-tiny-en`
    #[must_use]
    pub fn model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the number of top documents to return.
    ///
    /// Defaults to 3. Set to None to return all documents.
    #[must_use]
    pub fn top_n(mut self, top_n: Option<usize>) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the user agent for API requests.
    ///
    /// Defaults to "dashflow".
    #[must_use]
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Build the `JinaRerank` compressor.
    ///
    /// # Errors
    /// Returns error if API key is not provided and `JINA_API_KEY` env var is not set.
    pub fn build(self) -> Result<JinaRerank, Error> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => env_string(JINA_API_KEY).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{JINA_API_KEY} environment variable must be set. \
                     Get your API key from https://jina.ai/"
                ))
            })?,
        };

        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let user_agent = self.user_agent.unwrap_or_else(|| "dashflow".to_string());

        Ok(JinaRerank {
            client: Client::new(),
            api_key,
            model,
            top_n: self.top_n,
            user_agent,
        })
    }
}
