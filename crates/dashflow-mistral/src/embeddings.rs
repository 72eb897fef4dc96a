//! Mistral AI Embeddings implementation
//!
//! This module provides embeddings using the Mistral AI Embed API.

use async_trait::async_trait;
use dashflow::core::{
    config_loader::env_vars::{env_string, MISTRAL_API_KEY as MISTRAL_API_KEY_VAR},
    embeddings::Embeddings,
    error::{Error, Result},
    rate_limiters::RateLimiter,
    retry::{with_retry, RetryPolicy},
};
use mistralai_client::v1::{client::Client as MistralClient, constants::EmbedModel};
use std::sync::Arc;

/// Mistral AI Embeddings provider
///
/// Provides text embeddings using Mistral's embedding models.
/// The default model is `mistral-embed` which produces 1024-dimensional embeddings.
///
/// # Example
///
/// ```no_run
/// use dashflow_mistral::MistralEmbeddings;
/// use dashflow::core::embeddings::Embeddings;
///
/// #[tokio::main]
/// async fn main() {
///     // Create embeddings instance (requires MISTRAL_API_KEY environment variable)
///     let embeddings = MistralEmbeddings::new();
///
///     // Embed a single query
///     let query_embedding = embeddings._embed_query("What is the capital of France?").await.unwrap();
///     println!("Query embedding dimensions: {}", query_embedding.len());
///
///     // Embed multiple documents
///     let docs = vec![
///         "Paris is the capital of France.".to_string(),
///         "Berlin is the capital of Germany.".to_string(),
///     ];
///     let doc_embeddings = embeddings._embed_documents(&docs).await.unwrap();
///     println!("Document embeddings count: {}", doc_embeddings.len());
/// }
/// ```
///
/// # Configuration
///
/// Set the `MISTRAL_API_KEY` environment variable:
///
/// ```bash
/// export MISTRAL_API_KEY=your-api-key
/// ```
///
/// # Models
///
/// Currently supports:
/// - `mistral-embed` - 1024-dimensional embeddings (default)
#[derive(Clone, Debug)]
pub struct MistralEmbeddings {
    /// Mistral API client
    client: Arc<MistralClient>,

    /// Model to use for embeddings
    model: EmbedModel,

    /// Retry policy for API calls
    retry_policy: RetryPolicy,

    /// Optional rate limiter to control request rate
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl MistralEmbeddings {
    /// Create a new `MistralEmbeddings` instance
    ///
    /// This will read the API key from the `MISTRAL_API_KEY` environment variable.
    ///
    /// # Panics
    ///
    /// Panics if `MISTRAL_API_KEY` environment variable is not set.
    #[must_use]
    pub fn new() -> Self {
        let api_key = env_string(MISTRAL_API_KEY_VAR)
            .expect("MISTRAL_API_KEY environment variable must be set");

        let client = MistralClient::new(Some(api_key), None, None, None)
            .expect("Failed to create Mistral client");

        Self {
            client: Arc::new(client),
            model: EmbedModel::MistralEmbed,
            retry_policy: RetryPolicy::exponential(3),
            rate_limiter: None,
        }
    }

    /// Create a new `MistralEmbeddings` instance with a custom API key
    ///
    /// # Arguments
    ///
    /// * `api_key` - Your Mistral API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let client = MistralClient::new(Some(api_key.into()), None, None, None)
            .expect("Failed to create Mistral client");

        Self {
            client: Arc::new(client),
            model: EmbedModel::MistralEmbed,
            retry_policy: RetryPolicy::exponential(3),
            rate_limiter: None,
        }
    }

    /// Set the model to use for embeddings
    ///
    /// # Arguments
    ///
    /// * `model` - The embedding model to use
    #[must_use]
    pub fn with_model(mut self, model: EmbedModel) -> Self {
        self.model = model;
        self
    }

    /// Set the retry policy for API calls.
    ///
    /// Default is exponential backoff with 3 retries.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_mistral::MistralEmbeddings;
    /// # use dashflow::core::retry::RetryPolicy;
    /// let embeddings = MistralEmbeddings::new()
    ///     .with_retry_policy(RetryPolicy::exponential(5));
    /// ```
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set a rate limiter to control request rate.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_mistral::MistralEmbeddings;
    /// # use dashflow::core::rate_limiters::InMemoryRateLimiter;
    /// # use std::time::Duration;
    /// # use std::sync::Arc;
    /// let rate_limiter = InMemoryRateLimiter::new(
    ///     10.0,  // 10 requests per second
    ///     Duration::from_millis(100),  // Check every 100ms
    ///     20.0,  // Max burst of 20 requests
    /// );
    ///
    /// let embeddings = MistralEmbeddings::new()
    ///     .with_rate_limiter(Arc::new(rate_limiter));
    /// ```
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

impl Default for MistralEmbeddings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embeddings for MistralEmbeddings {
    /// Embed a list of documents
    ///
    /// # Arguments
    ///
    /// * `texts` - A slice of text strings to embed
    ///
    /// # Returns
    ///
    /// A vector of embeddings, one for each input text.
    async fn _embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Acquire rate limiter token if configured
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        // Clone values for retry closure
        let client = self.client.clone();
        let model = self.model.clone();
        let texts = texts.to_vec();

        // Execute with retry logic
        let response = with_retry(&self.retry_policy, || async {
            client
                .embeddings_async(model.clone(), texts.clone(), None)
                .await
                .map_err(|e| Error::http(format!("Mistral API error: {e:?}")))
        })
        .await?;

        // Extract embeddings from response
        let mut embeddings = response.data;
        // Sort by index to ensure correct order
        embeddings.sort_by_key(|item| item.index);

        Ok(embeddings.into_iter().map(|item| item.embedding).collect())
    }

    /// Embed a single query text
    ///
    /// # Arguments
    ///
    /// * `text` - The text to embed
    ///
    /// # Returns
    ///
    /// A single embedding vector.
    async fn _embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self._embed_documents(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_input("No embedding returned from Mistral API"))
    }
}
