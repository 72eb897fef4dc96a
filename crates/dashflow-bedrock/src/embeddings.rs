//! AWS Bedrock embeddings implementation.
//!
//! This module provides embeddings using AWS Bedrock's embedding models, including:
//! - Amazon Titan Text Embeddings v2 (1024 dimensions, 8192 token context)
//! - Amazon Titan Text Embeddings v1 (1536 dimensions, 8000 token context)
//! - Cohere Embed v3 (English and Multilingual variants)
//!
//! # Example
//!
//! ```rust,no_run
//! use dashflow_bedrock::BedrockEmbeddings;
//! use dashflow::{embed_query, embed};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(BedrockEmbeddings::new("us-east-1").await?);
//!
//! // Embed a single query
//! let query_vector = embed_query(embedder.clone(), "What is the meaning of life?").await?;
//! assert!(!query_vector.is_empty());
//!
//! // Embed multiple documents
//! let docs = vec![
//!     "The quick brown fox".to_string(),
//!     "jumps over the lazy dog".to_string(),
//! ];
//! let doc_vectors = embed(embedder, &docs).await?;
//! assert_eq!(doc_vectors.len(), 2);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use dashflow::core::{
    embeddings::Embeddings,
    rate_limiters::RateLimiter,
    retry::{with_retry, RetryPolicy},
    Error as DashFlowError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bedrock embedding model identifiers
pub mod models {
    /// Amazon Titan Text Embeddings v2 (1024 dimensions, recommended)
    pub const TITAN_EMBED_TEXT_V2: &str = "amazon.titan-embed-text-v2:0";
    /// Amazon Titan Text Embeddings v1 (1536 dimensions)
    pub const TITAN_EMBED_TEXT_V1: &str = "amazon.titan-embed-text-v1";
    /// Amazon Titan Multimodal Embeddings v1 (text and images)
    pub const TITAN_EMBED_MULTIMODAL_V1: &str = "amazon.titan-embed-image-v1";
    /// Cohere Embed English v3
    pub const COHERE_EMBED_ENGLISH_V3: &str = "cohere.embed-english-v3";
    /// Cohere Embed Multilingual v3
    pub const COHERE_EMBED_MULTILINGUAL_V3: &str = "cohere.embed-multilingual-v3";
}

/// Input type for Titan v2 embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// For search queries (retrieval)
    #[serde(rename = "search_query")]
    SearchQuery,
    /// For documents to be indexed
    #[serde(rename = "search_document")]
    SearchDocument,
}

/// Normalize mode for Titan v2 embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// No normalization
    None,
    /// L2 normalization (default)
    #[default]
    L2,
}

/// AWS Bedrock embedding model integration.
///
/// Supports the following models:
/// - `amazon.titan-embed-text-v2:0`: Latest Titan embeddings (1024 dimensions)
/// - `amazon.titan-embed-text-v1`: Original Titan embeddings (1536 dimensions)
/// - `cohere.embed-english-v3`: Cohere English embeddings
/// - `cohere.embed-multilingual-v3`: Cohere Multilingual embeddings
///
/// # Authentication
///
/// Uses standard AWS SDK authentication chain:
/// - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
/// - AWS credentials file (~/.aws/credentials)
/// - IAM instance profile (for EC2/ECS)
/// - IAM role (for Lambda)
///
/// # Configuration
///
/// ```no_run
/// # use dashflow_bedrock::BedrockEmbeddings;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = BedrockEmbeddings::new("us-east-1")
///     .await?
///     .with_model("amazon.titan-embed-text-v2:0")
///     .with_dimensions(512);  // Reduced dimensions for efficiency
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BedrockEmbeddings {
    /// AWS Bedrock client
    client: BedrockClient,
    /// Model ID (e.g., "amazon.titan-embed-text-v2:0")
    model_id: String,
    /// AWS region
    region: String,
    /// Optional: Output dimensions (Titan v2 only, 256-1024)
    dimensions: Option<u32>,
    /// Optional: Normalization mode (Titan v2 only)
    normalize: NormalizeMode,
    /// Maximum number of texts to embed in parallel
    batch_size: usize,
    /// Retry policy for API calls
    retry_policy: RetryPolicy,
    /// Optional rate limiter
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl BedrockEmbeddings {
    /// Create a new Bedrock embeddings instance with specified region.
    ///
    /// Uses standard AWS SDK authentication chain.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(region: impl Into<String>) -> Result<Self, DashFlowError> {
        let region_str = region.into();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region_str.clone()))
            .load()
            .await;

        let client = BedrockClient::new(&config);

        Ok(Self {
            client,
            model_id: models::TITAN_EMBED_TEXT_V2.to_string(),
            region: region_str,
            dimensions: None,
            normalize: NormalizeMode::L2,
            batch_size: 25, // Bedrock has lower throughput than dedicated embedding APIs
            retry_policy: RetryPolicy::exponential(3),
            rate_limiter: None,
        })
    }

    /// Returns the AWS region for this embeddings instance.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Set the model ID.
    ///
    /// # Supported Models
    ///
    /// - `amazon.titan-embed-text-v2:0`: Latest Titan embeddings (1024 dimensions)
    /// - `amazon.titan-embed-text-v1`: Original Titan embeddings (1536 dimensions)
    /// - `cohere.embed-english-v3`: Cohere English embeddings
    /// - `cohere.embed-multilingual-v3`: Cohere Multilingual embeddings
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_model("amazon.titan-embed-text-v1");
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the output dimensionality for embeddings.
    ///
    /// Only supported by Titan Embeddings v2. Valid range: 256-1024.
    /// Smaller dimensions reduce storage and improve speed while
    /// maintaining most of the semantic information.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_dimensions(512);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        // Titan v2 supports 256-1024 dimensions
        self.dimensions = Some(dimensions.clamp(256, 1024));
        self
    }

    /// Set the normalization mode.
    ///
    /// Only supported by Titan Embeddings v2. Default is L2 normalization.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_bedrock::{BedrockEmbeddings, NormalizeMode};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_normalize(NormalizeMode::None);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_normalize(mut self, normalize: NormalizeMode) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the batch size for parallel embedding requests.
    ///
    /// Default is 25. Higher values may improve throughput but
    /// can hit rate limits.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_batch_size(10);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the retry policy for API calls.
    ///
    /// Default is exponential backoff with 3 retries.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # use dashflow::core::retry::RetryPolicy;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_retry_policy(RetryPolicy::exponential(5));
    /// # Ok(())
    /// # }
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
    /// # use dashflow_bedrock::BedrockEmbeddings;
    /// # use dashflow::core::rate_limiters::InMemoryRateLimiter;
    /// # use std::time::Duration;
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rate_limiter = InMemoryRateLimiter::new(
    ///     10.0,  // 10 requests per second
    ///     Duration::from_millis(100),
    ///     20.0,  // Max burst
    /// );
    ///
    /// let embedder = BedrockEmbeddings::new("us-east-1")
    ///     .await?
    ///     .with_rate_limiter(Arc::new(rate_limiter));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Check if the model is Titan v2 (supports dimensions parameter)
    fn is_titan_v2(&self) -> bool {
        self.model_id.contains("titan-embed-text-v2")
    }

    /// Check if the model is a Cohere model
    fn is_cohere(&self) -> bool {
        self.model_id.starts_with("cohere.embed")
    }

    /// Embed a single text using Bedrock.
    async fn embed_single(
        &self,
        text: &str,
        input_type: Option<InputType>,
    ) -> Result<Vec<f32>, DashFlowError> {
        // Acquire rate limiter token if configured
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let body = if self.is_titan_v2() {
            self.build_titan_v2_request(text, input_type)?
        } else if self.is_cohere() {
            self.build_cohere_request(&[text.to_string()], input_type)?
        } else {
            self.build_titan_v1_request(text)?
        };

        let client = self.client.clone();
        let model_id = self.model_id.clone();

        let response = with_retry(&self.retry_policy, || {
            let client = client.clone();
            let model_id = model_id.clone();
            let body = body.clone();
            async move {
                client
                    .invoke_model()
                    .model_id(&model_id)
                    .body(Blob::new(body))
                    .content_type("application/json")
                    .accept("application/json")
                    .send()
                    .await
                    .map_err(|e| DashFlowError::api(format!("Bedrock API error: {e}")))
            }
        })
        .await?;

        let response_body = response.body().as_ref();
        self.parse_embedding_response(response_body)
    }

    /// Build request body for Titan v2 embeddings.
    fn build_titan_v2_request(
        &self,
        text: &str,
        input_type: Option<InputType>,
    ) -> Result<Vec<u8>, DashFlowError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct TitanV2Request<'a> {
            input_text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<u32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            normalize: Option<bool>,
            #[serde(skip_serializing_if = "Option::is_none")]
            #[serde(rename = "embeddingTypes")]
            embedding_types: Option<Vec<&'a str>>,
        }

        let request = TitanV2Request {
            input_text: text,
            dimensions: self.dimensions,
            normalize: Some(matches!(self.normalize, NormalizeMode::L2)),
            embedding_types: input_type.map(|_it| vec!["float"]),
        };

        serde_json::to_vec(&request).map_err(DashFlowError::Serialization)
    }

    /// Build request body for Titan v1 embeddings.
    fn build_titan_v1_request(&self, text: &str) -> Result<Vec<u8>, DashFlowError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct TitanV1Request<'a> {
            input_text: &'a str,
        }

        let request = TitanV1Request { input_text: text };

        serde_json::to_vec(&request).map_err(DashFlowError::Serialization)
    }

    /// Build request body for Cohere embeddings.
    fn build_cohere_request(
        &self,
        texts: &[String],
        input_type: Option<InputType>,
    ) -> Result<Vec<u8>, DashFlowError> {
        #[derive(Serialize)]
        struct CohereRequest {
            texts: Vec<String>,
            input_type: String,
        }

        let cohere_input_type = match input_type {
            Some(InputType::SearchQuery) => "search_query",
            Some(InputType::SearchDocument) | None => "search_document",
        };

        let request = CohereRequest {
            texts: texts.to_vec(),
            input_type: cohere_input_type.to_string(),
        };

        serde_json::to_vec(&request).map_err(DashFlowError::Serialization)
    }

    /// Parse the embedding response based on model type.
    fn parse_embedding_response(&self, body: &[u8]) -> Result<Vec<f32>, DashFlowError> {
        if self.is_cohere() {
            #[derive(Deserialize)]
            struct CohereResponse {
                embeddings: Vec<Vec<f32>>,
            }
            let response: CohereResponse = serde_json::from_slice(body)
                .map_err(|e| DashFlowError::api(format!("Failed to parse Cohere response: {e}")))?;
            response
                .embeddings
                .into_iter()
                .next()
                .ok_or_else(|| DashFlowError::api("No embeddings in Cohere response"))
        } else {
            // Titan v1 and v2 share the same response format
            #[derive(Deserialize)]
            struct TitanResponse {
                embedding: Vec<f32>,
            }
            let response: TitanResponse = serde_json::from_slice(body)
                .map_err(|e| DashFlowError::api(format!("Failed to parse Titan response: {e}")))?;
            Ok(response.embedding)
        }
    }
}

#[async_trait]
impl Embeddings for BedrockEmbeddings {
    async fn _embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DashFlowError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        // Process in batches (sequentially for Bedrock due to per-request model)
        for chunk in texts.chunks(self.batch_size) {
            let mut batch_embeddings = Vec::with_capacity(chunk.len());
            for text in chunk {
                let embedding = self
                    .embed_single(text, Some(InputType::SearchDocument))
                    .await?;
                batch_embeddings.push(embedding);
            }
            all_embeddings.extend(batch_embeddings);
        }

        Ok(all_embeddings)
    }

    async fn _embed_query(&self, text: &str) -> Result<Vec<f32>, DashFlowError> {
        self.embed_single(text, Some(InputType::SearchQuery)).await
    }
}
