//! Ollama embeddings implementation

use async_trait::async_trait;
use dashflow::core::{
    embeddings::Embeddings,
    error::{Error, Result},
    retry::{with_retry, RetryPolicy},
};
use ollama_rs::{
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
    Ollama,
};
use std::sync::Arc;

/// Ollama embeddings model configuration and client
///
/// Provides text embeddings via local Ollama models, enabling embedding
/// generation without external API dependencies.
///
/// # Example
/// ```no_run
/// use dashflow_ollama::OllamaEmbeddings;
/// use dashflow::embed_query;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let embedder = Arc::new(OllamaEmbeddings::new().with_model("nomic-embed-text"));
///
///     let query = "What is the meaning of life?";
///     let embedding = embed_query(embedder, query).await.unwrap();
///     println!("Embedding dimension: {}", embedding.len());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct OllamaEmbeddings {
    /// Ollama client
    client: Arc<Ollama>,

    /// Model name (e.g., "nomic-embed-text", "mxbai-embed-large")
    model: String,

    /// Whether to truncate inputs that exceed the model's max context length
    truncate: bool,

    /// Retry policy for API calls
    retry_policy: RetryPolicy,
}

impl OllamaEmbeddings {
    /// Create a new `OllamaEmbeddings` instance with default settings
    ///
    /// Connects to Ollama at <http://localhost:11434> by default.
    /// Uses "nomic-embed-text" model as the default (a good general-purpose embedding model).
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_ollama::OllamaEmbeddings;
    ///
    /// let embedder = OllamaEmbeddings::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new `OllamaEmbeddings` instance with custom base URL
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_ollama::OllamaEmbeddings;
    ///
    /// let embedder = OllamaEmbeddings::with_base_url("http://custom-host:8080")
    ///     .with_model("mxbai-embed-large");
    /// ```
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let ollama = Ollama::new(base_url.into(), 11434);
        Self {
            client: Arc::new(ollama),
            model: "nomic-embed-text".to_string(),
            truncate: true,
            retry_policy: RetryPolicy::exponential(3),
        }
    }

    /// Set the model name
    ///
    /// Common Ollama embedding models:
    /// - `nomic-embed-text`: 768-dim embeddings, good general purpose (137M params)
    /// - `mxbai-embed-large`: 1024-dim embeddings, higher quality (335M params)
    /// - `all-minilm`: 384-dim embeddings, fast and lightweight (22M params)
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_ollama::OllamaEmbeddings;
    ///
    /// let embedder = OllamaEmbeddings::new()
    ///     .with_model("mxbai-embed-large");
    /// ```
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set whether to truncate inputs that exceed the model's context length
    ///
    /// When true (default), inputs longer than the model's max context length
    /// will be truncated. When false, long inputs will cause an error.
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_ollama::OllamaEmbeddings;
    ///
    /// let embedder = OllamaEmbeddings::new()
    ///     .with_truncate(false);
    /// ```
    #[must_use]
    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }
}

impl Default for OllamaEmbeddings {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaEmbeddings {
    /// Create Ollama embeddings from configuration
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dashflow::core::config_loader::{DashFlowConfig, EmbeddingConfig};
    /// use dashflow_ollama::OllamaEmbeddings;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let yaml = r#"
    /// embeddings:
    ///   default:
    ///     type: ollama
    ///     model: nomic-embed-text
    ///     base_url: http://localhost:11434
    /// "#;
    ///
    /// let config = DashFlowConfig::from_yaml(yaml)?;
    /// let embedding_config = config.get_embedding("default").unwrap();
    /// let embedder = OllamaEmbeddings::from_config(embedding_config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &dashflow::core::config_loader::EmbeddingConfig) -> Result<Self> {
        match config {
            dashflow::core::config_loader::EmbeddingConfig::Ollama { model, base_url } => {
                let embedder =
                    OllamaEmbeddings::with_base_url(base_url.clone()).with_model(model.clone());

                Ok(embedder)
            }
            _ => Err(Error::Configuration(
                "Expected Ollama embedding config".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Embeddings for OllamaEmbeddings {
    #[allow(clippy::clone_on_ref_ptr)] // Arc<Ollama> cloned for retry closure
    async fn _embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Ollama's embedding API supports batch embedding natively
        // We can send all texts in a single request
        let texts_vec = texts.to_vec();
        let model = self.model.clone();
        let truncate = self.truncate;
        let client = self.client.clone();

        let response = with_retry(&self.retry_policy, move || {
            let client = client.clone();
            let model = model.clone();
            let texts_vec = texts_vec.clone();
            async move {
                let input = EmbeddingsInput::Multiple(texts_vec);
                let request = GenerateEmbeddingsRequest::new(model, input).truncate(truncate);
                client
                    .generate_embeddings(request)
                    .await
                    .map_err(|e| Error::api(format!("Ollama embeddings error: {e}")))
            }
        })
        .await?;

        Ok(response.embeddings)
    }

    #[allow(clippy::clone_on_ref_ptr)] // Arc<Ollama> cloned for retry closure
    async fn _embed_query(&self, text: &str) -> Result<Vec<f32>> {
        // Use the same embedding method for queries as documents
        // Some models may differentiate these, but Ollama treats them the same
        let text_string = text.to_string();
        let model = self.model.clone();
        let truncate = self.truncate;
        let client = self.client.clone();

        let response = with_retry(&self.retry_policy, move || {
            let client = client.clone();
            let model = model.clone();
            let text_string = text_string.clone();
            async move {
                let input = EmbeddingsInput::Single(text_string);
                let request = GenerateEmbeddingsRequest::new(model, input).truncate(truncate);
                client
                    .generate_embeddings(request)
                    .await
                    .map_err(|e| Error::api(format!("Ollama embeddings error: {e}")))
            }
        })
        .await?;

        // Extract the first (and only) embedding
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::api("No embeddings returned from Ollama".to_string()))
    }
}
