//! Build ChromaVectorStore from config
//!
//! This module provides a function to build a `ChromaVectorStore` from
//! a `VectorStoreConfig`.

use crate::ChromaVectorStore;
use dashflow::core::config_loader::VectorStoreConfig;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::Error as DashFlowError;
use std::sync::Arc;

/// Build a Chroma vector store from a VectorStoreConfig
///
/// This function creates a `ChromaVectorStore` from configuration, handling
/// embedding creation automatically.
///
/// # Example
///
/// ```rust,ignore
/// use dashflow::core::config_loader::{VectorStoreConfig, EmbeddingConfig, SecretReference};
/// use dashflow_chroma::build_vector_store;
///
/// let config = VectorStoreConfig::Chroma {
///     collection_name: "my_collection".to_string(),
///     url: "http://localhost:8000".to_string(),
///     embedding: Box::new(EmbeddingConfig::OpenAI {
///         model: "text-embedding-3-small".to_string(),
///         api_key: SecretReference::from_env("OPENAI_API_KEY"),
///         batch_size: 512,
///     }),
/// };
///
/// let store = build_vector_store(&config, embeddings).await?;
/// ```
///
/// # Arguments
///
/// * `config` - The vector store configuration
/// * `embeddings` - The embeddings instance to use (must be created separately)
///
/// # Errors
///
/// Returns an error if:
/// - The config is not a Chroma config
/// - Connection to Chroma server fails
/// - Collection creation fails
pub async fn build_vector_store(
    config: &VectorStoreConfig,
    embeddings: Arc<dyn Embeddings>,
) -> Result<ChromaVectorStore, DashFlowError> {
    match config {
        VectorStoreConfig::Chroma {
            collection_name,
            url,
            embedding: _,
        } => ChromaVectorStore::new(collection_name, embeddings, Some(url))
            .await
            .map_err(|e| DashFlowError::other(format!("Failed to create Chroma store: {e}"))),
        other => Err(DashFlowError::InvalidInput(format!(
            "build_vector_store from dashflow-chroma only supports Chroma configs, \
             got {} config. Use the appropriate provider crate for this config type.",
            other.provider()
        ))),
    }
}
