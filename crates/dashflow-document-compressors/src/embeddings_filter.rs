//! Embeddings-based document filter
//!
//! This compressor filters documents based on cosine similarity between
//! document embeddings and the query embedding.

use async_trait::async_trait;
use dashflow::core::{
    config::RunnableConfig,
    documents::{Document, DocumentCompressor},
    embeddings::Embeddings,
    error::{Error, Result},
};
use dashflow::{embed, embed_query};
use std::sync::Arc;

/// Calculate cosine similarity between a query embedding and multiple document embeddings
///
/// Returns a vector of similarity scores, one for each document embedding.
fn cosine_similarity_batch(query: &[f32], docs: &[Vec<f32>]) -> Vec<f32> {
    docs.iter()
        .map(|doc_embedding| cosine_similarity(query, doc_embedding))
        .collect()
}

/// Calculate cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Document compressor that filters by embedding similarity
///
/// This compressor embeds both the query and documents, then filters documents
/// based on cosine similarity to the query. You can specify either:
/// - `k`: Keep the top k most similar documents
/// - `similarity_threshold`: Keep all documents above this threshold
///
/// # Example
///
/// ```rust,ignore
/// use dashflow_document_compressors::EmbeddingsFilter;
/// use dashflow_openai::OpenAIEmbeddings;
/// use dashflow::core::documents::Document;
///
/// let embeddings = OpenAIEmbeddings::new();
/// let filter = EmbeddingsFilter::new(embeddings).with_k(5);
///
/// let docs = vec![
///     Document::new("Rust is a systems programming language"),
///     Document::new("Python is a high-level language"),
/// ];
///
/// let filtered = filter.compress_documents(docs, "What is Rust?", None).await?;
/// // Returns top 5 most similar documents
/// ```
pub struct EmbeddingsFilter {
    /// Embeddings model to use
    embeddings: Arc<dyn Embeddings>,
    /// Number of top documents to keep (mutually exclusive with `similarity_threshold`)
    k: Option<usize>,
    /// Minimum similarity threshold (mutually exclusive with k)
    similarity_threshold: Option<f32>,
}

impl EmbeddingsFilter {
    /// Create a new filter with the given embeddings model
    ///
    /// By default, keeps top 20 documents. Use `with_k()` or `with_similarity_threshold()`
    /// to customize the filtering behavior.
    pub fn new(embeddings: Arc<dyn Embeddings>) -> Self {
        Self {
            embeddings,
            k: Some(20),
            similarity_threshold: None,
        }
    }

    /// Set the number of top documents to keep
    ///
    /// This will clear any `similarity_threshold` setting.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self.similarity_threshold = None;
        self
    }

    /// Set the minimum similarity threshold
    ///
    /// Only documents with similarity >= threshold will be kept.
    /// This will clear any k setting.
    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self.k = None;
        self
    }

    /// Validate that either k or `similarity_threshold` is set
    fn validate(&self) -> Result<()> {
        if self.k.is_none() && self.similarity_threshold.is_none() {
            return Err(Error::InvalidInput(
                "Must specify either k or similarity_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCompressor for EmbeddingsFilter {
    async fn compress_documents(
        &self,
        documents: Vec<Document>,
        query: &str,
        _config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        self.validate()?;

        if documents.is_empty() {
            return Ok(vec![]);
        }

        // Embed query using graph API
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query).await?;

        // Embed documents using graph API
        let doc_texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let doc_embeddings = embed(Arc::clone(&self.embeddings), &doc_texts).await?;

        // Calculate similarities
        let similarities = cosine_similarity_batch(&query_embedding, &doc_embeddings);

        // Create indices with scores
        let mut indexed_docs: Vec<(usize, f32, &Document)> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, similarities[i], doc))
            .collect();

        // Sort by similarity (descending)
        indexed_docs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        // Filter based on k or threshold
        let filtered_docs: Vec<Document> = if let Some(k) = self.k {
            // Keep top k
            indexed_docs
                .into_iter()
                .take(k)
                .map(|(_, score, doc)| {
                    let mut new_doc = doc.clone();
                    new_doc.metadata.insert(
                        "query_similarity_score".to_string(),
                        serde_json::json!(score),
                    );
                    new_doc
                })
                .collect()
        } else if let Some(threshold) = self.similarity_threshold {
            // Keep above threshold
            indexed_docs
                .into_iter()
                .filter(|(_, score, _)| *score >= threshold)
                .map(|(_, score, doc)| {
                    let mut new_doc = doc.clone();
                    new_doc.metadata.insert(
                        "query_similarity_score".to_string(),
                        serde_json::json!(score),
                    );
                    new_doc
                })
                .collect()
        } else {
            vec![]
        };

        Ok(filtered_docs)
    }
}
