//! DashFlow.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use async_trait::async_trait;
use faiss::{Index, MetricType, index_factory};
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::{Error, Result};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// FAISS vector database implementation.
///
/// This implementation uses Facebook AI Similarity Search (FAISS) for efficient
/// similarity search over dense vectors. FAISS is particularly well-suited for
/// large-scale vector search and supports various indexing methods (Flat, IVF, HNSW, etc.).
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_faiss::FaissVectorStore;
/// use dashflow::core::embeddings::Embeddings;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # struct MockEmbeddings;
/// # #[async_trait::async_trait]
/// # impl Embeddings for MockEmbeddings {
/// #     async fn embed_documents(&self, texts: &[impl AsRef<str> + Send + Sync]) -> dashflow::core::Result<Vec<Vec<f32>>> {
/// #         Ok(vec![vec![0.0; 384]; texts.len()])
/// #     }
/// #     async fn embed_query(&self, text: &str) -> dashflow::core::Result<Vec<f32>> {
/// #         Ok(vec![0.0; 384])
/// #     }
/// # }
/// let embeddings: Arc<dyn Embeddings> = Arc::new(MockEmbeddings);
///
/// let store = FaissVectorStore::new(
///     embeddings,
///     384, // dimension
///     "Flat", // index type
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub struct FaissVectorStore {
    index: Arc<Mutex<Box<dyn Index>>>,
    embeddings: Arc<dyn Embeddings>,
    dimension: usize,
    distance_metric: DistanceMetric,
    // Store document content and metadata separately since FAISS only stores vectors
    documents: Arc<Mutex<HashMap<i64, Document>>>,
    id_map: Arc<Mutex<HashMap<String, i64>>>,
    next_id: Arc<Mutex<i64>>,
}

impl FaissVectorStore {
    /// Creates a new FaissVectorStore instance.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - Embeddings model to use
    /// * `dimension` - Dimension of the embeddings (must match embeddings output)
    /// * `index_type` - FAISS index type string (e.g., "Flat", "IVF100,Flat", "HNSW32")
    ///   - "Flat": Exact search (exhaustive)
    ///   - "IVFx,Flat": Inverted file index with x clusters
    ///   - "HNSWx": Hierarchical Navigable Small World graph with x links
    ///   - See FAISS documentation for more index types
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Index creation fails
    /// - Invalid index type string
    pub async fn new(
        embeddings: Arc<dyn Embeddings>,
        dimension: usize,
        index_type: &str,
    ) -> Result<Self> {
        Self::new_with_metric(embeddings, dimension, index_type, DistanceMetric::Cosine).await
    }

    /// Creates a new FaissVectorStore with a specific distance metric.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - Embeddings model to use
    /// * `dimension` - Dimension of the embeddings
    /// * `index_type` - FAISS index type string
    /// * `metric` - Distance metric to use
    pub async fn new_with_metric(
        embeddings: Arc<dyn Embeddings>,
        dimension: usize,
        index_type: &str,
        metric: DistanceMetric,
    ) -> Result<Self> {
        // Convert DistanceMetric to FAISS MetricType
        let faiss_metric = match metric {
            DistanceMetric::Euclidean => MetricType::L2,
            DistanceMetric::DotProduct | DistanceMetric::MaxInnerProduct => MetricType::InnerProduct,
            DistanceMetric::Cosine => MetricType::InnerProduct, // Cosine uses inner product with normalized vectors
        };

        // Create FAISS index
        let index = index_factory(dimension as u32, index_type, faiss_metric)
            .map_err(|e| Error::api(format!("Failed to create FAISS index: {}", e)))?;

        Ok(Self {
            index: Arc::new(Mutex::new(index)),
            embeddings,
            dimension,
            distance_metric: metric,
            documents: Arc::new(Mutex::new(HashMap::new())),
            id_map: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
        })
    }

    /// Normalizes vectors for cosine similarity (L2 normalization).
    fn normalize_vectors(&self, vectors: &mut [f32]) {
        if self.distance_metric != DistanceMetric::Cosine {
            return;
        }

        let dim = self.dimension;
        for chunk in vectors.chunks_mut(dim) {
            let norm: f32 = chunk.iter().map(|&x| x * x).sum::<f32>().sqrt();
            if norm > 1e-10 {
                for val in chunk.iter_mut() {
                    *val /= norm;
                }
            }
        }
    }

    /// Converts FAISS distance to similarity score in [0, 1].
    fn distance_to_score(&self, distance: f32) -> f32 {
        match self.distance_metric {
            DistanceMetric::Cosine | DistanceMetric::DotProduct | DistanceMetric::MaxInnerProduct => {
                // For inner product metrics, higher is better
                // Normalize to [0, 1] range
                distance.max(0.0).min(1.0)
            }
            DistanceMetric::Euclidean => {
                // Euclidean distance - smaller is better
                // Use exponential decay: score = exp(-distance)
                (-distance).exp()
            }
        }
    }

    /// Gets the next internal ID for a new vector.
    fn get_next_id(&self) -> i64 {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id += 1;
        id
    }
}

#[async_trait]
impl VectorStore for FaissVectorStore {
    fn embeddings(&self) -> Option<Arc<dyn Embeddings>> {
        Some(Arc::clone(&self.embeddings))
    }

    fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    async fn add_texts(
        &mut self,
        texts: &[impl AsRef<str> + Send + Sync],
        metadatas: Option<&[HashMap<String, JsonValue>]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>> {
        if let Some(metadatas) = metadatas {
            if metadatas.len() != texts.len() {
                return Err(Error::invalid_input(format!(
                    "Metadatas length ({}) doesn't match texts length ({})",
                    metadatas.len(),
                    texts.len()
                )));
            }
        }

        if let Some(ids) = ids {
            if ids.len() != texts.len() {
                return Err(Error::invalid_input(format!(
                    "IDs length ({}) doesn't match texts length ({})",
                    ids.len(),
                    texts.len()
                )));
            }
        }

        // Generate embeddings
        let mut embeddings = self.embeddings.embed_documents(texts).await?;

        // Validate embedding dimensions
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != self.dimension {
                return Err(Error::invalid_input(format!(
                    "Embedding {} has dimension {} but expected {}",
                    i,
                    embedding.len(),
                    self.dimension
                )));
            }
        }

        // Flatten embeddings for FAISS (column-major order)
        let mut flat_embeddings: Vec<f32> = embeddings.iter()
            .flat_map(|e| e.iter().copied())
            .collect();

        // Normalize if using cosine similarity
        self.normalize_vectors(&mut flat_embeddings);

        // Add to FAISS index
        let mut index = self.index.lock();
        index.add(&flat_embeddings)
            .map_err(|e| Error::api(format!("Failed to add vectors to FAISS index: {}", e)))?;
        drop(index); // Release lock early

        // Generate or use provided IDs
        let doc_ids: Vec<String> = if let Some(ids) = ids {
            ids.to_vec()
        } else {
            (0..texts.len()).map(|_| Uuid::new_v4().to_string()).collect()
        };

        // Store documents with their metadata
        let mut documents = self.documents.lock();
        let mut id_map = self.id_map.lock();

        for (i, text) in texts.iter().enumerate() {
            let internal_id = self.get_next_id();
            let metadata = metadatas.and_then(|m| m.get(i)).cloned().unwrap_or_default();

            let doc = Document {
                page_content: text.as_ref().to_string(),
                metadata,
                id: Some(doc_ids[i].clone()),
            };

            documents.insert(internal_id, doc);
            id_map.insert(doc_ids[i].clone(), internal_id);
        }

        Ok(doc_ids)
    }

    async fn add_documents(
        &mut self,
        documents: &[Document],
        ids: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let metadatas: Vec<HashMap<String, JsonValue>> = documents.iter()
            .map(|d| d.metadata.clone())
            .collect();

        self.add_texts(&texts, Some(&metadatas), ids).await
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool> {
        if let Some(ids) = ids {
            let mut id_map = self.id_map.lock();
            let mut documents = self.documents.lock();

            let mut deleted_any = false;
            for id in ids {
                if let Some(internal_id) = id_map.remove(id) {
                    documents.remove(&internal_id);
                    deleted_any = true;
                }
            }

            Ok(deleted_any)
        } else {
            // Delete all
            let mut id_map = self.id_map.lock();
            let mut documents = self.documents.lock();
            let mut index = self.index.lock();
            let mut next_id = self.next_id.lock();

            id_map.clear();
            documents.clear();
            *next_id = 0;

            // Reset FAISS index
            index.reset()
                .map_err(|e| Error::api(format!("Failed to reset FAISS index: {}", e)))?;

            Ok(true)
        }
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        let id_map = self.id_map.lock();
        let documents = self.documents.lock();

        let mut results = Vec::new();
        for id in ids {
            if let Some(internal_id) = id_map.get(id) {
                if let Some(doc) = documents.get(internal_id) {
                    results.push(doc.clone());
                }
            }
        }

        Ok(results)
    }

    async fn _similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self.similarity_search_with_score(query, k, filter).await?;
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Generate query embedding
        let query_embedding = self.embeddings.embed_query(query).await?;

        self.similarity_search_by_vector_with_score(&query_embedding, k, filter).await
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self.similarity_search_by_vector_with_score(embedding, k, filter).await?;
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_by_vector_with_score(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Validate embedding dimension
        if embedding.len() != self.dimension {
            return Err(Error::invalid_input(format!(
                "Query embedding has dimension {} but expected {}",
                embedding.len(),
                self.dimension
            )));
        }

        // Normalize query vector if using cosine similarity
        let mut query_vec = embedding.to_vec();
        if self.distance_metric == DistanceMetric::Cosine {
            let norm: f32 = query_vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
            if norm > 1e-10 {
                for val in query_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }

        // Search in FAISS index
        let index = self.index.lock();
        let search_result = index.search(&query_vec, k)
            .map_err(|e| Error::api(format!("FAISS search failed: {}", e)))?;
        drop(index); // Release lock early

        // Map FAISS results to documents
        let documents = self.documents.lock();
        let mut results = Vec::new();

        for (idx, distance) in search_result.labels.iter().zip(search_result.distances.iter()) {
            // FAISS returns -1 for invalid results
            if *idx < 0 {
                continue;
            }

            let internal_id = *idx;
            if let Some(doc) = documents.get(&internal_id) {
                // Apply metadata filtering if provided
                if let Some(filter) = filter {
                    let mut matches = true;
                    for (key, value) in filter {
                        if doc.metadata.get(key) != Some(value) {
                            matches = false;
                            break;
                        }
                    }
                    if !matches {
                        continue;
                    }
                }

                let score = self.distance_to_score(*distance);
                results.push((doc.clone(), score));
            }
        }

        Ok(results)
    }

    async fn max_marginal_relevance_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda: f32,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        // Generate query embedding
        let query_embedding = self.embeddings.embed_query(query).await?;

        // Fetch more candidates than needed
        let candidates = self.similarity_search_by_vector_with_score(
            &query_embedding,
            fetch_k,
            filter,
        ).await?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Extract embeddings for MMR calculation
        let candidate_docs: Vec<Document> = candidates.iter().map(|(doc, _)| doc.clone()).collect();
        let texts: Vec<&str> = candidate_docs.iter().map(|d| d.page_content.as_str()).collect();
        let candidate_embeddings = self.embeddings.embed_documents(&texts).await?;

        // MMR algorithm
        let mut selected_indices = Vec::new();
        let mut selected_embeddings = Vec::new();

        while selected_indices.len() < k && selected_indices.len() < candidates.len() {
            let mut best_score = f32::NEG_INFINITY;
            let mut best_idx = 0;

            for (i, embedding) in candidate_embeddings.iter().enumerate() {
                if selected_indices.contains(&i) {
                    continue;
                }

                // Relevance to query
                let relevance = Self::cosine_similarity(&query_embedding, embedding);

                // Maximum similarity to already selected documents
                let max_sim = if selected_embeddings.is_empty() {
                    0.0
                } else {
                    selected_embeddings.iter()
                        .map(|selected| Self::cosine_similarity(embedding, selected))
                        .fold(f32::NEG_INFINITY, f32::max)
                };

                // MMR score
                let mmr_score = lambda * relevance - (1.0 - lambda) * max_sim;

                if mmr_score > best_score {
                    best_score = mmr_score;
                    best_idx = i;
                }
            }

            selected_indices.push(best_idx);
            selected_embeddings.push(candidate_embeddings[best_idx].clone());
        }

        // Return selected documents
        Ok(selected_indices.iter()
            .map(|&i| candidate_docs[i].clone())
            .collect())
    }
}

impl FaissVectorStore {
    /// Calculates cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a < 1e-10 || norm_b < 1e-10 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}
