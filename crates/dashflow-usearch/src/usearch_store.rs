//! `USearch` vector store implementation for `DashFlow` Rust.
//!
//! Note: All Mutex usages now use poison-safe patterns (unwrap_or_else with into_inner).
//! The blanket #![allow(clippy::unwrap_used)] was removed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashflow::core::config::RunnableConfig;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::indexing::document_index::{DeleteResponse, DocumentIndex, UpsertResponse};
use dashflow::core::retrievers::Retriever;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::{Error, Result};
use dashflow::{embed, embed_query};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// Metadata entry stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorMetadata {
    /// Document ID
    id: String,
    /// Original text
    text: String,
    /// User-defined metadata
    metadata: HashMap<String, JsonValue>,
}

/// `USearch` vector store implementation using SIMD-accelerated ANN search.
///
/// This vector store uses the `USearch` library to provide fast, in-memory
/// approximate nearest neighbor search with HNSW indexing.
pub struct USearchVectorStore {
    /// The `USearch` index
    index: Arc<Mutex<Index>>,
    /// Embeddings model
    embeddings: Arc<dyn Embeddings>,
    /// Distance metric used
    distance_metric: DistanceMetric,
    /// Vector dimensionality
    dimensions: usize,
    /// Storage for document metadata (key -> metadata)
    metadata_store: Arc<Mutex<HashMap<u64, VectorMetadata>>>,
    /// Counter for generating unique keys
    key_counter: Arc<Mutex<u64>>,
}

impl USearchVectorStore {
    /// Creates a new `USearchVectorStore` instance.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - The embeddings model to use for generating vectors
    /// * `dimensions` - The dimensionality of the vectors
    /// * `distance_metric` - Optional distance metric (defaults to Cosine)
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use dashflow_usearch::USearchVectorStore;
    /// use dashflow::core::vector_stores::DistanceMetric;
    /// # use std::sync::Arc;
    /// # use dashflow::core::embeddings::Embeddings;
    ///
    /// # fn example(embeddings: Arc<dyn Embeddings>) -> Result<(), Box<dyn std::error::Error>> {
    /// let store = USearchVectorStore::new(embeddings, 384, Some(DistanceMetric::Cosine))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        embeddings: Arc<dyn Embeddings>,
        dimensions: usize,
        distance_metric: Option<DistanceMetric>,
    ) -> Result<Self> {
        let distance_metric = distance_metric.unwrap_or(DistanceMetric::Cosine);
        let metric_kind = Self::distance_metric_to_usearch(&distance_metric);

        let options = IndexOptions {
            dimensions,
            metric: metric_kind,
            quantization: ScalarKind::F32,
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            multi: false,
        };

        let index = Index::new(&options).map_err(|e| Error::config(e.to_string()))?;

        Ok(Self {
            index: Arc::new(Mutex::new(index)),
            embeddings,
            distance_metric,
            dimensions,
            metadata_store: Arc::new(Mutex::new(HashMap::new())),
            key_counter: Arc::new(Mutex::new(0)),
        })
    }

    /// Saves the index to a file.
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to save to
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # async fn example(mut store: USearchVectorStore) -> Result<(), Box<dyn std::error::Error>> {
    /// store.save("my_index.usearch")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: &str) -> Result<()> {
        let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        index
            .save(path)
            .map_err(|e| Error::other(format!("Failed to save USearch index: {e}")))?;

        // Save metadata separately
        let metadata_path = format!("{path}.meta");
        let metadata = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let metadata_json =
            serde_json::to_string(&*metadata).map_err(|e| Error::other(e.to_string()))?;
        std::fs::write(&metadata_path, metadata_json)
            .map_err(|e| Error::other(format!("Failed to save metadata: {e}")))?;

        Ok(())
    }

    /// Loads an index from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to load from
    /// * `embeddings` - The embeddings model to use
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use dashflow_usearch::USearchVectorStore;
    /// # use std::sync::Arc;
    /// # use dashflow::core::embeddings::Embeddings;
    ///
    /// # async fn example(embeddings: Arc<dyn Embeddings>) -> Result<(), Box<dyn std::error::Error>> {
    /// let store = USearchVectorStore::load("my_index.usearch", embeddings)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &str, embeddings: Arc<dyn Embeddings>) -> Result<Self> {
        // We need to create a temporary index to inspect its properties
        // USearch doesn't expose index metadata before loading
        let temp_options = IndexOptions {
            dimensions: 1, // Will be overwritten by load
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            multi: false,
        };

        let index = Index::new(&temp_options).map_err(|e| Error::config(e.to_string()))?;
        index
            .load(path)
            .map_err(|e| Error::other(format!("Failed to load USearch index: {e}")))?;

        // Load metadata
        let metadata_path = format!("{path}.meta");
        let metadata_json = std::fs::read_to_string(&metadata_path)
            .map_err(|e| Error::other(format!("Failed to load metadata: {e}")))?;
        let metadata: HashMap<u64, VectorMetadata> =
            serde_json::from_str(&metadata_json).map_err(|e| Error::other(e.to_string()))?;

        // Determine max key for counter
        let max_key = metadata.keys().max().copied().unwrap_or(0);

        // Get dimensions from loaded index
        let dimensions = index.dimensions();

        Ok(Self {
            index: Arc::new(Mutex::new(index)),
            embeddings,
            distance_metric: DistanceMetric::Cosine, // Default, could be stored in metadata
            dimensions,
            metadata_store: Arc::new(Mutex::new(metadata)),
            key_counter: Arc::new(Mutex::new(max_key + 1)),
        })
    }

    /// Converts `DashFlow` `DistanceMetric` to `USearch` `MetricKind`
    fn distance_metric_to_usearch(metric: &DistanceMetric) -> MetricKind {
        match metric {
            DistanceMetric::Cosine => MetricKind::Cos,
            DistanceMetric::Euclidean => MetricKind::L2sq,
            DistanceMetric::DotProduct => MetricKind::IP,
            _ => MetricKind::Cos, // Default to cosine for unsupported metrics
        }
    }

    /// Generates a unique key for a new vector
    fn next_key(&self) -> u64 {
        let mut counter = self.key_counter.lock().unwrap_or_else(|e| e.into_inner());
        let key = *counter;
        *counter += 1;
        key
    }
}

#[async_trait]
impl VectorStore for USearchVectorStore {
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
        let text_count = texts.len();
        if let Some(metadatas) = metadatas {
            if metadatas.len() != text_count {
                return Err(Error::config(format!(
                    "Metadatas length mismatch: {} vs {}",
                    metadatas.len(),
                    text_count
                )));
            }
        }
        if let Some(ids) = ids {
            if ids.len() != text_count {
                return Err(Error::config(format!(
                    "IDs length mismatch: {} vs {}",
                    ids.len(),
                    text_count
                )));
            }
        }

        // Convert texts to strings
        let text_strings: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();

        // Generate embeddings using graph API
        let embeddings_vec = embed(Arc::clone(&self.embeddings), &text_strings).await?;

        // Verify embedding dimensions
        if !embeddings_vec.is_empty() && embeddings_vec[0].len() != self.dimensions {
            return Err(Error::config(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embeddings_vec[0].len()
            )));
        }

        // Generate IDs if not provided
        let doc_ids: Vec<String> = if let Some(ids) = ids {
            ids.to_vec()
        } else {
            (0..text_count)
                .map(|_| uuid::Uuid::new_v4().to_string())
                .collect()
        };

        // Add vectors to index
        let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());

        for (i, embedding) in embeddings_vec.iter().enumerate() {
            let key = self.next_key();
            let vector: Vec<f32> = embedding.clone();

            // Add to USearch index
            index
                .add(key, &vector)
                .map_err(|e| Error::other(format!("Failed to add vector to index: {e}")))?;

            // Store metadata
            let metadata = VectorMetadata {
                id: doc_ids[i].clone(),
                text: text_strings[i].clone(),
                metadata: metadatas.map(|m| m[i].clone()).unwrap_or_default(),
            };
            metadata_store.insert(key, metadata);
        }

        Ok(doc_ids)
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool> {
        let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(ids) = ids {
            // Delete specific IDs
            let keys_to_delete: Vec<u64> = metadata_store
                .iter()
                .filter(|(_, meta)| ids.contains(&meta.id))
                .map(|(k, _)| *k)
                .collect();

            for key in keys_to_delete {
                index
                    .remove(key)
                    .map_err(|e| Error::other(format!("Failed to remove vector: {e}")))?;
                metadata_store.remove(&key);
            }
        } else {
            // Delete all - USearch doesn't have clear() so we recreate the index
            let options = IndexOptions {
                dimensions: self.dimensions,
                metric: Self::distance_metric_to_usearch(&self.distance_metric),
                quantization: ScalarKind::F32,
                connectivity: 16,
                expansion_add: 128,
                expansion_search: 64,
                multi: false,
            };

            *index = Index::new(&options).map_err(|e| Error::config(e.to_string()))?;
            metadata_store.clear();
            *self.key_counter.lock().unwrap_or_else(|e| e.into_inner()) = 0;
        }

        Ok(true)
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut documents = Vec::new();

        for (_, meta) in metadata_store.iter() {
            if ids.contains(&meta.id) {
                documents.push(Document {
                    page_content: meta.text.clone(),
                    metadata: meta.metadata.clone(),
                    id: Some(meta.id.clone()),
                });
            }
        }

        Ok(documents)
    }

    async fn _similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self.similarity_search_with_score(query, k, filter).await?;
        Ok(results.into_iter().map(|(doc, _score)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Generate query embedding using graph API
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query).await?;

        if query_embedding.len() != self.dimensions {
            return Err(Error::config(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_embedding.len()
            )));
        }

        let vector: Vec<f32> = query_embedding;

        // Search in index
        let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        let results = if let Some(filter) = filter {
            // Filtered search
            index
                .filtered_search(&vector, k, |key| {
                    let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
                    if let Some(meta) = metadata_store.get(&key) {
                        filter.iter().all(|(k, v)| meta.metadata.get(k) == Some(v))
                    } else {
                        false
                    }
                })
                .map_err(|e| Error::other(format!("USearch filtered search failed: {e}")))?
        } else {
            // Regular search
            index
                .search(&vector, k)
                .map_err(|e| Error::other(format!("USearch search failed: {e}")))?
        };

        // Convert results to documents
        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut documents = Vec::new();

        for match_result in results.keys.iter().zip(results.distances.iter()) {
            let (key, distance) = match_result;
            if let Some(meta) = metadata_store.get(key) {
                let document = Document {
                    page_content: meta.text.clone(),
                    metadata: meta.metadata.clone(),
                    id: Some(meta.id.clone()),
                };
                // USearch returns distances, we keep them as-is
                // Lower distance = more similar for L2
                // Higher similarity = more similar for cosine (but USearch returns distance)
                documents.push((document, *distance));
            }
        }

        Ok(documents)
    }

    async fn max_marginal_relevance_search(
        &self,
        query: &str,
        k: usize,
        fetch_k: usize,
        lambda_mult: f32,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        // Generate query embedding using graph API
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query).await?;

        if query_embedding.len() != self.dimensions {
            return Err(Error::config(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_embedding.len()
            )));
        }

        let vector: Vec<f32> = query_embedding.clone();

        // Fetch more candidates than needed
        let results = {
            let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(filter) = filter {
                index
                    .filtered_search(&vector, fetch_k, |key| {
                        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
                        if let Some(meta) = metadata_store.get(&key) {
                            filter.iter().all(|(k, v)| meta.metadata.get(k) == Some(v))
                        } else {
                            false
                        }
                    })
                    .map_err(|e| Error::other(format!("USearch filtered search failed: {e}")))?
            } else {
                index
                    .search(&vector, fetch_k)
                    .map_err(|e| Error::other(format!("USearch search failed: {e}")))?
            }
        }; // Release index lock

        // Get texts for all candidates (without holding locks across awaits)
        let candidate_texts: Vec<String> = {
            let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
            results
                .keys
                .iter()
                .filter_map(|key| metadata_store.get(key).map(|meta| meta.text.clone()))
                .collect()
        }; // Release metadata lock

        // Get embeddings for all candidates using graph API (NOW safe to await)
        let mut candidate_embeddings: Vec<Vec<f32>> = Vec::new();
        let candidate_keys: Vec<u64> = results.keys.clone();

        for text in &candidate_texts {
            let emb = embed_query(Arc::clone(&self.embeddings), text).await?;
            candidate_embeddings.push(emb);
        }

        // MMR algorithm
        let mut selected_indices: Vec<usize> = Vec::new();
        let mut remaining_indices: Vec<usize> = (0..candidate_keys.len()).collect();

        for _ in 0..k.min(candidate_keys.len()) {
            if remaining_indices.is_empty() {
                break;
            }

            let mut best_score = f32::NEG_INFINITY;
            let mut best_idx = 0;

            for &idx in &remaining_indices {
                // Relevance score (cosine similarity with query)
                let idx_emb = &candidate_embeddings[idx];
                let relevance = cosine_similarity(&query_embedding, idx_emb);

                // Diversity score (max similarity with already selected)
                let diversity = if selected_indices.is_empty() {
                    0.0
                } else {
                    selected_indices
                        .iter()
                        .map(|&sel_idx| cosine_similarity(idx_emb, &candidate_embeddings[sel_idx][..]))
                        .fold(f32::NEG_INFINITY, f32::max)
                };

                // MMR score
                let mmr_score = lambda_mult * relevance - (1.0 - lambda_mult) * diversity;

                if mmr_score > best_score {
                    best_score = mmr_score;
                    best_idx = idx;
                }
            }

            selected_indices.push(best_idx);
            remaining_indices.retain(|&x| x != best_idx);
        }

        // Build result documents
        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut documents = Vec::new();
        for idx in selected_indices {
            let key = candidate_keys[idx];
            if let Some(meta) = metadata_store.get(&key) {
                documents.push(Document {
                    page_content: meta.text.clone(),
                    metadata: meta.metadata.clone(),
                    id: Some(meta.id.clone()),
                });
            }
        }

        Ok(documents)
    }
}

/// Computes cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[async_trait]
impl Retriever for USearchVectorStore {
    async fn _get_relevant_documents(
        &self,
        query: &str,
        config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        let _ = config;
        self._similarity_search(query, 4, None).await
    }
}

#[async_trait]
impl DocumentIndex for USearchVectorStore {
    async fn upsert(
        &self,
        documents: &[Document],
    ) -> std::result::Result<UpsertResponse, Box<dyn std::error::Error + Send + Sync>> {
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let metadatas: Vec<HashMap<String, JsonValue>> =
            documents.iter().map(|d| d.metadata.clone()).collect();
        let ids: Option<Vec<String>> = {
            let collected: Vec<String> = documents.iter().filter_map(|d| d.id.clone()).collect();
            if collected.len() == documents.len() {
                Some(collected)
            } else {
                None
            }
        };

        // Generate embeddings using graph API BEFORE locking (to avoid holding lock across await)
        let text_strings: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let embeddings_vec = embed(Arc::clone(&self.embeddings), &text_strings)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        // Generate IDs if not provided
        let doc_ids: Vec<String> = if let Some(ids) = ids {
            ids
        } else {
            (0..texts.len())
                .map(|_| uuid::Uuid::new_v4().to_string())
                .collect()
        };

        // Now lock and add vectors to index (no awaits while locked)
        {
            let index = self.index.lock().unwrap_or_else(|e| e.into_inner());
            let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());

            for (i, embedding) in embeddings_vec.iter().enumerate() {
                let key = {
                    let mut counter = self.key_counter.lock().unwrap_or_else(|e| e.into_inner());
                    let k = *counter;
                    *counter += 1;
                    k
                };
                let vector: Vec<f32> = embedding.clone();

                index.add(key, &vector).map_err(|e| {
                    Box::new(std::io::Error::other(e.to_string()))
                        as Box<dyn std::error::Error + Send + Sync>
                })?;

                let metadata = VectorMetadata {
                    id: doc_ids[i].clone(),
                    text: text_strings[i].clone(),
                    metadata: metadatas[i].clone(),
                };
                metadata_store.insert(key, metadata);
            }
        } // Locks are released here

        Ok(UpsertResponse {
            succeeded: doc_ids,
            failed: vec![],
        })
    }

    async fn delete(
        &self,
        ids: Option<&[String]>,
    ) -> std::result::Result<DeleteResponse, Box<dyn std::error::Error + Send + Sync>> {
        let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(ids) = ids {
            let keys_to_delete: Vec<u64> = metadata_store
                .iter()
                .filter(|(_, meta)| ids.contains(&meta.id))
                .map(|(k, _)| *k)
                .collect();

            for key in &keys_to_delete {
                index.remove(*key).map_err(|e| {
                    Box::new(std::io::Error::other(e.to_string()))
                        as Box<dyn std::error::Error + Send + Sync>
                })?;
                metadata_store.remove(key);
            }

            Ok(DeleteResponse {
                num_deleted: Some(keys_to_delete.len()),
                succeeded: Some(ids.to_vec()),
                failed: Some(vec![]),
                num_failed: Some(0),
            })
        } else {
            let count = metadata_store.len();
            // Delete all
            let options = IndexOptions {
                dimensions: self.dimensions,
                metric: Self::distance_metric_to_usearch(&self.distance_metric),
                quantization: ScalarKind::F32,
                connectivity: 16,
                expansion_add: 128,
                expansion_search: 64,
                multi: false,
            };

            *index = Index::new(&options).map_err(|e| {
                Box::new(std::io::Error::other(e.to_string()))
                    as Box<dyn std::error::Error + Send + Sync>
            })?;
            metadata_store.clear();
            *self.key_counter.lock().unwrap_or_else(|e| e.into_inner()) = 0;

            Ok(DeleteResponse {
                num_deleted: Some(count),
                succeeded: None,
                failed: None,
                num_failed: Some(0),
            })
        }
    }

    async fn get(
        &self,
        ids: &[String],
    ) -> std::result::Result<Vec<Document>, Box<dyn std::error::Error + Send + Sync>> {
        self.get_by_ids(ids)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}
