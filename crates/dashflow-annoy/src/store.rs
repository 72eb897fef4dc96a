//! Annoy vector store implementation using arroy.
//!
//! Note: This implementation only supports Euclidean and Cosine distance metrics
//! due to arroy's type-level distance metric system.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use arroy::distances::{Cosine, Euclidean};
use arroy::{Database as ArroyDatabase, Reader, Writer};
use async_trait::async_trait;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::indexing::document_index::{DeleteResponse, DocumentIndex, UpsertResponse};
use dashflow::core::retrievers::Retriever;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::{Error, Result};
use dashflow::{embed, embed_query};
use heed::EnvOpenOptions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tempfile::TempDir;
use uuid::Uuid;

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

/// Annoy vector store implementation using arroy library with Euclidean distance.
///
/// This vector store uses the arroy library (Annoy-inspired) to provide fast,
/// approximate nearest neighbor search with LMDB-backed persistence.
///
/// Currently only supports Euclidean distance due to arroy's type-level distance system.
pub struct AnnoyVectorStore {
    /// LMDB environment
    env: Arc<Mutex<heed::Env>>,
    /// Arroy database (Euclidean only for now)
    db_euclidean: Option<ArroyDatabase<Euclidean>>,
    db_cosine: Option<ArroyDatabase<Cosine>>,
    /// Index ID (for arroy)
    index_id: u16,
    /// Storage for document metadata (`item_id` -> metadata)
    metadata_store: Arc<Mutex<HashMap<u32, VectorMetadata>>>,
    /// Mapping from document ID to item ID
    id_to_item: Arc<Mutex<HashMap<String, u32>>>,
    /// Next item ID
    next_item_id: Arc<Mutex<u32>>,
    /// Number of trees to build
    n_trees: Option<usize>,
    /// Whether the index has been built
    is_built: Arc<Mutex<bool>>,
    /// Embeddings model
    embeddings: Arc<dyn Embeddings>,
    /// Vector dimensionality
    dimensions: usize,
    /// Temporary directory (if using temp storage)
    _temp_dir: Option<Arc<TempDir>>,
}

impl AnnoyVectorStore {
    /// Creates a new `AnnoyVectorStore` instance with temporary storage.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - The embeddings model to use for generating vectors
    /// * `dimensions` - The dimensionality of the vectors
    /// * `distance_metric` - Optional distance metric (defaults to Euclidean, supports Cosine)
    /// * `n_trees` - Optional number of trees to build (more trees = better accuracy, slower build)
    pub fn new(
        embeddings: Arc<dyn Embeddings>,
        dimensions: usize,
        distance_metric: Option<DistanceMetric>,
        n_trees: Option<usize>,
    ) -> Result<Self> {
        let temp_dir = TempDir::new()
            .map_err(|e| Error::other(format!("Failed to create temp directory: {e}")))?;

        let temp_dir = Arc::new(temp_dir);
        let mut store = Self::new_with_path(
            embeddings,
            dimensions,
            distance_metric,
            temp_dir.path(),
            n_trees,
            None, // Use default map size (10GB)
        )?;
        store._temp_dir = Some(temp_dir);
        Ok(store)
    }

    /// Creates a new `AnnoyVectorStore` instance with specified storage path.
    ///
    /// # Arguments
    ///
    /// * `embeddings` - The embeddings model to use for generating vectors
    /// * `dimensions` - The dimensionality of the vectors
    /// * `distance_metric` - Optional distance metric (defaults to Euclidean, supports Cosine)
    /// * `path` - Path to the LMDB database directory
    /// * `n_trees` - Optional number of trees to build (more trees = better accuracy, slower build)
    /// * `map_size_bytes` - Optional LMDB map size in bytes (default: 10GB). This is the maximum
    ///   database size. LMDB uses memory-mapped files, so this doesn't allocate memory upfront,
    ///   but does reserve virtual address space.
    #[allow(unsafe_code)] // Required: heed LMDB EnvOpenOptions::open() is inherently unsafe
    pub fn new_with_path(
        embeddings: Arc<dyn Embeddings>,
        dimensions: usize,
        distance_metric: Option<DistanceMetric>,
        path: &Path,
        n_trees: Option<usize>,
        map_size_bytes: Option<usize>,
    ) -> Result<Self> {
        let distance_metric = distance_metric.unwrap_or(DistanceMetric::Euclidean);

        // Validate distance metric
        match distance_metric {
            DistanceMetric::Euclidean | DistanceMetric::Cosine => {}
            _ => {
                return Err(Error::config(format!(
                    "Annoy (arroy) only supports Euclidean and Cosine distance metrics, got: {distance_metric:?}"
                )));
            }
        }

        // Create LMDB environment
        std::fs::create_dir_all(path)
            .map_err(|e| Error::other(format!("Failed to create database directory: {e}")))?;

        // Default: 10 GB map size (virtual address space, not allocated upfront)
        const DEFAULT_MAP_SIZE_BYTES: usize = 10 * 1024 * 1024 * 1024;
        let map_size = map_size_bytes.unwrap_or(DEFAULT_MAP_SIZE_BYTES);

        // SAFETY: EnvOpenOptions::open() is unsafe because LMDB requires:
        // 1. The directory must exist and be accessible (ensured by create_dir_all above)
        // 2. No other process should have the same DB open with different flags
        //    (this is the caller's responsibility - documented in AnnoyVectorStore)
        // 3. The environment must not be closed while transactions are active
        //    (ensured by AnnoyVectorStore's Drop impl and lifetime management)
        // 4. Memory-mapped I/O is used, so file corruption can cause undefined behavior
        //    (acceptable for a vector store; users should use backups for critical data)
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(10)
                .open(path)
                .map_err(|e| Error::other(format!("Failed to open LMDB environment: {e}")))?
        };

        // Create database based on distance metric
        let mut wtxn = env
            .write_txn()
            .map_err(|e| Error::other(format!("Failed to create write transaction: {e}")))?;

        let (db_euclidean, db_cosine) = match distance_metric {
            DistanceMetric::Euclidean => {
                let db: ArroyDatabase<Euclidean> = env
                    .create_database(&mut wtxn, Some("vectors"))
                    .map_err(|e| Error::other(format!("Failed to create database: {e}")))?;
                (Some(db), None)
            }
            DistanceMetric::Cosine => {
                let db: ArroyDatabase<Cosine> = env
                    .create_database(&mut wtxn, Some("vectors"))
                    .map_err(|e| Error::other(format!("Failed to create database: {e}")))?;
                (None, Some(db))
            }
            _ => {
                // Should not reach here due to validation above, but return error if it does
                return Err(Error::config(format!(
                    "Internal error: unexpected distance metric after validation: {distance_metric:?}"
                )));
            }
        };

        wtxn.commit()
            .map_err(|e| Error::other(format!("Failed to commit transaction: {e}")))?;

        Ok(Self {
            env: Arc::new(Mutex::new(env)),
            db_euclidean,
            db_cosine,
            index_id: 0,
            metadata_store: Arc::new(Mutex::new(HashMap::new())),
            id_to_item: Arc::new(Mutex::new(HashMap::new())),
            next_item_id: Arc::new(Mutex::new(0)),
            n_trees,
            is_built: Arc::new(Mutex::new(false)),
            embeddings,
            dimensions,
            _temp_dir: None,
        })
    }

    /// Builds the search trees (must be called before searching)
    fn build_index_if_needed(&self) -> Result<()> {
        let mut is_built = self.is_built.lock().unwrap_or_else(|e| e.into_inner());
        if *is_built {
            return Ok(());
        }

        let env = self.env.lock().unwrap_or_else(|e| e.into_inner());
        let mut wtxn = env
            .write_txn()
            .map_err(|e| Error::other(format!("Failed to create write transaction: {e}")))?;

        let mut rng = StdRng::from_entropy();

        if let Some(db) = self.db_euclidean {
            let writer = Writer::<Euclidean>::new(db, self.index_id, self.dimensions);
            let mut builder = writer.builder(&mut rng);
            if let Some(n_trees) = self.n_trees {
                for _ in 0..n_trees {
                    builder
                        .build(&mut wtxn)
                        .map_err(|e| Error::other(format!("Failed to build index: {e}")))?;
                }
            } else {
                builder
                    .build(&mut wtxn)
                    .map_err(|e| Error::other(format!("Failed to build index: {e}")))?;
            }
        }

        if let Some(db) = self.db_cosine {
            let writer = Writer::<Cosine>::new(db, self.index_id, self.dimensions);
            let mut builder = writer.builder(&mut rng);
            if let Some(n_trees) = self.n_trees {
                for _ in 0..n_trees {
                    builder
                        .build(&mut wtxn)
                        .map_err(|e| Error::other(format!("Failed to build index: {e}")))?;
                }
            } else {
                builder
                    .build(&mut wtxn)
                    .map_err(|e| Error::other(format!("Failed to build index: {e}")))?;
            }
        }

        wtxn.commit()
            .map_err(|e| Error::other(format!("Failed to commit transaction: {e}")))?;

        *is_built = true;
        Ok(())
    }

    /// Searches for nearest neighbors
    fn search_internal(&self, vector: &[f32], k: usize) -> Result<Vec<(u32, f32)>> {
        let env = self.env.lock().unwrap_or_else(|e| e.into_inner());
        let rtxn = env
            .read_txn()
            .map_err(|e| Error::other(format!("Failed to create read transaction: {e}")))?;

        let results = match self.db_euclidean {
            Some(db) => {
                let reader = Reader::<Euclidean>::open(&rtxn, self.index_id, db)
                    .map_err(|e| Error::other(format!("Failed to open reader: {e}")))?;
                reader
                    .nns(k)
                    .by_vector(&rtxn, vector)
                    .map_err(|e| Error::other(format!("Failed to search: {e}")))?
            }
            None => match self.db_cosine {
                Some(db) => {
                    let reader = Reader::<Cosine>::open(&rtxn, self.index_id, db)
                        .map_err(|e| Error::other(format!("Failed to open reader: {e}")))?;
                    reader
                        .nns(k)
                        .by_vector(&rtxn, vector)
                        .map_err(|e| Error::other(format!("Failed to search: {e}")))?
                }
                None => {
                    return Err(Error::other("No database initialized"));
                }
            },
        };

        Ok(results)
    }
}

#[async_trait]
impl VectorStore for AnnoyVectorStore {
    async fn add_texts(
        &mut self,
        texts: &[impl AsRef<str> + Send + Sync],
        metadatas: Option<&[HashMap<String, JsonValue>]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // Convert texts to strings
        let text_strs: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();

        // Generate embeddings using graph API
        let embeddings = embed(Arc::clone(&self.embeddings), &text_strs).await?;

        // SAFETY (M-193): Lock ordering fix for deadlock prevention.
        // Previous code held `env` lock while acquiring `is_built`, but `build_index_if_needed`
        // acquires `is_built` then `env`. This AB-BA pattern can cause deadlock.
        // Fix: Release `env` before acquiring `is_built` by scoping the transaction work.
        let result_ids = {
            let env = self.env.lock().unwrap_or_else(|e| e.into_inner());
            let mut wtxn = env
                .write_txn()
                .map_err(|e| Error::other(format!("Failed to create write transaction: {e}")))?;

            let mut result_ids = Vec::with_capacity(text_strs.len());
            let mut next_item_id = self.next_item_id.lock().unwrap_or_else(|e| e.into_inner());
            let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
            let mut id_to_item = self.id_to_item.lock().unwrap_or_else(|e| e.into_inner());

            for (i, (text, embedding)) in text_strs.iter().zip(embeddings.iter()).enumerate() {
                let id = if let Some(provided_ids) = ids {
                    if i < provided_ids.len() {
                        provided_ids[i].clone()
                    } else {
                        Uuid::new_v4().to_string()
                    }
                } else {
                    Uuid::new_v4().to_string()
                };

                let item_id = *next_item_id;
                *next_item_id += 1;

                // Add vector to index
                if let Some(db) = self.db_euclidean {
                    let writer = Writer::<Euclidean>::new(db, self.index_id, self.dimensions);
                    writer
                        .add_item(&mut wtxn, item_id, embedding)
                        .map_err(|e| Error::other(format!("Failed to add item: {e}")))?;
                }

                if let Some(db) = self.db_cosine {
                    let writer = Writer::<Cosine>::new(db, self.index_id, self.dimensions);
                    writer
                        .add_item(&mut wtxn, item_id, embedding)
                        .map_err(|e| Error::other(format!("Failed to add item: {e}")))?;
                }

                // Store metadata
                let metadata = if let Some(metas) = metadatas {
                    if i < metas.len() {
                        metas[i].clone()
                    } else {
                        HashMap::new()
                    }
                } else {
                    HashMap::new()
                };

                let vec_metadata = VectorMetadata {
                    id: id.clone(),
                    text: text.clone(),
                    metadata,
                };
                metadata_store.insert(item_id, vec_metadata);
                id_to_item.insert(id.clone(), item_id);

                result_ids.push(id);
            }

            wtxn.commit()
                .map_err(|e| Error::other(format!("Failed to commit transaction: {e}")))?;

            result_ids
            // `env` lock released here when scope ends
        };

        // Mark as not built since we added new items.
        // SAFETY: Now safe to acquire `is_built` - `env` lock is released above.
        let mut is_built = self.is_built.lock().unwrap_or_else(|e| e.into_inner());
        *is_built = false;

        Ok(result_ids)
    }

    async fn _similarity_search(
        &self,
        query: &str,
        k: usize,
        _filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self.similarity_search_with_score(query, k, None).await?;
        Ok(results.into_iter().map(|(doc, _score)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        _filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Generate query embedding using graph API
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query).await?;

        // Build index if not built
        self.build_index_if_needed()?;

        // Search
        let results = self.search_internal(&query_embedding, k)?;

        // Convert results to documents
        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut documents = Vec::new();
        for (item_id, distance) in results {
            if let Some(metadata) = metadata_store.get(&item_id) {
                let doc = Document {
                    id: Some(metadata.id.clone()),
                    page_content: metadata.text.clone(),
                    metadata: metadata.metadata.clone(),
                };
                documents.push((doc, distance));
            }
        }

        Ok(documents)
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        _filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self
            .similarity_search_by_vector_with_score(embedding, k, None)
            .await?;
        Ok(results.into_iter().map(|(doc, _score)| doc).collect())
    }

    async fn similarity_search_by_vector_with_score(
        &self,
        embedding: &[f32],
        k: usize,
        _filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Build index if not built
        self.build_index_if_needed()?;

        // Search
        let results = self.search_internal(embedding, k)?;

        // Convert results to documents
        let metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
        let mut documents = Vec::new();
        for (item_id, distance) in results {
            if let Some(metadata) = metadata_store.get(&item_id) {
                let doc = Document {
                    id: Some(metadata.id.clone()),
                    page_content: metadata.text.clone(),
                    metadata: metadata.metadata.clone(),
                };
                documents.push((doc, distance));
            }
        }

        Ok(documents)
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool> {
        if let Some(ids) = ids {
            let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
            let mut id_to_item = self.id_to_item.lock().unwrap_or_else(|e| e.into_inner());

            for id in ids {
                if let Some(&item_id) = id_to_item.get(id) {
                    metadata_store.remove(&item_id);
                    id_to_item.remove(id);
                }
            }
            Ok(true)
        } else {
            // Delete all
            let mut metadata_store = self.metadata_store.lock().unwrap_or_else(|e| e.into_inner());
            let mut id_to_item = self.id_to_item.lock().unwrap_or_else(|e| e.into_inner());
            metadata_store.clear();
            id_to_item.clear();
            Ok(true)
        }
    }
}

#[async_trait]
impl Retriever for AnnoyVectorStore {
    async fn _get_relevant_documents(
        &self,
        query: &str,
        _config: Option<&dashflow::core::config::RunnableConfig>,
    ) -> Result<Vec<Document>> {
        // Default to k=4 for retriever
        self._similarity_search(query, 4, None).await
    }
}

#[async_trait]
impl DocumentIndex for AnnoyVectorStore {
    async fn upsert(
        &self,
        _documents: &[Document],
    ) -> std::result::Result<UpsertResponse, Box<dyn std::error::Error + Send + Sync>> {
        // DocumentIndex requires &self, but we need &mut self for add_texts
        // This is a limitation - we can't implement DocumentIndex properly without interior mutability
        Err("Annoy VectorStore requires mutable access for upsert - use add_texts instead".into())
    }

    async fn delete(
        &self,
        _ids: Option<&[String]>,
    ) -> std::result::Result<DeleteResponse, Box<dyn std::error::Error + Send + Sync>> {
        // DocumentIndex requires &self, but we need &mut self for delete
        Err("Annoy VectorStore requires mutable access for delete - use VectorStore::delete instead".into())
    }

    async fn get(
        &self,
        _ids: &[String],
    ) -> std::result::Result<Vec<Document>, Box<dyn std::error::Error + Send + Sync>> {
        // Not efficiently supported by Arroy
        Err("Get by ID not supported by Annoy".into())
    }
}
