// Allow clippy warnings for this module
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::clone_on_ref_ptr)]
#![allow(clippy::needless_pass_by_value, clippy::redundant_clone)]

//! `LanceDB` vector store implementation for `DashFlow` Rust.

use std::collections::HashMap;
use std::sync::Arc;

use futures::TryStreamExt;

use arrow_array::{Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::{Error, Result};
use dashflow::{embed, embed_query};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

/// `LanceDB` vector database implementation.
///
/// This implementation uses `LanceDB`'s native vector search capabilities for efficient
/// similarity search. `LanceDB` is a serverless, low-latency vector database built on
/// Lance columnar format, designed for AI applications.
///
/// # Features
///
/// - 100x faster random access than Parquet
/// - Zero-copy operations
/// - Automatic versioning
/// - Support for multi-modal data (vectors, text, images)
/// - SQL-like querying
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_lancedb::LanceDBVectorStore;
/// use dashflow::core::embeddings::Embeddings;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # struct MockEmbeddings;
/// # #[async_trait::async_trait]
/// # impl Embeddings for MockEmbeddings {
/// #     async fn embed_documents(&self, texts: &[String]) -> dashflow::core::Result<Vec<Vec<f32>>> {
/// #         Ok(vec![vec![0.0; 384]; texts.len()])
/// #     }
/// #     async fn embed_query(&self, text: &str) -> dashflow::core::Result<Vec<f32>> {
/// #         Ok(vec![0.0; 384])
/// #     }
/// # }
/// let embeddings: Arc<dyn Embeddings> = Arc::new(MockEmbeddings);
///
/// let mut store = LanceDBVectorStore::new(
///     "data/lancedb",
///     "documents",
///     embeddings,
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub struct LanceDBVectorStore {
    db: Connection,
    table_name: String,
    table: Option<Table>,
    embeddings: Arc<dyn Embeddings>,
    distance_metric: DistanceMetric,
    vector_dimension: Option<usize>,
}

impl LanceDBVectorStore {
    /// Creates a new `LanceDBVectorStore` instance.
    ///
    /// # Arguments
    ///
    /// * `uri` - Database URI (local path, S3 path, or Lance Cloud URL)
    ///   - Local: "data/lancedb" or "/path/to/db"
    ///   - S3: "<s3://bucket/path/to/db>"
    ///   - Lance Cloud: "<db://dbname>"
    /// * `table_name` - Name of the table to store documents in
    /// * `embeddings` - Embeddings model to use
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Connection to database fails
    /// - Table creation fails
    pub async fn new(uri: &str, table_name: &str, embeddings: Arc<dyn Embeddings>) -> Result<Self> {
        let db = lancedb::connect(uri)
            .execute()
            .await
            .map_err(|e| Error::api(format!("Failed to connect to LanceDB: {e}")))?;

        let mut store = Self {
            db,
            table_name: table_name.to_string(),
            table: None,
            embeddings,
            distance_metric: DistanceMetric::Cosine,
            vector_dimension: None,
        };

        // Try to open existing table
        if let Ok(table) = store.db.open_table(&store.table_name).execute().await {
            store.table = Some(table);
        }

        Ok(store)
    }

    /// Sets the distance metric for similarity search.
    #[must_use]
    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    /// Creates the table schema with the given vector dimension.
    async fn ensure_table(&mut self, vector_dim: usize) -> Result<()> {
        if self.table.is_some() {
            return Ok(());
        }

        // Create schema for the table
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("metadata", DataType::Utf8, true), // JSON as string
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_dim as i32,
                ),
                false,
            ),
        ]));

        // Create empty batch to initialize table
        let empty_batch = RecordBatch::new_empty(schema.clone());
        let batches = vec![empty_batch];
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema.clone());

        let table = self
            .db
            .create_table(&self.table_name, Box::new(reader))
            .execute()
            .await
            .map_err(|e| Error::api(format!("Failed to create table: {e}")))?;

        self.table = Some(table);
        self.vector_dimension = Some(vector_dim);

        Ok(())
    }

    /// Gets the table, ensuring it exists.
    fn get_table(&self) -> Result<&Table> {
        self.table
            .as_ref()
            .ok_or_else(|| Error::api("Table not initialized. Add documents first."))
    }

    /// Creates a `RecordBatch` from vectors and metadata.
    fn create_record_batch(
        &self,
        ids: &[String],
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[HashMap<String, JsonValue>],
        vector_dim: usize,
    ) -> Result<RecordBatch> {
        // Create ID array
        let id_array = StringArray::from(ids.to_vec());

        // Create text array
        let text_array = StringArray::from(texts.to_vec());

        // Create metadata array (JSON serialized as strings)
        let metadata_strings: Vec<String> = metadatas
            .iter()
            .map(|m| serde_json::to_string(m).unwrap_or_else(|_| "{}".to_string()))
            .collect();
        let metadata_array = StringArray::from(metadata_strings);

        // Create vector array (FixedSizeList of Float32)
        use arrow_array::types::Float32Type;
        use arrow_array::FixedSizeListArray;

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)))),
            vector_dim as i32,
        );

        // Create schema
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("metadata", DataType::Utf8, true),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_dim as i32,
                ),
                false,
            ),
        ]));

        // Create RecordBatch
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(text_array),
                Arc::new(metadata_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| Error::api(format!("Failed to create record batch: {e}")))
    }
}

#[async_trait]
impl VectorStore for LanceDBVectorStore {
    fn embeddings(&self) -> Option<Arc<dyn Embeddings>> {
        Some(self.embeddings.clone())
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
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Validate inputs
        if let Some(meta) = metadatas {
            if meta.len() != texts.len() {
                return Err(Error::invalid_input(format!(
                    "Metadatas length ({}) doesn't match texts length ({})",
                    meta.len(),
                    texts.len()
                )));
            }
        }

        if let Some(id_list) = ids {
            if id_list.len() != texts.len() {
                return Err(Error::invalid_input(format!(
                    "IDs length ({}) doesn't match texts length ({})",
                    id_list.len(),
                    texts.len()
                )));
            }
        }

        // Generate embeddings using graph API
        let text_strs: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        let vectors = embed(Arc::clone(&self.embeddings), &text_strs).await?;

        if vectors.is_empty() {
            return Err(Error::api("No embeddings generated"));
        }

        let vector_dim = vectors[0].len();

        // Ensure table exists with correct dimension
        self.ensure_table(vector_dim).await?;

        // Generate IDs if not provided
        let generated_ids: Vec<String>;
        let id_list = if let Some(ids) = ids {
            ids
        } else {
            generated_ids = (0..texts.len())
                .map(|_| Uuid::new_v4().to_string())
                .collect();
            &generated_ids
        };

        // Prepare metadata
        let metadata_list: Vec<HashMap<String, JsonValue>> = if let Some(meta) = metadatas {
            meta.to_vec()
        } else {
            vec![HashMap::new(); texts.len()]
        };

        // Create record batch
        let batch =
            self.create_record_batch(id_list, &text_strs, &vectors, &metadata_list, vector_dim)?;

        // Add to table
        let table = self.get_table()?;
        let schema = batch.schema();
        let batches = vec![Ok(batch)];
        let reader = RecordBatchIterator::new(batches.into_iter(), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| Error::api(format!("Failed to add records: {e}")))?;

        Ok(id_list.to_vec())
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool> {
        let table = self.get_table()?;

        if let Some(id_list) = ids {
            if id_list.is_empty() {
                return Ok(true);
            }

            // Build delete predicate: id IN ('id1', 'id2', ...)
            let id_list_str = id_list
                .iter()
                .map(|id| format!("'{}'", id.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            let predicate = format!("id IN ({id_list_str})");

            table
                .delete(&predicate)
                .await
                .map_err(|e| Error::api(format!("Failed to delete records: {e}")))?;

            Ok(true)
        } else {
            // Delete all - drop and recreate table
            self.db
                .drop_table(&self.table_name, &[])
                .await
                .map_err(|e| Error::api(format!("Failed to drop table: {e}")))?;

            self.table = None;
            self.vector_dimension = None;

            Ok(true)
        }
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.get_table()?;

        // Execute query to get all records (LanceDB filter API has issues)
        let results = table
            .query()
            .execute()
            .await
            .map_err(|e| Error::api(format!("Failed to execute query: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| Error::api(format!("Failed to collect results: {e}")))?;

        // Create a set of requested IDs for fast lookup
        let id_set: std::collections::HashSet<&str> =
            ids.iter().map(std::string::String::as_str).collect();
        let mut documents = Vec::new();

        for batch in batches {
            let id_array = batch
                .column_by_name("id")
                .ok_or_else(|| Error::api("Missing id column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid id column type"))?;

            let text_array = batch
                .column_by_name("text")
                .ok_or_else(|| Error::api("Missing text column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid text column type"))?;

            let metadata_array = batch
                .column_by_name("metadata")
                .ok_or_else(|| Error::api("Missing metadata column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid metadata column type"))?;

            for i in 0..batch.num_rows() {
                let id = id_array.value(i).to_string();

                // Filter: only include documents with matching IDs
                if !id_set.contains(id.as_str()) {
                    continue;
                }

                let text = text_array.value(i).to_string();
                let metadata_str = metadata_array.value(i);
                let metadata: HashMap<String, JsonValue> =
                    serde_json::from_str(metadata_str).unwrap_or_else(|e| {
                        warn!(
                            document_id = %id,
                            error = %e,
                            "Failed to parse metadata JSON, using empty metadata"
                        );
                        HashMap::new()
                    });

                documents.push(Document {
                    id: Some(id),
                    page_content: text,
                    metadata,
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
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        let query_vector = embed_query(Arc::clone(&self.embeddings), query).await?;
        self.similarity_search_by_vector_with_score(&query_vector, k, filter)
            .await
    }

    async fn similarity_search_by_vector(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self
            .similarity_search_by_vector_with_score(query, k, filter)
            .await?;
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_by_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        _filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        let table = self.get_table()?;

        // Perform vector search
        let results = table
            .query()
            .nearest_to(query)
            .map_err(|e| Error::api(format!("Failed to build nearest query: {e}")))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| Error::api(format!("Failed to execute search: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| Error::api(format!("Failed to collect results: {e}")))?;

        let mut documents = Vec::new();

        for batch in batches {
            let id_array = batch
                .column_by_name("id")
                .ok_or_else(|| Error::api("Missing id column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid id column type"))?;

            let text_array = batch
                .column_by_name("text")
                .ok_or_else(|| Error::api("Missing text column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid text column type"))?;

            let metadata_array = batch
                .column_by_name("metadata")
                .ok_or_else(|| Error::api("Missing metadata column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::api("Invalid metadata column type"))?;

            // LanceDB includes _distance column in search results
            let distance_array = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let id = id_array.value(i).to_string();
                let text = text_array.value(i).to_string();
                let metadata_str = metadata_array.value(i);
                let metadata: HashMap<String, JsonValue> =
                    serde_json::from_str(metadata_str).unwrap_or_else(|e| {
                        warn!(
                            document_id = %id,
                            error = %e,
                            "Failed to parse metadata JSON in similarity search, using empty metadata"
                        );
                        HashMap::new()
                    });

                // Convert distance to similarity score [0, 1]
                let score = if let Some(dist_arr) = distance_array {
                    let distance = dist_arr.value(i);
                    // LanceDB returns distance, convert to similarity
                    // For cosine: similarity = 1 - distance
                    // For L2: similarity = 1 / (1 + distance)
                    match self.distance_metric {
                        DistanceMetric::Cosine => 1.0 - distance,
                        DistanceMetric::Euclidean => 1.0 / (1.0 + distance),
                        DistanceMetric::DotProduct => distance, // dot product is similarity already
                        DistanceMetric::MaxInnerProduct => distance,
                    }
                } else {
                    1.0 // Default if no distance provided
                };

                documents.push((
                    Document {
                        id: Some(id),
                        page_content: text,
                        metadata,
                    },
                    score,
                ));
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
        // Get query embedding using graph API
        let query_vector = embed_query(Arc::clone(&self.embeddings), query).await?;

        // Fetch more candidates than needed
        let candidates = self
            .similarity_search_by_vector_with_score(&query_vector, fetch_k, filter)
            .await?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Extract vectors from candidates (we'd need to store them)
        // For now, use the simpler greedy MMR approach based on scores
        let mut selected = Vec::new();
        let mut remaining: Vec<_> = candidates.into_iter().collect();

        // Select first document (highest similarity)
        if let Some((doc, _)) = remaining.first() {
            selected.push(doc.clone());
            remaining.remove(0);
        }

        // Iteratively select documents that maximize MMR
        while selected.len() < k && !remaining.is_empty() {
            let mut best_idx = 0;
            let mut best_score = f32::MIN;

            for (idx, (_doc, query_sim)) in remaining.iter().enumerate() {
                // Calculate MMR score
                // MMR = lambda * sim(query, doc) - (1-lambda) * max(sim(selected, doc))
                // Without vectors, we approximate using query similarity
                let mmr_score = lambda_mult * query_sim;

                if mmr_score > best_score {
                    best_score = mmr_score;
                    best_idx = idx;
                }
            }

            let (doc, _) = remaining.remove(best_idx);
            selected.push(doc);
        }

        Ok(selected)
    }
}
