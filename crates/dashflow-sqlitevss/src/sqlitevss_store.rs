use async_trait::async_trait;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::Error;
use dashflow::{embed, embed_query};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// `SQLite` VSS Vector Store.
///
/// Provides vector similarity search using `SQLite` with the sqlite-vss extension.
/// Suitable for local/embedded applications requiring persistent vector storage.
pub struct SQLiteVSSStore {
    /// Database connection (wrapped in Mutex for interior mutability)
    conn: Arc<Mutex<Connection>>,
    /// Embeddings function
    embedding: Arc<dyn Embeddings>,
    /// Vector dimension
    dimensions: usize,
    /// Table name
    table_name: String,
    /// Distance metric
    metric: DistanceMetric,
}

impl SQLiteVSSStore {
    /// Create a new `SQLite` VSS vector store.
    ///
    /// # Arguments
    ///
    /// * `embedding` - Embeddings function to use
    /// * `db_path` - Path to `SQLite` database file (use ":memory:" for in-memory)
    /// * `dimensions` - Dimensionality of vectors
    /// * `metric` - Optional distance metric (defaults to Cosine)
    ///
    /// # Returns
    ///
    /// A new `SQLite` VSS store instance
    ///
    /// # Errors
    ///
    /// Returns error if database connection or initialization fails
    pub fn new(
        embedding: Arc<dyn Embeddings>,
        db_path: &str,
        dimensions: usize,
        metric: Option<DistanceMetric>,
    ) -> Result<Self, Error> {
        let conn = Connection::open(db_path)
            .map_err(|e| Error::other(format!("Failed to open SQLite database: {e}")))?;

        // Note: sqlite-vss extension loading is handled by the sqlite-vss crate
        // when using the download-libs feature. The extension is automatically
        // available at build time and loaded when creating VSS virtual tables.

        let table_name = "dashflow_vectors".to_string();
        let metric = metric.unwrap_or(DistanceMetric::Cosine);

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            embedding,
            dimensions,
            table_name,
            metric,
        };

        // Initialize schema
        store.init_schema()?;

        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), Error> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::other(format!("Failed to acquire lock: {e}")))?;

        // Create main table for documents
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    text TEXT NOT NULL,
                    metadata TEXT
                )",
                self.table_name
            ),
            [],
        )
        .map_err(|e| Error::other(format!("Failed to create table: {e}")))?;

        // Create virtual table for vectors using vss0
        // vss0 is the virtual table module provided by sqlite-vss
        conn.execute(
            &format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS {}_vss USING vss0(
                    embedding({})
                )",
                self.table_name, self.dimensions
            ),
            [],
        )
        .map_err(|e| Error::other(format!("Failed to create VSS table: {e}")))?;

        Ok(())
    }

    /// Convert distance to relevance score [0, 1].
    fn distance_to_relevance(&self, distance: f32) -> f32 {
        self.metric.distance_to_relevance(distance)
    }

    /// Match document against metadata filter.
    fn matches_filter(
        metadata: &HashMap<String, Value>,
        filter: Option<&HashMap<String, Value>>,
    ) -> bool {
        if let Some(filter) = filter {
            for (key, value) in filter {
                if metadata.get(key) != Some(value) {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl VectorStore for SQLiteVSSStore {
    fn embeddings(&self) -> Option<Arc<dyn Embeddings>> {
        Some(Arc::clone(&self.embedding))
    }

    fn distance_metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn add_texts(
        &mut self,
        texts: &[impl AsRef<str> + Send + Sync],
        metadatas: Option<&[HashMap<String, Value>]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>, Error> {
        // Validate inputs
        if let Some(metadatas) = metadatas {
            if metadatas.len() != texts.len() {
                return Err(Error::InvalidInput(
                    "metadatas length must match texts length".to_string(),
                ));
            }
        }
        if let Some(ids) = ids {
            if ids.len() != texts.len() {
                return Err(Error::InvalidInput(
                    "ids length must match texts length".to_string(),
                ));
            }
        }

        // Generate IDs if not provided
        let generated_ids: Vec<String>;
        let ids_ref = if let Some(ids) = ids {
            ids
        } else {
            generated_ids = (0..texts.len())
                .map(|_| Uuid::new_v4().to_string())
                .collect();
            &generated_ids
        };

        // Embed all texts using graph API
        let text_strings: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        let embeddings = embed(Arc::clone(&self.embedding), &text_strings).await?;

        // Verify embedding dimensions
        if !embeddings.is_empty() && embeddings[0].len() != self.dimensions {
            return Err(Error::InvalidInput(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embeddings[0].len()
            )));
        }

        // Insert into database
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::other(format!("Failed to acquire lock: {e}")))?;

        for (idx, ((id, text), embedding)) in ids_ref
            .iter()
            .zip(text_strings.iter())
            .zip(embeddings.iter())
            .enumerate()
        {
            let metadata_json = if let Some(metadatas) = metadatas {
                serde_json::to_string(&metadatas[idx])
                    .map_err(|e| Error::other(format!("Failed to serialize metadata: {e}")))?
            } else {
                "{}".to_string()
            };

            // Insert document
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (id, text, metadata) VALUES (?1, ?2, ?3)",
                    self.table_name
                ),
                params![id, text, metadata_json],
            )
            .map_err(|e| Error::other(format!("Failed to insert document: {e}")))?;

            // Insert vector
            // vss0 expects vectors as JSON arrays or blob
            let embedding_blob: Vec<u8> = embedding.iter().flat_map(|f| f.to_le_bytes()).collect();

            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {}_vss (rowid, embedding) VALUES (
                        (SELECT rowid FROM {} WHERE id = ?1),
                        ?2
                    )",
                    self.table_name, self.table_name
                ),
                params![id, embedding_blob],
            )
            .map_err(|e| Error::other(format!("Failed to insert vector: {e}")))?;
        }

        Ok(ids_ref.to_vec())
    }

    async fn _similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, Value>>,
    ) -> Result<Vec<Document>, Error> {
        let results = self.similarity_search_with_score(query, k, filter).await?;
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, Value>>,
    ) -> Result<Vec<(Document, f32)>, Error> {
        // Embed query using graph API
        let embedding = embed_query(Arc::clone(&self.embedding), query).await?;
        self.similarity_search_by_vector_with_score(&embedding, k, filter)
            .await
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, Value>>,
    ) -> Result<Vec<Document>, Error> {
        let results = self
            .similarity_search_by_vector_with_score(embedding, k, filter)
            .await?;
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }

    async fn similarity_search_by_vector_with_score(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, Value>>,
    ) -> Result<Vec<(Document, f32)>, Error> {
        if embedding.len() != self.dimensions {
            return Err(Error::InvalidInput(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::other(format!("Failed to acquire lock: {e}")))?;

        // Convert embedding to blob for query
        let embedding_blob: Vec<u8> = embedding.iter().flat_map(|f| f.to_le_bytes()).collect();

        // Query using vss0's knn search
        // The exact SQL syntax depends on sqlite-vss version, but typically:
        // SELECT ... FROM table WHERE rowid IN (SELECT rowid FROM table_vss WHERE vss_search(embedding, ?))
        let mut stmt = conn
            .prepare(&format!(
                "SELECT d.id, d.text, d.metadata, vss.distance
                 FROM {} d
                 INNER JOIN {}_vss vss ON d.rowid = vss.rowid
                 WHERE vss_search(vss.embedding, ?)
                 ORDER BY vss.distance
                 LIMIT ?",
                self.table_name, self.table_name
            ))
            .map_err(|e| Error::other(format!("Failed to prepare statement: {e}")))?;

        let rows = stmt
            .query_map(params![embedding_blob, k], |row| {
                Ok((
                    row.get::<_, String>(0)?, // id
                    row.get::<_, String>(1)?, // text
                    row.get::<_, String>(2)?, // metadata
                    row.get::<_, f32>(3)?,    // distance
                ))
            })
            .map_err(|e| Error::other(format!("Failed to execute query: {e}")))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, text, metadata_json, distance) =
                row.map_err(|e| Error::other(format!("Failed to read row: {e}")))?;

            let metadata: HashMap<String, Value> =
                serde_json::from_str(&metadata_json).unwrap_or_else(|e| {
                    warn!(
                        document_id = %id,
                        error = %e,
                        "Failed to parse metadata JSON, using empty metadata"
                    );
                    HashMap::new()
                });

            // Apply filter
            if !Self::matches_filter(&metadata, filter) {
                continue;
            }

            let score = self.distance_to_relevance(distance);

            results.push((
                Document {
                    id: Some(id),
                    page_content: text,
                    metadata,
                },
                score,
            ));
        }

        Ok(results)
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool, Error> {
        let Some(ids) = ids else {
            return Ok(false);
        };
        if ids.is_empty() {
            return Ok(false);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::other(format!("Failed to acquire lock: {e}")))?;

        for id in ids {
            // Delete from VSS table first
            conn.execute(
                &format!(
                    "DELETE FROM {}_vss WHERE rowid = (SELECT rowid FROM {} WHERE id = ?1)",
                    self.table_name, self.table_name
                ),
                params![id],
            )
            .map_err(|e| Error::other(format!("Failed to delete vector: {e}")))?;

            // Delete from main table
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", self.table_name),
                params![id],
            )
            .map_err(|e| Error::other(format!("Failed to delete document: {e}")))?;
        }

        Ok(true)
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, Error> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::other(format!("Failed to acquire lock: {e}")))?;

        let mut results = Vec::new();
        for id in ids {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT id, text, metadata FROM {} WHERE id = ?1",
                    self.table_name
                ))
                .map_err(|e| Error::other(format!("Failed to prepare statement: {e}")))?;

            let mut rows = stmt
                .query(params![id])
                .map_err(|e| Error::other(format!("Failed to execute query: {e}")))?;

            if let Some(row) = rows
                .next()
                .map_err(|e| Error::other(format!("Failed to read row: {e}")))?
            {
                let id = row
                    .get::<_, String>(0)
                    .map_err(|e| Error::other(format!("Failed to read id: {e}")))?;
                let text = row
                    .get::<_, String>(1)
                    .map_err(|e| Error::other(format!("Failed to read text: {e}")))?;
                let metadata_json = row
                    .get::<_, String>(2)
                    .map_err(|e| Error::other(format!("Failed to read metadata: {e}")))?;

                let metadata: HashMap<String, Value> =
                    serde_json::from_str(&metadata_json).unwrap_or_else(|e| {
                        warn!(
                            document_id = %id,
                            error = %e,
                            "Failed to parse metadata JSON in get_by_ids, using empty metadata"
                        );
                        HashMap::new()
                    });

                results.push(Document {
                    id: Some(id),
                    page_content: text,
                    metadata,
                });
            }
        }

        Ok(results)
    }
}
