//! `OpenSearch` vector store implementation for `DashFlow` Rust.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::vector_stores::{DistanceMetric, VectorStore};
use dashflow::core::{Error, Result};
use dashflow::{embed, embed_query};
use opensearch::{
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, DeleteByQueryParts, GetParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value as JsonValue};

/// `OpenSearch` vector store implementation.
///
/// `OpenSearch` is an open-source fork of Elasticsearch maintained by AWS.
/// It provides vector search capabilities through the k-NN plugin which
/// supports ANN (Approximate Nearest Neighbor) search using various algorithms
/// including HNSW, IVF, and more.
///
/// # Features
///
/// - Vector similarity search with k-NN plugin
/// - Multiple distance metrics (cosine, L2, dot product, inner product)
/// - Metadata filtering
/// - Bulk document operations
/// - Automatic index management
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use dashflow_opensearch::OpenSearchVectorStore;
/// use dashflow::core::embeddings::MockEmbeddings;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let embeddings = Arc::new(MockEmbeddings::new(1536));
///     let store = OpenSearchVectorStore::new(
///         "my_vectors",
///         embeddings,
///         "https://localhost:9200",
///     ).await?;
///
///     Ok(())
/// }
/// ```
pub struct OpenSearchVectorStore {
    client: OpenSearch,
    index_name: String,
    embeddings: Arc<dyn Embeddings>,
    distance_metric: DistanceMetric,
}

impl OpenSearchVectorStore {
    /// Creates a new `OpenSearchVectorStore` instance.
    ///
    /// # Arguments
    ///
    /// * `index_name` - Name of the `OpenSearch` index
    /// * `embeddings` - Embeddings model to use
    /// * `url` - `OpenSearch` connection URL
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Connection to `OpenSearch` fails
    /// - Index creation fails
    pub async fn new(index_name: &str, embeddings: Arc<dyn Embeddings>, url: &str) -> Result<Self> {
        // Parse URL
        let url = url
            .parse()
            .map_err(|e| Error::config(format!("Invalid OpenSearch URL '{url}': {e}")))?;

        // Create connection pool
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool)
            .build()
            .map_err(|e| Error::config(format!("Failed to build transport: {e}")))?;

        let client = OpenSearch::new(transport);

        let store = Self {
            client,
            index_name: index_name.to_string(),
            embeddings,
            distance_metric: DistanceMetric::Cosine,
        };

        // Ensure index exists
        store.ensure_index().await?;

        Ok(store)
    }

    /// Ensures the `OpenSearch` index exists with proper vector field mapping.
    async fn ensure_index(&self) -> Result<()> {
        // Check if index exists
        let exists_response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&self.index_name]))
            .send()
            .await
            .map_err(|e| Error::other(format!("Failed to check index existence: {e}")))?;

        if exists_response.status_code().is_success() {
            // Index already exists
            return Ok(());
        }

        // Create index with k-NN vector mapping
        // OpenSearch uses k-NN plugin for vector search
        let create_response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(json!({
                "settings": {
                    "index": {
                        "knn": true  // Enable k-NN plugin for this index
                    }
                },
                "mappings": {
                    "properties": {
                        "text": {
                            "type": "text"
                        },
                        "vector": {
                            "type": "knn_vector",
                            "dimension": 1536,  // Default for OpenAI embeddings
                            "method": {
                                "name": "hnsw",
                                "space_type": self.distance_metric_to_os_space_type(),
                                "engine": "nmslib",
                                "parameters": {
                                    "ef_construction": 128,
                                    "m": 24
                                }
                            }
                        }
                    }
                }
            }))
            .send()
            .await
            .map_err(|e| Error::other(format!("Failed to create index: {e}")))?;

        if !create_response.status_code().is_success() {
            let error_text = create_response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::other(format!(
                "Failed to create index: {error_text}"
            )));
        }

        Ok(())
    }

    /// Converts our `DistanceMetric` to `OpenSearch` k-NN `space_type`.
    fn distance_metric_to_os_space_type(&self) -> &'static str {
        match self.distance_metric {
            DistanceMetric::Cosine => "cosinesimil",
            DistanceMetric::Euclidean => "l2",
            DistanceMetric::DotProduct | DistanceMetric::MaxInnerProduct => "innerproduct",
        }
    }

    /// Builds an `OpenSearch` filter query from metadata filters.
    fn build_filter_query(&self, filter: &HashMap<String, JsonValue>) -> Option<JsonValue> {
        if filter.is_empty() {
            return None;
        }

        let conditions: Vec<JsonValue> = filter
            .iter()
            .map(|(k, v)| {
                json!({
                    "term": {
                        k: v
                    }
                })
            })
            .collect();

        if conditions.len() == 1 {
            Some(conditions[0].clone())
        } else {
            Some(json!({
                "bool": {
                    "must": conditions
                }
            }))
        }
    }
}

#[async_trait]
impl VectorStore for OpenSearchVectorStore {
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

        // Generate embeddings
        let embeddings_vec = embed(Arc::clone(&self.embeddings), &text_strings)
            .await
            .map_err(|e| Error::other(format!("Embedding failed: {e}")))?;

        // Generate IDs if not provided
        let doc_ids: Vec<String> = if let Some(ids) = ids {
            ids.to_vec()
        } else {
            (0..text_count)
                .map(|_| uuid::Uuid::new_v4().to_string())
                .collect()
        };

        // Build bulk request body
        let mut body: Vec<JsonBody<_>> = Vec::with_capacity(text_count * 2);

        for (i, text) in text_strings.iter().enumerate() {
            // Index operation
            body.push(
                json!({
                    "index": {
                        "_id": doc_ids[i]
                    }
                })
                .into(),
            );

            // Document source
            let mut doc = json!({
                "text": text,
                "vector": embeddings_vec[i],
            });

            // Add metadata if provided
            if let Some(metadatas) = metadatas {
                if let Some(obj) = doc.as_object_mut() {
                    for (k, v) in &metadatas[i] {
                        obj.insert(k.clone(), v.clone());
                    }
                }
            }

            body.push(doc.into());
        }

        // Execute bulk request
        let bulk_response = self
            .client
            .bulk(BulkParts::Index(&self.index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::other(format!("OpenSearch bulk request failed: {e}")))?;

        if !bulk_response.status_code().is_success() {
            let error_text = bulk_response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::other(format!(
                "OpenSearch bulk operation failed: {error_text}"
            )));
        }

        // SAFETY: Refresh failure is non-critical - documents are already persisted
        // and will become searchable on the next automatic refresh cycle.
        // Ignoring this error prevents blocking successful writes on transient
        // refresh failures while maintaining data integrity.
        let _ = self
            .client
            .indices()
            .refresh(opensearch::indices::IndicesRefreshParts::Index(&[
                &self.index_name
            ]))
            .send()
            .await;

        Ok(doc_ids)
    }

    async fn delete(&mut self, ids: Option<&[String]>) -> Result<bool> {
        if let Some(ids) = ids {
            if ids.is_empty() {
                return Ok(true);
            }

            // Delete specific documents by ID
            let query = json!({
                "query": {
                    "ids": {
                        "values": ids
                    }
                }
            });

            let delete_response = self
                .client
                .delete_by_query(DeleteByQueryParts::Index(&[&self.index_name]))
                .body(query)
                .send()
                .await
                .map_err(|e| Error::other(format!("OpenSearch delete failed: {e}")))?;

            if !delete_response.status_code().is_success() {
                let error_text = delete_response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Error::other(format!(
                    "OpenSearch delete failed: {error_text}"
                )));
            }
        } else {
            // Delete all documents
            let query = json!({
                "query": {
                    "match_all": {}
                }
            });

            let delete_response = self
                .client
                .delete_by_query(DeleteByQueryParts::Index(&[&self.index_name]))
                .body(query)
                .send()
                .await
                .map_err(|e| Error::other(format!("OpenSearch delete failed: {e}")))?;

            if !delete_response.status_code().is_success() {
                let error_text = delete_response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Error::other(format!(
                    "OpenSearch delete failed: {error_text}"
                )));
            }
        }

        // SAFETY: Refresh failure is non-critical - deletions are already committed
        // and will be reflected on the next automatic refresh cycle.
        let _ = self
            .client
            .indices()
            .refresh(opensearch::indices::IndicesRefreshParts::Index(&[
                &self.index_name
            ]))
            .send()
            .await;

        Ok(true)
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut documents = Vec::new();

        for id in ids {
            let get_response = self
                .client
                .get(GetParts::IndexId(&self.index_name, id))
                .send()
                .await
                .map_err(|e| Error::other(format!("OpenSearch get failed: {e}")))?;

            if get_response.status_code().is_success() {
                let json: JsonValue = get_response
                    .json()
                    .await
                    .map_err(|e| Error::other(format!("Failed to parse response: {e}")))?;

                if let Some(source) = json.get("_source") {
                    let text = source
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string();

                    let mut metadata = HashMap::new();
                    if let Some(obj) = source.as_object() {
                        for (k, v) in obj {
                            if k != "text" && k != "vector" {
                                metadata.insert(k.clone(), v.clone());
                            }
                        }
                    }

                    documents.push(Document {
                        id: Some(id.clone()),
                        page_content: text,
                        metadata,
                    });
                }
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
        // Generate query embedding
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query)
            .await
            .map_err(|e| Error::other(format!("Query embedding failed: {e}")))?;

        // Perform vector search
        self.similarity_search_by_vector(&query_embedding, k, filter)
            .await
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Generate query embedding
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query)
            .await
            .map_err(|e| Error::other(format!("Query embedding failed: {e}")))?;

        // Perform vector search with scores
        self.similarity_search_by_vector_with_score(&query_embedding, k, filter)
            .await
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        let results = self
            .similarity_search_by_vector_with_score(embedding, k, filter)
            .await?;
        Ok(results.into_iter().map(|(doc, _score)| doc).collect())
    }

    async fn similarity_search_by_vector_with_score(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<(Document, f32)>> {
        // Build k-NN query for OpenSearch
        let mut knn_query = json!({
            "vector": {
                "vector": embedding,
                "k": k
            }
        });

        // Add filter if provided
        if let Some(filter) = filter {
            if let Some(filter_query) = self.build_filter_query(filter) {
                knn_query["vector"]["filter"] = filter_query;
            }
        }

        // Build search body using k-NN plugin query syntax
        let search_body = json!({
            "query": {
                "knn": knn_query
            },
            "size": k,
            "_source": true
        });

        // Execute search
        let search_response = self
            .client
            .search(SearchParts::Index(&[&self.index_name]))
            .body(search_body)
            .send()
            .await
            .map_err(|e| Error::other(format!("OpenSearch search failed: {e}")))?;

        if !search_response.status_code().is_success() {
            let error_text = search_response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::other(format!(
                "OpenSearch search failed: {error_text}"
            )));
        }

        let json: JsonValue = search_response
            .json()
            .await
            .map_err(|e| Error::other(format!("Failed to parse search response: {e}")))?;

        // Parse results
        let mut results = Vec::new();
        if let Some(hits) = json.get("hits").and_then(|h| h.get("hits")) {
            if let Some(hits_array) = hits.as_array() {
                for hit in hits_array {
                    let score = hit
                        .get("_score")
                        .and_then(serde_json::Value::as_f64)
                        .unwrap_or(0.0) as f32;
                    let id = hit
                        .get("_id")
                        .and_then(|i| i.as_str())
                        .unwrap_or("")
                        .to_string();

                    if let Some(source) = hit.get("_source") {
                        let text = source
                            .get("text")
                            .and_then(|v| v.as_str())
                            .unwrap_or("")
                            .to_string();

                        let mut metadata = HashMap::new();
                        if let Some(obj) = source.as_object() {
                            for (k, v) in obj {
                                if k != "text" && k != "vector" {
                                    metadata.insert(k.clone(), v.clone());
                                }
                            }
                        }

                        let doc = Document {
                            id: Some(id),
                            page_content: text,
                            metadata,
                        };

                        results.push((doc, score));
                    }
                }
            }
        }

        Ok(results)
    }
}

/// VectorStoreRetriever wraps OpenSearchVectorStore to implement the Retriever trait.
///
/// This allows using OpenSearchVectorStore as a retriever in chains and with MergerRetriever.
///
/// # Example
///
/// ```rust,ignore
/// use dashflow_opensearch::{OpenSearchVectorStore, VectorStoreRetriever};
/// use dashflow::core::retrievers::Retriever;
///
/// let store = OpenSearchVectorStore::new("my_index", embeddings, "http://localhost:9200").await?;
/// let retriever = VectorStoreRetriever::new(store, 10);
/// let docs = retriever._get_relevant_documents("search query", None).await?;
/// ```
pub struct VectorStoreRetriever {
    store: OpenSearchVectorStore,
    k: usize,
}

impl VectorStoreRetriever {
    /// Create a new retriever wrapping an OpenSearchVectorStore.
    ///
    /// # Arguments
    ///
    /// * `store` - The OpenSearchVectorStore to wrap
    /// * `k` - Number of documents to retrieve per query
    #[must_use]
    pub fn new(store: OpenSearchVectorStore, k: usize) -> Self {
        Self { store, k }
    }

    /// Get the number of results to return.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Set the number of results to return.
    pub fn set_k(&mut self, k: usize) {
        self.k = k;
    }
}

use dashflow::core::config::RunnableConfig;
use dashflow::core::retrievers::{Retriever, RetrieverInput, RetrieverOutput};
use dashflow::core::runnable::Runnable;

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn _get_relevant_documents(
        &self,
        query: &str,
        _config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        self.store._similarity_search(query, self.k, None).await
    }

    fn name(&self) -> String {
        "OpenSearchVectorStoreRetriever".to_string()
    }
}

#[async_trait]
impl Runnable for VectorStoreRetriever {
    type Input = RetrieverInput;
    type Output = RetrieverOutput;

    async fn invoke(
        &self,
        input: Self::Input,
        config: Option<RunnableConfig>,
    ) -> Result<Self::Output> {
        self._get_relevant_documents(&input, config.as_ref()).await
    }

    fn name(&self) -> String {
        "OpenSearchVectorStoreRetriever".to_string()
    }
}
