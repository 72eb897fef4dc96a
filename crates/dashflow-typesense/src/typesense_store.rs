// The blanket #![allow(clippy::unwrap_used)] was removed.
// Production code uses proper error handling; only test code uses .unwrap().

//! Typesense vector store implementation
//!
//! Provides vector similarity search using Typesense search engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use dashflow::core::embeddings::Embeddings;
//! use dashflow_typesense::TypesenseVectorStore;
//! use std::sync::Arc;
//!
//! let embeddings = Arc::new(my_embeddings);
//! let mut store = TypesenseVectorStore::new(
//!     "http://localhost:8108",
//!     "my_api_key",
//!     "my_collection",
//!     embeddings,
//!     384, // embedding dimension
//!     "text", // text field name
//! ).await?;
//!
//! // Add documents
//! let texts = vec!["Hello world", "Goodbye world"];
//! let ids = store.add_texts(&texts, None, None).await?;
//!
//! // Search
//! let results = store._similarity_search("Hello", 5, None).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use dashflow::constants::{DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_REQUEST_TIMEOUT};

/// Create an HTTP client with standard timeouts
fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
        .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

use async_trait::async_trait;
use dashflow::core::documents::Document;
use dashflow::core::embeddings::Embeddings;
use dashflow::core::vector_stores::VectorStore;
use dashflow::core::{Error, Result};
use dashflow::{embed, embed_query};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use typesense_rs::apis::collections_api::{
    CollectionsApi, CollectionsApiClient, CreateCollectionParams, GetCollectionParams,
};
use typesense_rs::apis::configuration::{ApiKey, Configuration};
use typesense_rs::apis::documents_api::{
    DocumentsApi, DocumentsApiClient, ImportDocumentsParams, MultiSearchParams,
};
use typesense_rs::models::{CollectionSchema, Field, IndexAction};
use uuid::Uuid;

/// Typesense vector store for similarity search.
///
/// Uses Typesense's vector search capabilities to store and retrieve
/// documents based on semantic similarity.
#[derive(Clone)]
pub struct TypesenseVectorStore {
    collections_api: Arc<CollectionsApiClient>,
    documents_api: Arc<DocumentsApiClient>,
    collection_name: String,
    embeddings: Arc<dyn Embeddings>,
    embedding_dim: usize,
    text_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TypesenseDocument {
    id: String,
    vec: Vec<f32>,
    #[serde(flatten)]
    text_and_metadata: HashMap<String, JsonValue>,
}

impl TypesenseVectorStore {
    /// Creates a new `TypesenseVectorStore`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Typesense server URL (e.g., "<http://localhost:8108>")
    /// * `api_key` - Typesense API key for authentication
    /// * `collection_name` - Name of the collection to use
    /// * `embeddings` - Embeddings model for generating vectors
    /// * `embedding_dim` - Dimension of the embedding vectors
    /// * `text_key` - Field name for storing text content (default: "text")
    pub async fn new(
        base_url: &str,
        api_key: &str,
        collection_name: &str,
        embeddings: Arc<dyn Embeddings>,
        embedding_dim: usize,
        text_key: &str,
    ) -> Result<Self> {
        let config = Arc::new(Configuration {
            base_path: base_url.to_string(),
            user_agent: Some("dashflow/0.1.0".to_string()),
            client: create_http_client(),
            basic_auth: None,
            oauth_access_token: None,
            bearer_access_token: None,
            api_key: Some(ApiKey {
                prefix: None,
                key: api_key.to_string(),
            }),
        });

        let collections_api = Arc::new(CollectionsApiClient::new(Arc::clone(&config)));
        let documents_api = Arc::new(DocumentsApiClient::new(Arc::clone(&config)));

        Ok(Self {
            collections_api,
            documents_api,
            collection_name: collection_name.to_string(),
            embeddings,
            embedding_dim,
            text_key: text_key.to_string(),
        })
    }

    /// Creates the collection if it doesn't exist.
    async fn ensure_collection_exists(&self) -> Result<()> {
        // Try to get the collection
        let get_params = GetCollectionParams {
            collection_name: self.collection_name.clone(),
        };

        match self.collections_api.get_collection(get_params).await {
            Ok(_) => Ok(()), // Collection exists
            Err(_) => {
                // Collection doesn't exist, create it
                self.create_collection().await
            }
        }
    }

    /// Creates the collection with the appropriate schema.
    async fn create_collection(&self) -> Result<()> {
        let mut vec_field = Field::new("vec".to_string(), "float[]".to_string());
        vec_field.num_dim = Some(self.embedding_dim as i32);

        let text_field = Field::new(self.text_key.clone(), "string".to_string());

        // Wildcard field for metadata
        let metadata_field = Field::new(".*".to_string(), "auto".to_string());

        let schema = CollectionSchema::new(
            vec![vec_field, text_field, metadata_field],
            self.collection_name.clone(),
        );

        let params = CreateCollectionParams {
            collection_schema: schema,
        };

        self.collections_api
            .create_collection(params)
            .await
            .map_err(|e| Error::Other(format!("Failed to create collection: {e}")))?;

        Ok(())
    }

    /// Prepares documents for indexing by embedding texts and formatting.
    async fn prep_documents(
        &self,
        texts: &[impl AsRef<str> + Send + Sync],
        metadatas: Option<&[HashMap<String, JsonValue>]>,
        ids: Option<&[String]>,
    ) -> Result<(Vec<TypesenseDocument>, Vec<String>)> {
        let text_strs: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        // Generate embeddings using graph API
        let embeddings = embed(Arc::clone(&self.embeddings), &text_strs)
            .await
            .map_err(|e| Error::Other(format!("Failed to embed documents: {e}")))?;

        let mut documents = Vec::new();
        let mut doc_ids = Vec::new();

        for (i, (text, embedding)) in texts.iter().zip(embeddings.iter()).enumerate() {
            let id = if let Some(ids) = ids {
                ids[i].clone()
            } else {
                Uuid::new_v4().to_string()
            };

            let mut text_and_metadata = HashMap::new();
            text_and_metadata.insert(
                self.text_key.clone(),
                JsonValue::String(text.as_ref().to_string()),
            );

            // Add metadata if provided
            if let Some(metadatas) = metadatas {
                if let Some(metadata) = metadatas.get(i) {
                    text_and_metadata.insert(
                        "metadata".to_string(),
                        JsonValue::Object(
                            metadata
                                .iter()
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect(),
                        ),
                    );
                }
            }

            documents.push(TypesenseDocument {
                id: id.clone(),
                vec: embedding.clone(),
                text_and_metadata,
            });

            doc_ids.push(id);
        }

        Ok((documents, doc_ids))
    }
}

#[async_trait]
impl VectorStore for TypesenseVectorStore {
    fn embeddings(&self) -> Option<Arc<dyn Embeddings>> {
        Some(Arc::clone(&self.embeddings))
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

        // Ensure collection exists
        self.ensure_collection_exists().await?;

        // Prepare documents
        let (documents, doc_ids) = self.prep_documents(texts, metadatas, ids).await?;

        // Convert documents to JSONL format
        let jsonl = documents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Other(format!("Failed to serialize document: {e}")))?
            .join("\n");

        // Import documents
        let params = ImportDocumentsParams {
            collection_name: self.collection_name.clone(),
            body: jsonl,
            batch_size: None,
            return_id: Some(true),
            remote_embedding_batch_size: None,
            return_doc: None,
            action: Some(IndexAction::Upsert),
            dirty_values: None,
        };

        self.documents_api
            .import_documents(params)
            .await
            .map_err(|e| Error::Other(format!("Failed to import documents: {e}")))?;

        Ok(doc_ids)
    }

    async fn _similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, JsonValue>>,
    ) -> Result<Vec<Document>> {
        // Embed the query using graph API
        let query_embedding = embed_query(Arc::clone(&self.embeddings), query)
            .await
            .map_err(|e| Error::Other(format!("Failed to embed query: {e}")))?;

        // Format vector query
        let vec_str = query_embedding
            .iter()
            .map(std::string::ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let vector_query = format!("vec:([{vec_str}], k:{k})");

        // Format filter if provided
        let filter_by = filter.map(|f| {
            f.iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(" && ")
        });

        // Create search parameters using multi_search
        // We need to use the raw multi_search with a searches JSON body
        let params = MultiSearchParams {
            q: Some("*".to_string()),
            query_by: None,
            query_by_weights: None,
            text_match_type: None,
            prefix: None,
            infix: None,
            max_extra_prefix: None,
            max_extra_suffix: None,
            filter_by: filter_by.clone(),
            sort_by: None,
            facet_by: None,
            max_facet_values: None,
            facet_query: None,
            num_typos: None,
            page: None,
            per_page: None,
            limit: Some(k as i32),
            offset: None,
            group_by: None,
            group_limit: None,
            group_missing_values: None,
            include_fields: None,
            exclude_fields: None,
            highlight_full_fields: None,
            highlight_affix_num_tokens: None,
            highlight_start_tag: None,
            highlight_end_tag: None,
            snippet_threshold: None,
            drop_tokens_threshold: None,
            drop_tokens_mode: None,
            typo_tokens_threshold: None,
            enable_typos_for_alpha_numerical_tokens: None,
            filter_curated_hits: None,
            enable_synonyms: None,
            synonym_prefix: None,
            synonym_num_typos: None,
            pinned_hits: None,
            hidden_hits: None,
            override_tags: None,
            highlight_fields: None,
            pre_segmented_query: None,
            preset: None,
            enable_overrides: None,
            prioritize_exact_match: None,
            prioritize_token_position: None,
            prioritize_num_matching_fields: None,
            enable_typos_for_numerical_tokens: None,
            exhaustive_search: None,
            search_cutoff_ms: None,
            use_cache: None,
            cache_ttl: None,
            min_len_1typo: None,
            min_len_2typo: None,
            vector_query: Some(vector_query),
            remote_embedding_timeout_ms: None,
            remote_embedding_num_tries: None,
            facet_strategy: None,
            stopwords: None,
            facet_return_parent: None,
            voice_query: None,
            conversation: None,
            conversation_model_id: None,
            conversation_id: None,
            multi_search_searches_parameter: None,
        };

        // Execute search
        let response = self
            .documents_api
            .multi_search(params)
            .await
            .map_err(|e| Error::Other(format!("Failed to search: {e}")))?;

        // Parse results
        let mut documents = Vec::new();
        if let Some(result) = response.results.first() {
            if let Some(hits) = &result.hits {
                for hit in hits {
                    if let Some(doc) = &hit.document {
                        let text = doc
                            .get(&self.text_key)
                            .and_then(|v| v.as_str())
                            .unwrap_or("")
                            .to_string();

                        let metadata = doc
                            .get("metadata")
                            .and_then(|v| v.as_object())
                            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                            .unwrap_or_default();

                        let mut document = Document::new(text);
                        document.metadata = metadata;
                        documents.push(document);
                    }
                }
            }
        }

        Ok(documents)
    }
}
