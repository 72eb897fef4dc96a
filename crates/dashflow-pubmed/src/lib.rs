//! PubMed/PMC Search Tool for `DashFlow` Rust
//!
//! This crate provides a tool for searching medical and scientific literature through
//! the PubMed/PMC database using the NCBI E-utilities API.
//!
//! # Overview
//!
//! `PubMed` is a free search engine accessing primarily the MEDLINE database of references
//! and abstracts on life sciences and biomedical topics. The tool uses two E-utilities:
//! - **`ESearch`**: Searches and retrieves a list of article UIDs matching a query
//! - **`EFetch`**: Fetches full article details (title, authors, abstract, etc.)
//!
//! # Features
//!
//! - Free API access (no authentication required)
//! - Search 35+ million citations from biomedical literature
//! - Configurable result count and sorting
//! - JSON response format
//! - Rate limiting guidelines (3 requests/sec without API key)
//!
//! # Example
//!
//! ```ignore
//! use dashflow_pubmed::PubMedSearch;
//! use dashflow::core::tools::Tool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tool = PubMedSearch::new()
//!     .max_results(5)
//!     .build();
//!
//! let results = tool.run("CRISPR gene editing", None).await?;
//! println!("Search results:\n{}", results);
//! # Ok(())
//! # }
//! ```
//!
//! # API Endpoints
//!
//! - **`ESearch`**: `https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi`
//! - **`EFetch`**: `https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi`
//!
//! # Rate Limits
//!
//! - Without API key: 3 requests/second
//! - With API key: 10 requests/second
//! - Bulk/systematic retrieval prohibited
//!
//! # References
//!
//! - [NCBI E-utilities Documentation](https://www.ncbi.nlm.nih.gov/books/NBK25501/)
//! - [PubMed](https://pubmed.ncbi.nlm.nih.gov/)
//! - [PMC (PubMed Central)](https://pmc.ncbi.nlm.nih.gov/)

use async_trait::async_trait;
use dashflow::core::config::RunnableConfig;
use dashflow::core::documents::Document;
use dashflow::core::error::{Error, Result};
use dashflow::core::retrievers::Retriever;
use dashflow::core::tools::{Tool, ToolInput};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

const ESEARCH_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// PubMed/PMC search tool for medical and scientific literature
///
/// # Example
///
/// ```ignore
/// use dashflow_pubmed::PubMedSearch;
/// use dashflow::core::tools::Tool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = PubMedSearch::builder()
///     .max_results(10)
///     .sort_by("relevance")
///     .build();
///
/// let results = tool.run("immunotherapy cancer treatment", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PubMedSearch {
    /// HTTP client
    client: Client,
    /// Maximum number of results to return (default: 5, max: 10,000)
    max_results: usize,
    /// Database to search (default: "pubmed")
    database: String,
    /// Sort order: "relevance", "`pub_date`", "author", "journal"
    sort_by: Option<String>,
    /// API key for higher rate limits (optional)
    api_key: Option<String>,
}

impl PubMedSearch {
    /// Create a new `PubMedSearch` tool with default settings
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_pubmed::PubMedSearch;
    ///
    /// let tool = PubMedSearch::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            max_results: 3,
            database: "pubmed".to_string(),
            sort_by: None,
            api_key: None,
        }
    }

    /// Create a builder for `PubMedSearch`
    #[must_use]
    pub fn builder() -> Self {
        Self::new()
    }

    /// Set the maximum number of results (default: 5, max: 10,000)
    #[must_use]
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max.min(10000);
        self
    }

    /// Set the database to search (default: "pubmed")
    ///
    /// Other databases: "pmc", "pubmedhealth", "mesh", etc.
    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set the sort order
    ///
    /// Options: "relevance", "`pub_date`", "author", "journal"
    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    /// Set API key for higher rate limits (10 req/sec vs 3 req/sec)
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build the tool (for consistency with builder pattern)
    #[must_use]
    pub fn build(self) -> Self {
        self
    }

    /// Execute a search query
    async fn search(&self, query: &str) -> Result<Vec<PubMedArticle>> {
        // Step 1: ESearch to get article IDs
        let max_results_str = self.max_results.to_string();
        let mut params = vec![
            ("db", self.database.as_str()),
            ("term", query),
            ("retmax", max_results_str.as_str()),
            ("retmode", "json"),
        ];

        if let Some(sort) = &self.sort_by {
            params.push(("sort", sort.as_str()));
        }

        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key.as_str()));
        }

        let esearch_response = self
            .client
            .get(ESEARCH_BASE_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::tool_error(format!("ESearch request failed: {e}")))?;

        let esearch_json: ESearchResponse = esearch_response
            .json()
            .await
            .map_err(|e| Error::tool_error(format!("Failed to parse ESearch response: {e}")))?;

        let id_list = esearch_json
            .esearchresult
            .idlist
            .iter()
            .map(std::string::String::as_str)
            .collect::<Vec<_>>();

        if id_list.is_empty() {
            return Ok(vec![]);
        }

        // Step 2: EFetch to get article details
        let ids = id_list.join(",");
        let mut efetch_params = vec![
            ("db", self.database.as_str()),
            ("id", ids.as_str()),
            ("retmode", "xml"),
            ("rettype", "abstract"),
        ];

        if let Some(api_key) = &self.api_key {
            efetch_params.push(("api_key", api_key.as_str()));
        }

        let efetch_response = self
            .client
            .get(EFETCH_BASE_URL)
            .query(&efetch_params)
            .send()
            .await
            .map_err(|e| Error::tool_error(format!("EFetch request failed: {e}")))?;

        let xml_text = efetch_response
            .text()
            .await
            .map_err(|e| Error::tool_error(format!("Failed to get EFetch response text: {e}")))?;

        // Parse XML to extract article information
        let articles = parse_pubmed_xml(&xml_text, &id_list)?;

        Ok(articles)
    }

    /// Format search results as a string
    fn format_results(&self, articles: &[PubMedArticle]) -> String {
        if articles.is_empty() {
            return "No results found.".to_string();
        }

        let mut output = format!("Found {} article(s):\n\n", articles.len());

        for (i, article) in articles.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, article.title));
            output.push_str(&format!("   PMID: {}\n", article.pmid));

            if !article.authors.is_empty() {
                let authors = if article.authors.len() > 3 {
                    format!("{} et al.", article.authors[0])
                } else {
                    article.authors.join(", ")
                };
                output.push_str(&format!("   Authors: {authors}\n"));
            }

            if let Some(journal) = &article.journal {
                output.push_str(&format!("   Journal: {journal}\n"));
            }

            if let Some(pub_date) = &article.pub_date {
                output.push_str(&format!("   Published: {pub_date}\n"));
            }

            if let Some(abstract_text) = &article.abstract_text {
                let truncated = if abstract_text.len() > 300 {
                    format!("{}...", &abstract_text[..300])
                } else {
                    abstract_text.clone()
                };
                output.push_str(&format!("   Abstract: {truncated}\n"));
            }

            output.push_str(&format!(
                "   Link: https://pubmed.ncbi.nlm.nih.gov/{}/\n\n",
                article.pmid
            ));
        }

        output
    }

    /// Load documents from `PubMed` search
    ///
    /// This method converts `PubMed` articles into Document objects suitable for retrieval.
    /// Each document contains the abstract as `page_content` and metadata with article details.
    ///
    /// # Python Baseline
    ///
    /// Equivalent to `PubMedAPIWrapper.load_docs()` from:
    /// `~/dashflow_community/dashflow_community/utilities/pubmed.py`
    pub async fn load_docs(&self, query: &str) -> Result<Vec<Document>> {
        let articles = self.search(query).await?;

        Ok(articles
            .iter()
            .map(|article| {
                let mut metadata = HashMap::new();

                metadata.insert(
                    "uid".to_string(),
                    serde_json::Value::String(article.pmid.clone()),
                );
                metadata.insert(
                    "Title".to_string(),
                    serde_json::Value::String(article.title.clone()),
                );

                if let Some(pub_date) = &article.pub_date {
                    metadata.insert(
                        "Published".to_string(),
                        serde_json::Value::String(pub_date.clone()),
                    );
                }

                if let Some(journal) = &article.journal {
                    metadata.insert(
                        "Journal".to_string(),
                        serde_json::Value::String(journal.clone()),
                    );
                }

                if !article.authors.is_empty() {
                    metadata.insert(
                        "Authors".to_string(),
                        serde_json::Value::String(article.authors.join(", ")),
                    );
                }

                // Python uses "Summary" as page_content
                let page_content = article
                    .abstract_text
                    .clone()
                    .unwrap_or_else(|| "No abstract available".to_string());

                Document {
                    page_content,
                    metadata,
                    id: Some(article.pmid.clone()),
                }
            })
            .collect())
    }
}

impl Default for PubMedSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PubMedSearch {
    fn name(&self) -> &'static str {
        "pubmed_search"
    }

    fn description(&self) -> &'static str {
        "Search PubMed/PMC for medical and scientific literature. \
         Input should be a search query string. Returns article titles, \
         authors, abstracts, and links to full articles. Covers 35+ million \
         citations from biomedical literature."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for PubMed (e.g., 'CRISPR gene editing', 'cancer immunotherapy')"
                }
            },
            "required": ["query"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let query = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(v) => v
                .get("query")
                .and_then(|q| q.as_str())
                .ok_or_else(|| Error::tool_error("Missing 'query' field in structured input"))?
                .to_string(),
        };

        if query.trim().is_empty() {
            return Err(Error::tool_error("Search query cannot be empty"));
        }

        let articles = self.search(&query).await?;
        Ok(self.format_results(&articles))
    }
}

/// Article information from `PubMed`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PubMedArticle {
    pmid: String,
    title: String,
    authors: Vec<String>,
    journal: Option<String>,
    pub_date: Option<String>,
    abstract_text: Option<String>,
}

/// `ESearch` API response structure
#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    idlist: Vec<String>,
}

/// Parse `PubMed` XML response
fn parse_pubmed_xml(xml: &str, id_list: &[&str]) -> Result<Vec<PubMedArticle>> {
    use quick_xml::events::Event;
    use quick_xml::reader::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut current_article: Option<PubMedArticle> = None;
    let mut current_element = String::new();
    let mut in_abstract = false;
    let mut abstract_parts = Vec::new();
    let mut in_author_list = false;
    let mut current_author_parts: Vec<String> = Vec::new();

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_element = name.clone();

                if name == "PubmedArticle" {
                    current_article = Some(PubMedArticle {
                        pmid: String::new(),
                        title: String::new(),
                        authors: Vec::new(),
                        journal: None,
                        pub_date: None,
                        abstract_text: None,
                    });
                } else if name == "Abstract" {
                    in_abstract = true;
                    abstract_parts.clear();
                } else if name == "AuthorList" {
                    in_author_list = true;
                } else if name == "Author" && in_author_list {
                    current_author_parts.clear();
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if name == "PubmedArticle" {
                    if let Some(article) = current_article.take() {
                        articles.push(article);
                    }
                } else if name == "Abstract" {
                    in_abstract = false;
                    if let Some(article) = current_article.as_mut() {
                        article.abstract_text = Some(abstract_parts.join(" "));
                    }
                } else if name == "AuthorList" {
                    in_author_list = false;
                } else if name == "Author" && in_author_list && !current_author_parts.is_empty() {
                    if let Some(article) = current_article.as_mut() {
                        article.authors.push(current_author_parts.join(" "));
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().trim().to_string();

                if text.is_empty() {
                    continue;
                }

                if let Some(article) = current_article.as_mut() {
                    match current_element.as_str() {
                        "PMID" => {
                            if article.pmid.is_empty() {
                                article.pmid = text;
                            }
                        }
                        "ArticleTitle" => {
                            article.title = text;
                        }
                        "Title" if article.journal.is_none() => {
                            article.journal = Some(text);
                        }
                        "Year" | "PubDate" => {
                            if article.pub_date.is_none() {
                                article.pub_date = Some(text);
                            }
                        }
                        "AbstractText" if in_abstract => {
                            abstract_parts.push(text);
                        }
                        "LastName" if in_author_list => {
                            current_author_parts.insert(0, text);
                        }
                        "ForeName" | "Initials" if in_author_list => {
                            current_author_parts.push(text);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::tool_error(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }

        buf.clear();
    }

    // Ensure articles match the requested ID order
    if articles.len() != id_list.len() {
        // Some articles may not have been parsed; create placeholder entries
        let mut ordered_articles = Vec::new();
        for &id in id_list {
            if let Some(article) = articles.iter().find(|a| a.pmid == id) {
                ordered_articles.push(article.clone());
            } else {
                // Fallback: create minimal article with just PMID
                ordered_articles.push(PubMedArticle {
                    pmid: id.to_string(),
                    title: "[Article details not available]".to_string(),
                    authors: Vec::new(),
                    journal: None,
                    pub_date: None,
                    abstract_text: None,
                });
            }
        }
        return Ok(ordered_articles);
    }

    Ok(articles)
}


/// `PubMed` retriever for document retrieval from medical and scientific literature
///
/// This retriever wraps `PubMedSearch` and converts search results into Documents
/// suitable for use in retrieval chains and RAG applications.
///
/// # Python Baseline
///
/// This implements the functionality from:
/// `~/dashflow_community/dashflow_community/retrievers/pubmed.py`
///
/// Python equivalent:
/// ```python
/// from dashflow_community.retrievers import PubMedRetriever
///
/// retriever = PubMedRetriever(top_k_results=5)
/// docs = retriever.invoke("CRISPR gene editing")
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_pubmed::PubMedRetriever;
/// use dashflow::core::retrievers::Retriever;
///
/// # tokio_test::block_on(async {
/// let retriever = PubMedRetriever::builder()
///     .max_results(5)
///     .build();
///
/// let docs = retriever._get_relevant_documents("cancer immunotherapy", None)
///     .await
///     .unwrap();
///
/// for doc in docs {
///     println!("Title: {}", doc.metadata.get("Title").unwrap());
///     println!("Abstract: {}", doc.page_content);
/// }
/// # });
/// ```
pub struct PubMedRetriever {
    /// Internal `PubMedSearch` tool
    search: PubMedSearch,
}

impl PubMedRetriever {
    /// Create a new `PubMedRetriever` with default settings
    ///
    /// Default settings:
    /// - `max_results`: 3
    /// - database: "pubmed"
    #[must_use]
    pub fn new() -> Self {
        Self {
            search: PubMedSearch::new(),
        }
    }

    /// Create a builder for `PubMedRetriever`
    #[must_use]
    pub fn builder() -> PubMedRetrieverBuilder {
        PubMedRetrieverBuilder::default()
    }
}

impl Default for PubMedRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for PubMedRetriever {
    async fn _get_relevant_documents(
        &self,
        query: &str,
        _config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        self.search.load_docs(query).await
    }
}

/// Builder for `PubMedRetriever`
#[derive(Default)]
pub struct PubMedRetrieverBuilder {
    max_results: Option<usize>,
    database: Option<String>,
    sort_by: Option<String>,
    api_key: Option<String>,
}

impl PubMedRetrieverBuilder {
    /// Set the maximum number of results (default: 3, max: 10,000)
    #[must_use]
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Set the database to search (default: "pubmed")
    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    /// Set the sort order
    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    /// Set API key for higher rate limits
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build the `PubMedRetriever`
    #[must_use]
    pub fn build(self) -> PubMedRetriever {
        let mut search = PubMedSearch::new();

        if let Some(max) = self.max_results {
            search = search.max_results(max);
        }
        if let Some(db) = self.database {
            search = search.database(db);
        }
        if let Some(sort) = self.sort_by {
            search = search.sort_by(sort);
        }
        if let Some(key) = self.api_key {
            search = search.api_key(key);
        }

        PubMedRetriever {
            search: search.build(),
        }
    }
}
