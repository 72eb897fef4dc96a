//! # Arxiv Research Paper Search Tool
//!
//! Arxiv is a free distribution service and an open-access archive for scholarly articles
//! in the fields of physics, mathematics, computer science, quantitative biology,
//! quantitative finance, statistics, electrical engineering and systems science, and economics.
//!
//! This tool provides access to arXiv research papers for `DashFlow` agents.
//!
//! ## Features
//!
//! - Search arXiv papers by query (title, author, abstract)
//! - Retrieve paper metadata (title, authors, abstract, publication date)
//! - Download paper PDFs
//! - Configurable maximum results
//! - No API key required (uses public arXiv API)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dashflow_arxiv::ArxivSearchTool;
//! use dashflow::core::tools::Tool;
//!
//! # tokio_test::block_on(async {
//! let arxiv = ArxivSearchTool::new();
//!
//! // Search for papers
//! let results = arxiv._call_str("quantum computing".to_string()).await.unwrap();
//! println!("Arxiv: {}", results);
//! # });
//! ```

use async_trait::async_trait;
use dashflow::core::config::RunnableConfig;
use dashflow::core::documents::Document;
use dashflow::core::retrievers::Retriever;
use dashflow::core::tools::{Tool, ToolInput};
use dashflow::core::Result;
use dashflow::{DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// Arxiv research paper search tool for `DashFlow` agents
///
/// This tool provides access to arXiv research papers, allowing agents to search
/// for and retrieve academic papers across multiple scientific disciplines.
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_arxiv::ArxivSearchTool;
/// use dashflow::core::tools::Tool;
///
/// # tokio_test::block_on(async {
/// let arxiv = ArxivSearchTool::builder()
///     .max_results(5)
///     .build();
///
/// let results = arxiv._call_str("machine learning".to_string())
///     .await
///     .unwrap();
/// println!("Found: {}", results);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ArxivSearchTool {
    max_results: usize,
    sort_by: SortBy,
    sort_order: SortOrder,
}

/// Sort criteria for arXiv search results
#[derive(Debug, Clone, Copy, Default)]
pub enum SortBy {
    /// Sort by relevance (default)
    #[default]
    Relevance,
    /// Sort by last updated date
    LastUpdatedDate,
    /// Sort by submitted date
    SubmittedDate,
}

impl SortBy {
    fn as_str(&self) -> &str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// Sort order for arXiv search results
#[derive(Debug, Clone, Copy, Default)]
pub enum SortOrder {
    /// Ascending order
    Ascending,
    /// Descending order (default)
    #[default]
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Represents an arXiv paper entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivPaper {
    /// Paper ID
    pub id: String,
    /// Paper title
    pub title: String,
    /// Authors
    pub authors: Vec<String>,
    /// Abstract/summary
    pub summary: String,
    /// Publication date
    pub published: String,
    /// PDF URL
    pub pdf_url: String,
    /// Categories
    pub categories: Vec<String>,
}

impl ArxivSearchTool {
    /// Create a new Arxiv search tool with default settings
    ///
    /// Default settings:
    /// - `max_results`: 3
    /// - `sort_by`: Relevance
    /// - `sort_order`: Descending
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_arxiv::ArxivSearchTool;
    ///
    /// let arxiv = ArxivSearchTool::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_results: 3,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }

    /// Create a builder for `ArxivSearchTool`
    #[must_use]
    pub fn builder() -> ArxivSearchToolBuilder {
        ArxivSearchToolBuilder::default()
    }

    /// Search arXiv and retrieve paper information
    async fn search(&self, query: String) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
            .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                dashflow::core::Error::tool_error(format!("Failed to create HTTP client: {e}"))
            })?;

        // Build the query URL
        let url = format!(
            "https://export.arxiv.org/api/query?search_query=all:{}&start=0&max_results={}&sortBy={}&sortOrder={}",
            urlencoding::encode(&query),
            self.max_results,
            self.sort_by.as_str(),
            self.sort_order.as_str()
        );

        // Make the request
        let response = client.get(&url).send().await.map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to query arXiv API: {e}"))
        })?;

        let xml_text = response.text().await.map_err(|e| {
            dashflow::core::Error::tool_error(format!("Failed to read arXiv response: {e}"))
        })?;

        // Parse the Atom XML response
        let papers = Self::parse_arxiv_response(&xml_text)?;

        if papers.is_empty() {
            return Ok(format!("No papers found for query: {query}"));
        }

        // Format the output
        let mut output = format!("Found {} papers for query: {}\n\n", papers.len(), query);

        for (i, paper) in papers.iter().enumerate() {
            output.push_str(&format!("Paper {}:\n", i + 1));
            output.push_str(&format!("Title: {}\n", paper.title.trim()));
            output.push_str(&format!("Authors: {}\n", paper.authors.join(", ")));
            output.push_str(&format!("Published: {}\n", paper.published));
            output.push_str(&format!("Categories: {}\n", paper.categories.join(", ")));
            output.push_str(&format!("PDF: {}\n", paper.pdf_url));
            output.push_str(&format!("Summary: {}\n", paper.summary.trim()));
            output.push('\n');
        }

        Ok(output)
    }

    /// Parse arXiv Atom XML response
    fn parse_arxiv_response(xml: &str) -> Result<Vec<ArxivPaper>> {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut papers = Vec::new();
        let mut current_paper: Option<ArxivPaper> = None;
        let mut in_entry = false;
        let mut in_author = false;
        let mut text_buffer = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "entry" {
                        in_entry = true;
                        current_paper = Some(ArxivPaper {
                            id: String::new(),
                            title: String::new(),
                            authors: Vec::new(),
                            summary: String::new(),
                            published: String::new(),
                            pdf_url: String::new(),
                            categories: Vec::new(),
                        });
                    } else if name == "author" && in_entry {
                        in_author = true;
                    } else if name == "link" && in_entry {
                        // Check for PDF link (handles both self-closing and regular tags)
                        let mut is_pdf_link = false;
                        let mut href_value = String::new();
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref());
                            let value = String::from_utf8_lossy(&attr.value);
                            if key == "title" && value == "pdf" {
                                is_pdf_link = true;
                            }
                            if key == "href" {
                                href_value = value.to_string();
                            }
                        }
                        if is_pdf_link && !href_value.is_empty() {
                            if let Some(paper) = current_paper.as_mut() {
                                paper.pdf_url = href_value;
                            }
                        }
                    } else if name == "category" && in_entry {
                        // Get term attribute for categories (handles self-closing tags)
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref());
                            if key == "term" {
                                if let Some(paper) = current_paper.as_mut() {
                                    paper
                                        .categories
                                        .push(String::from_utf8_lossy(&attr.value).to_string());
                                }
                            }
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    text_buffer = e.unescape().unwrap_or_default().to_string();
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "entry" {
                        if let Some(paper) = current_paper.take() {
                            papers.push(paper);
                        }
                        in_entry = false;
                    } else if name == "author" {
                        in_author = false;
                    } else if in_entry {
                        if let Some(paper) = current_paper.as_mut() {
                            match name.as_str() {
                                "id" => paper.id = text_buffer.clone(),
                                "title" => paper.title = text_buffer.clone(),
                                "summary" => paper.summary = text_buffer.clone(),
                                "published" => paper.published = text_buffer.clone(),
                                "name" if in_author => {
                                    paper.authors.push(text_buffer.clone());
                                }
                                _ => {}
                            }
                        }
                    }
                    text_buffer.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(dashflow::core::Error::tool_error(format!(
                        "XML parsing error: {e}"
                    )))
                }
                _ => {}
            }
        }

        Ok(papers)
    }
}

impl Default for ArxivSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn name(&self) -> &'static str {
        "arxiv_search"
    }

    fn description(&self) -> &'static str {
        "Search arXiv for research papers in physics, mathematics, computer science, \
         quantitative biology, quantitative finance, statistics, and other scientific fields. \
         Returns paper titles, authors, abstracts, publication dates, and PDF links. \
         Best for finding academic research papers and scientific literature. \
         Input should be a search query (e.g., 'quantum computing', 'neural networks')."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for finding research papers on arXiv"
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
                .ok_or_else(|| {
                    dashflow::core::Error::tool_error(
                        "Missing 'query' field in structured input".to_string(),
                    )
                })?
                .to_string(),
        };

        self.search(query).await
    }
}

/// Builder for `ArxivSearchTool`
#[derive(Debug, Clone, Default)]
pub struct ArxivSearchToolBuilder {
    max_results: Option<usize>,
    sort_by: Option<SortBy>,
    sort_order: Option<SortOrder>,
}

impl ArxivSearchToolBuilder {
    /// Set the maximum number of results to return
    ///
    /// Default: 3
    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Set the sort criteria
    ///
    /// Default: Relevance
    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    /// Set the sort order
    ///
    /// Default: Descending
    #[must_use]
    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Build the `ArxivSearchTool`
    #[must_use]
    pub fn build(self) -> ArxivSearchTool {
        ArxivSearchTool {
            max_results: self.max_results.unwrap_or(3),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

/// Arxiv retriever for document retrieval from arXiv research papers
///
/// This retriever wraps the `ArxivSearchTool` and converts search results into Documents
/// suitable for use in retrieval chains and RAG applications.
///
/// # Python Baseline
///
/// This implements the functionality from:
/// `~/dashflow_community/dashflow_community/retrievers/arxiv.py`
///
/// Python equivalent:
/// ```python
/// from dashflow_community.retrievers import ArxivRetriever
///
/// retriever = ArxivRetriever(
///     load_max_docs=5,
///     get_full_documents=True,
/// )
/// docs = retriever.invoke("quantum computing")
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_arxiv::ArxivRetriever;
/// use dashflow::core::retrievers::Retriever;
///
/// # tokio_test::block_on(async {
/// let retriever = ArxivRetriever::builder()
///     .max_results(5)
///     .get_full_documents(true)
///     .build();
///
/// let docs = retriever._get_relevant_documents("quantum computing", None)
///     .await
///     .unwrap();
///
/// for doc in docs {
///     println!("Title: {}", doc.metadata.get("Title").unwrap());
///     println!("Content: {}", doc.page_content);
/// }
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ArxivRetriever {
    /// Internal search tool
    tool: ArxivSearchTool,
    /// Whether to return full document text or just summaries (default: false)
    get_full_documents: bool,
}

impl ArxivRetriever {
    /// Create a new `ArxivRetriever` with default settings
    ///
    /// Default settings:
    /// - `max_results`: 3
    /// - `get_full_documents`: false (summaries only)
    /// - `sort_by`: Relevance
    /// - `sort_order`: Descending
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool: ArxivSearchTool::new(),
            get_full_documents: false,
        }
    }

    /// Create a builder for `ArxivRetriever`
    #[must_use]
    pub fn builder() -> ArxivRetrieverBuilder {
        ArxivRetrieverBuilder::default()
    }

    /// Convert `ArxivPaper` to Document
    fn paper_to_document(paper: &ArxivPaper, get_full_documents: bool) -> Document {
        let mut metadata = HashMap::new();
        metadata.insert(
            "Entry ID".to_string(),
            serde_json::Value::String(paper.id.clone()),
        );
        metadata.insert(
            "Title".to_string(),
            serde_json::Value::String(paper.title.clone()),
        );
        metadata.insert(
            "Authors".to_string(),
            serde_json::Value::String(paper.authors.join(", ")),
        );
        metadata.insert(
            "Published".to_string(),
            serde_json::Value::String(paper.published.clone()),
        );
        metadata.insert(
            "PDF URL".to_string(),
            serde_json::Value::String(paper.pdf_url.clone()),
        );
        metadata.insert(
            "Categories".to_string(),
            serde_json::Value::String(paper.categories.join(", ")),
        );

        let page_content = if get_full_documents {
            // Full document includes title, authors, and summary
            format!(
                "Title: {}\nAuthors: {}\nPublished: {}\n\n{}",
                paper.title.trim(),
                paper.authors.join(", "),
                paper.published,
                paper.summary.trim()
            )
        } else {
            // Just the summary
            paper.summary.trim().to_string()
        };

        Document {
            page_content,
            metadata,
            id: Some(paper.id.clone()),
        }
    }

    /// Get papers from arXiv API
    async fn get_papers(&self, query: &str) -> Result<Vec<ArxivPaper>> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
            .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                dashflow::core::Error::http(format!("Failed to create HTTP client: {e}"))
            })?;

        let url = format!(
            "https://export.arxiv.org/api/query?search_query=all:{}&start=0&max_results={}&sortBy={}&sortOrder={}",
            urlencoding::encode(query),
            self.tool.max_results,
            self.tool.sort_by.as_str(),
            self.tool.sort_order.as_str()
        );

        let response =
            client.get(&url).send().await.map_err(|e| {
                dashflow::core::Error::http(format!("Failed to query arXiv API: {e}"))
            })?;

        let xml_text = response.text().await.map_err(|e| {
            dashflow::core::Error::http(format!("Failed to read arXiv response: {e}"))
        })?;

        ArxivSearchTool::parse_arxiv_response(&xml_text)
    }
}

impl Default for ArxivRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for ArxivRetriever {
    async fn _get_relevant_documents(
        &self,
        query: &str,
        _config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        let papers = self.get_papers(query).await?;

        Ok(papers
            .iter()
            .map(|paper| Self::paper_to_document(paper, self.get_full_documents))
            .collect())
    }
}

/// Builder for `ArxivRetriever`
#[derive(Debug, Clone, Default)]
pub struct ArxivRetrieverBuilder {
    max_results: Option<usize>,
    get_full_documents: Option<bool>,
    sort_by: Option<SortBy>,
    sort_order: Option<SortOrder>,
}

impl ArxivRetrieverBuilder {
    /// Set the maximum number of documents to retrieve
    ///
    /// Default: 3
    #[must_use]
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Set whether to return full documents or just summaries
    ///
    /// Default: false (summaries only)
    #[must_use]
    pub fn get_full_documents(mut self, get_full_documents: bool) -> Self {
        self.get_full_documents = Some(get_full_documents);
        self
    }

    /// Set the sort criteria
    ///
    /// Default: Relevance
    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    /// Set the sort order
    ///
    /// Default: Descending
    #[must_use]
    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Build the `ArxivRetriever`
    #[must_use]
    pub fn build(self) -> ArxivRetriever {
        let tool = ArxivSearchTool {
            max_results: self.max_results.unwrap_or(3),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        };

        ArxivRetriever {
            tool,
            get_full_documents: self.get_full_documents.unwrap_or(false),
        }
    }
}
