//! LLM-based document filter that drops irrelevant documents
//!
//! This compressor uses an LLM to determine if each document is relevant to the query,
//! filtering out documents that the LLM judges as irrelevant.

use async_trait::async_trait;
use dashflow::core::{
    config::RunnableConfig,
    documents::{Document, DocumentCompressor},
    error::{Error, Result},
    language_models::ChatModel,
    messages::{BaseMessage, Message, MessageContent},
    prompts::PromptTemplate,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Default prompt template for filtering documents
const DEFAULT_FILTER_PROMPT: &str = r"Given the following question and context, return YES if the context is relevant to the question and NO if it isn't.

> Question: {question}
> Context:
>>>
{context}
>>>
> Relevant (YES / NO):";

/// Type for the input constructor function
pub type GetInputFn = Arc<dyn Fn(&str, &Document) -> HashMap<String, String> + Send + Sync>;

/// Default function to construct input from query and document
fn default_get_input(query: &str, doc: &Document) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("question".to_string(), query.to_string());
    map.insert("context".to_string(), doc.page_content.clone());
    map
}

/// Document compressor that filters documents using LLM relevance judgment
///
/// This compressor sends each document to an LLM with the query and asks whether
/// the document is relevant. Only documents judged as relevant are kept.
///
/// # Example
///
/// ```rust,ignore
/// use dashflow_document_compressors::LLMChainFilter;
/// use dashflow_openai::ChatOpenAI;
/// use dashflow::core::documents::Document;
///
/// let llm = ChatOpenAI::with_config(Default::default()).with_model("gpt-4o-mini");
/// let filter = LLMChainFilter::from_llm(llm, None)?;
///
/// let docs = vec![
///     Document::new("Rust is a systems programming language"),
///     Document::new("Python is a high-level language"),
/// ];
///
/// let filtered = filter.compress_documents(docs, "What is Rust?", None).await?;
/// // Returns only the Rust document
/// ```
pub struct LLMChainFilter {
    /// The LLM to use for relevance judgment
    llm: Arc<dyn ChatModel>,
    /// The prompt template to use (must include {question} and {context} variables)
    prompt: PromptTemplate,
    /// Function to construct input from query and document
    get_input: GetInputFn,
}

impl LLMChainFilter {
    /// Create a new filter from an LLM and optional custom prompt
    ///
    /// # Arguments
    ///
    /// * `llm` - The language model to use for filtering
    /// * `prompt` - Optional custom prompt template. If None, uses default prompt.
    ///   Must include {question} and {context} variables.
    ///
    /// # Returns
    ///
    /// A new `LLMChainFilter` instance
    pub fn from_llm(llm: Arc<dyn ChatModel>, prompt: Option<PromptTemplate>) -> Result<Self> {
        let prompt = match prompt {
            Some(p) => p,
            None => PromptTemplate::from_template(DEFAULT_FILTER_PROMPT)?,
        };

        // Validate that prompt has required variables
        let required_vars = vec!["question", "context"];
        for var in &required_vars {
            if !prompt.input_variables.contains(&(*var).to_string()) {
                return Err(Error::InvalidInput(format!(
                    "Prompt must include '{var}' variable"
                )));
            }
        }

        Ok(Self {
            llm,
            prompt,
            get_input: Arc::new(default_get_input),
        })
    }

    /// Set a custom input constructor function
    pub fn with_get_input(mut self, get_input: GetInputFn) -> Self {
        self.get_input = get_input;
        self
    }

    /// Check if LLM response indicates document is relevant
    fn is_relevant(&self, response: &str) -> bool {
        let cleaned = response.trim().to_uppercase();
        cleaned.contains("YES") || cleaned.starts_with("YES")
    }
}

#[async_trait]
impl DocumentCompressor for LLMChainFilter {
    async fn compress_documents(
        &self,
        documents: Vec<Document>,
        query: &str,
        config: Option<&RunnableConfig>,
    ) -> Result<Vec<Document>> {
        let mut filtered_docs = Vec::new();

        // Process each document
        for doc in documents {
            // Construct input
            let input = (self.get_input)(query, &doc);

            // Format prompt
            let prompt_text = self.prompt.format(&input)?;

            // Call LLM
            let messages: Vec<BaseMessage> = vec![Message::system(prompt_text)];

            let response = self
                .llm
                .generate(&messages, None, None, None, config)
                .await?;

            // Check if relevant
            if let Some(msg) = response.generations.first() {
                let content = msg.message.content();
                if let MessageContent::Text(text) = content {
                    if self.is_relevant(text) {
                        filtered_docs.push(doc);
                    }
                }
            }
        }

        Ok(filtered_docs)
    }
}
