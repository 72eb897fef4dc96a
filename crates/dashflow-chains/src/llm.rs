//! LLM Chain - Simple prompt formatting and LLM execution
//!
//! This module provides a basic chain that formats a prompt with input variables
//! and sends it to a language model for completion.
//!
//! # Example
//!
//! ```rust,ignore
//! use dashflow_chains::LLMChain;
//! use dashflow::core::prompts::PromptTemplate;
//! use std::collections::HashMap;
//!
//! // Create chain
//! let prompt = PromptTemplate::from_template("Tell me a joke about {topic}").unwrap();
//! let chain = LLMChain::new(model, prompt);
//!
//! // Run chain
//! let mut inputs = HashMap::new();
//! inputs.insert("topic".to_string(), "rust".to_string());
//! let result = chain.run(&inputs).await?;
//! ```

use dashflow::core::error::Result;
use dashflow::core::language_models::{ChatModel, ChatResult, LLMResult, LLM};
use dashflow::core::prompts::{ChatPromptTemplate, PromptTemplate};
use std::collections::HashMap;
use std::sync::Arc;

/// Chain that formats a prompt and calls an LLM.
///
/// This is the most basic chain - it takes a prompt template, formats it with input
/// variables, and sends it to a language model. The LLM's response is returned as-is.
///
/// # Type Parameters
///
/// - `M`: The model type (either `LLM` or `ChatModel`)
///
/// # Example
///
/// ```rust,ignore
/// use dashflow_chains::LLMChain;
/// use dashflow::core::prompts::PromptTemplate;
///
/// let prompt = PromptTemplate::from_template("What is {number} + {number2}?").unwrap();
/// let chain = LLMChain::new(llm, prompt);
///
/// let result = chain.run(&maplit::hashmap! {
///     "number".to_string() => "2".to_string(),
///     "number2".to_string() => "3".to_string(),
/// }).await?;
/// ```
#[derive(Clone)]
pub struct LLMChain<M> {
    model: Arc<M>,
    prompt: PromptTemplate,
}

impl<M> LLMChain<M> {
    /// Create a new LLM chain with a model and prompt template.
    pub fn new(model: Arc<M>, prompt: PromptTemplate) -> Self {
        Self { model, prompt }
    }

    /// Get a reference to the prompt template.
    #[must_use]
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Get a reference to the model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: LLM> LLMChain<M> {
    /// Run the chain with the given input variables.
    ///
    /// Formats the prompt with the inputs and sends it to the LLM.
    /// Returns the LLM's text response.
    pub async fn run(&self, inputs: &HashMap<String, String>) -> Result<String> {
        // Format the prompt
        let formatted = self.prompt.format(inputs)?;

        // Call the LLM
        let result = self.model.generate(&[formatted], None, None).await?;

        // Extract the first generation's text
        result
            .generations
            .first()
            .and_then(|g| g.first())
            .map(|gen| gen.text.clone())
            .ok_or_else(|| {
                dashflow::core::error::Error::Other("No generation returned from LLM".to_string())
            })
    }

    /// Generate multiple outputs for multiple prompts.
    ///
    /// This is more efficient than calling `run` multiple times.
    pub async fn generate(&self, inputs: &[HashMap<String, String>]) -> Result<LLMResult> {
        // Format all prompts
        let formatted: Result<Vec<String>> = inputs
            .iter()
            .map(|input| self.prompt.format(input))
            .collect();
        let formatted = formatted?;

        // Call the LLM
        let result = self.model.generate(&formatted, None, None).await?;

        Ok(result)
    }
}

/// Chat model variant of LLM chain.
///
/// This chain works with chat models that accept structured messages.
/// The prompt template is formatted and sent as a human message.
#[derive(Clone)]
pub struct ChatLLMChain<M> {
    model: Arc<M>,
    prompt: ChatPromptTemplate,
}

impl<M> ChatLLMChain<M> {
    /// Create a new chat LLM chain with a model and chat prompt template.
    pub fn new(model: Arc<M>, prompt: ChatPromptTemplate) -> Self {
        Self { model, prompt }
    }

    /// Create a chat chain with a simple prompt template (converted to chat format).
    pub fn from_template(model: Arc<M>, template: &str) -> Result<Self> {
        let prompt = ChatPromptTemplate::from_messages(vec![("human", template)])?;
        Ok(Self { model, prompt })
    }

    /// Get a reference to the prompt template.
    #[must_use]
    pub fn prompt(&self) -> &ChatPromptTemplate {
        &self.prompt
    }

    /// Get a reference to the model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: ChatModel> ChatLLMChain<M> {
    /// Run the chain with the given input variables.
    ///
    /// Formats the prompt with the inputs and sends it to the chat model.
    /// Returns the model's text response.
    pub async fn run(&self, inputs: &HashMap<String, String>) -> Result<String> {
        // Format the prompt to messages
        let messages = self.prompt.format_messages(inputs)?;

        // Call the chat model
        let result = self
            .model
            .generate(&messages, None, None, None, None)
            .await?;

        // Extract the first generation's text
        Ok(result
            .generations
            .first()
            .map(dashflow::core::language_models::ChatGeneration::text)
            .unwrap_or_default())
    }

    /// Generate multiple outputs for multiple prompts.
    pub async fn generate(&self, inputs: &[HashMap<String, String>]) -> Result<Vec<ChatResult>> {
        // Format all prompts to messages
        let messages: Result<Vec<Vec<_>>> = inputs
            .iter()
            .map(|input| self.prompt.format_messages(input))
            .collect();
        let messages = messages?;

        // Call the chat model for each message set
        let mut results = Vec::new();
        for msg_set in messages {
            let result = self
                .model
                .generate(&msg_set, None, None, None, None)
                .await?;
            results.push(result);
        }

        Ok(results)
    }
}
