//! # DashFlow Context Management
//!
//! Context window management for LLM applications. Provides token counting,
//! truncation strategies, and budget tracking with reserved response space.
//!
//! ## Features
//!
//! - **Token counting**: Uses tiktoken-rs for accurate token counts
//! - **Truncation strategies**: Drop-oldest, sliding-window, keep-first-and-last
//! - **Budget tracking**: Reserve tokens for response generation
//! - **Model-specific limits**: Auto-detect context window sizes
//!
//! ## Example
//!
//! ```
//! use dashflow_context::{ContextManager, TruncationStrategy};
//! use dashflow::core::messages::Message;
//!
//! let manager = ContextManager::builder()
//!     .model("gpt-4o")
//!     .reserve_tokens(4000)
//!     .truncation(TruncationStrategy::DropOldest)
//!     .build();
//!
//! // Count tokens in text
//! let count = manager.count_tokens("Hello, world!");
//!
//! // Check if messages fit within budget
//! let messages = vec![
//!     Message::system("You are helpful"),
//!     Message::human("Hello!"),
//! ];
//! let result = manager.fit(&messages);
//! println!("Messages: {}, Tokens: {}", result.messages.len(), result.token_count);
//! ```

use dashflow::core::messages::{ContentBlock, IntoLlmMessage, Message, MessageContent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;
use tiktoken_rs::{get_bpe_from_model, CoreBPE};

/// Errors that can occur during context management
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContextError {
    /// Unknown model name
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Token counting failed
    #[error("Failed to count tokens: {0}")]
    TokenCountError(String),

    /// Message is too large for context window
    #[error("Single message exceeds context limit: {0} tokens > {1} available")]
    MessageTooLarge(usize, usize),

    /// Reserved space exceeds context limit
    #[error("Reserved tokens ({0}) exceed context limit ({1})")]
    ReservedExceedsLimit(usize, usize),
}

/// Truncation strategy for managing context overflow
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Drop oldest messages first (keeps most recent context)
    #[default]
    DropOldest,

    /// Sliding window - keep last N tokens worth of messages
    SlidingWindow,

    /// Keep first (system) and last messages, drop middle
    KeepFirstAndLast,
}

/// Model context limits (in tokens)
#[derive(Debug, Clone, Copy)]
pub struct ModelLimits {
    /// Maximum context window size
    pub context_window: usize,
    /// Maximum output tokens (if different from context)
    pub max_output: Option<usize>,
}

impl ModelLimits {
    /// Create new model limits
    #[must_use]
    pub const fn new(context_window: usize) -> Self {
        Self {
            context_window,
            max_output: None,
        }
    }

    /// Create model limits with custom output limit
    #[must_use]
    pub const fn with_output(context_window: usize, max_output: usize) -> Self {
        Self {
            context_window,
            max_output: Some(max_output),
        }
    }
}

/// Get model limits for known models
fn get_model_limits() -> &'static HashMap<&'static str, ModelLimits> {
    static LIMITS: OnceLock<HashMap<&'static str, ModelLimits>> = OnceLock::new();
    LIMITS.get_or_init(|| {
        let mut m = HashMap::new();

        // OpenAI models
        m.insert("gpt-4o", ModelLimits::with_output(128_000, 16_384));
        m.insert("gpt-4o-mini", ModelLimits::with_output(128_000, 16_384));
        m.insert("gpt-4-turbo", ModelLimits::with_output(128_000, 4_096));
        m.insert(
            "gpt-4-turbo-preview",
            ModelLimits::with_output(128_000, 4_096),
        );
        m.insert("gpt-4", ModelLimits::with_output(8_192, 4_096));
        m.insert("gpt-4-32k", ModelLimits::with_output(32_768, 4_096));
        m.insert("gpt-3.5-turbo", ModelLimits::with_output(16_385, 4_096));
        m.insert("gpt-3.5-turbo-16k", ModelLimits::with_output(16_385, 4_096));
        m.insert("o1", ModelLimits::with_output(200_000, 100_000));
        m.insert("o1-mini", ModelLimits::with_output(128_000, 65_536));
        m.insert("o1-preview", ModelLimits::with_output(128_000, 32_768));
        m.insert("o3-mini", ModelLimits::with_output(200_000, 100_000));

        // Anthropic models
        m.insert("claude-3-opus", ModelLimits::with_output(200_000, 4_096));
        m.insert("claude-3-sonnet", ModelLimits::with_output(200_000, 4_096));
        m.insert("claude-3-haiku", ModelLimits::with_output(200_000, 4_096));
        m.insert(
            "claude-3-5-sonnet",
            ModelLimits::with_output(200_000, 8_192),
        );
        m.insert("claude-3-5-haiku", ModelLimits::with_output(200_000, 8_192));
        m.insert("claude-opus-4", ModelLimits::with_output(200_000, 32_000));
        m.insert("claude-sonnet-4", ModelLimits::with_output(200_000, 64_000));

        // Google models
        m.insert("gemini-1.5-pro", ModelLimits::with_output(2_097_152, 8_192));
        m.insert(
            "gemini-1.5-flash",
            ModelLimits::with_output(1_048_576, 8_192),
        );
        m.insert(
            "gemini-2.0-flash",
            ModelLimits::with_output(1_048_576, 8_192),
        );

        // Mistral models
        m.insert("mistral-large", ModelLimits::with_output(128_000, 8_192));
        m.insert("mistral-medium", ModelLimits::with_output(32_000, 8_192));
        m.insert("mistral-small", ModelLimits::with_output(32_000, 8_192));
        m.insert("codestral", ModelLimits::with_output(32_000, 8_192));

        // DeepSeek models
        m.insert("deepseek-chat", ModelLimits::with_output(64_000, 8_000));
        m.insert("deepseek-coder", ModelLimits::with_output(64_000, 8_000));

        m
    })
}

/// Resolve model name to canonical form and get limits
fn resolve_model(model: &str) -> Option<(&'static str, ModelLimits)> {
    let limits = get_model_limits();

    // Direct match - need to find the static key
    for (&name, &limit) in limits.iter() {
        if name == model {
            return Some((name, limit));
        }
    }

    // Prefix matching for versioned model names
    let model_lower = model.to_lowercase();
    for (&name, &limit) in limits.iter() {
        if model_lower.starts_with(name) || model_lower.contains(name) {
            return Some((name, limit));
        }
    }

    // Fallback patterns
    if model_lower.contains("gpt-4o") {
        return Some(("gpt-4o", *limits.get("gpt-4o")?));
    }
    if model_lower.contains("gpt-4") {
        return Some(("gpt-4", *limits.get("gpt-4")?));
    }
    if model_lower.contains("gpt-3.5") {
        return Some(("gpt-3.5-turbo", *limits.get("gpt-3.5-turbo")?));
    }
    if model_lower.contains("claude-3-opus") || model_lower.contains("claude-3-opus") {
        return Some(("claude-3-opus", *limits.get("claude-3-opus")?));
    }
    if model_lower.contains("claude-3-5-sonnet") || model_lower.contains("claude-3.5-sonnet") {
        return Some(("claude-3-5-sonnet", *limits.get("claude-3-5-sonnet")?));
    }
    if model_lower.contains("claude") {
        return Some(("claude-3-sonnet", *limits.get("claude-3-sonnet")?));
    }
    if model_lower.contains("gemini") {
        return Some(("gemini-1.5-pro", *limits.get("gemini-1.5-pro")?));
    }

    None
}

/// Get tiktoken encoder for a model
fn get_encoder(model: &str) -> Option<CoreBPE> {
    // Try direct model name first
    if let Ok(bpe) = get_bpe_from_model(model) {
        return Some(bpe);
    }

    // Try common model prefixes
    let model_lower = model.to_lowercase();
    if model_lower.contains("gpt-4") || model_lower.contains("gpt4") {
        return get_bpe_from_model("gpt-4").ok();
    }
    if model_lower.contains("gpt-3.5") || model_lower.contains("gpt3") {
        return get_bpe_from_model("gpt-3.5-turbo").ok();
    }

    // Fallback to cl100k_base for unknown models (reasonable default)
    tiktoken_rs::cl100k_base().ok()
}

/// Result of fitting messages into context
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Messages that fit within the budget
    pub messages: Vec<Message>,
    /// Total tokens used
    pub token_count: usize,
    /// Number of messages dropped
    pub messages_dropped: usize,
    /// Tokens available for response
    pub tokens_remaining: usize,
}

/// Builder for `ContextManager`
#[derive(Debug, Clone)]
pub struct ContextManagerBuilder {
    model: Option<String>,
    context_limit: Option<usize>,
    reserve_tokens: usize,
    truncation: TruncationStrategy,
    tokens_per_message: usize,
}

impl Default for ContextManagerBuilder {
    fn default() -> Self {
        Self {
            model: None,
            context_limit: None,
            reserve_tokens: 4000,
            truncation: TruncationStrategy::DropOldest,
            tokens_per_message: 4, // OpenAI format overhead
        }
    }
}

impl ContextManagerBuilder {
    /// Set the model name (auto-detects context limits)
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set explicit context limit (overrides model detection)
    #[must_use]
    pub fn context_limit(mut self, limit: usize) -> Self {
        self.context_limit = Some(limit);
        self
    }

    /// Set tokens to reserve for response
    #[must_use]
    pub fn reserve_tokens(mut self, tokens: usize) -> Self {
        self.reserve_tokens = tokens;
        self
    }

    /// Set truncation strategy
    #[must_use]
    pub fn truncation(mut self, strategy: TruncationStrategy) -> Self {
        self.truncation = strategy;
        self
    }

    /// Set tokens per message overhead
    #[must_use]
    pub fn tokens_per_message(mut self, tokens: usize) -> Self {
        self.tokens_per_message = tokens;
        self
    }

    /// Build the `ContextManager`
    #[must_use]
    pub fn build(self) -> ContextManager {
        let model = self.model.unwrap_or_else(|| "gpt-4".to_string());

        // Resolve model limits
        let (resolved_model, limits) =
            resolve_model(&model).unwrap_or(("gpt-4", ModelLimits::new(8192)));

        // Use explicit limit if provided, otherwise model default
        let context_limit = self.context_limit.unwrap_or(limits.context_window);

        // Get encoder
        let encoder = get_encoder(resolved_model);

        ContextManager {
            model: model.clone(),
            resolved_model: resolved_model.to_string(),
            context_limit,
            reserve_tokens: self.reserve_tokens,
            truncation: self.truncation,
            tokens_per_message: self.tokens_per_message,
            encoder,
            limits,
        }
    }
}

/// Context window manager for LLM applications
///
/// Manages token budgets, counting, and truncation for chat messages.
pub struct ContextManager {
    /// Original model name provided
    model: String,
    /// Resolved model name (for tokenizer selection)
    resolved_model: String,
    /// Maximum context window size
    context_limit: usize,
    /// Tokens reserved for response
    reserve_tokens: usize,
    /// Truncation strategy
    truncation: TruncationStrategy,
    /// Tokens per message overhead
    tokens_per_message: usize,
    /// Tokenizer (optional - falls back to estimation)
    encoder: Option<CoreBPE>,
    /// Model limits
    limits: ModelLimits,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("model", &self.model)
            .field("resolved_model", &self.resolved_model)
            .field("context_limit", &self.context_limit)
            .field("reserve_tokens", &self.reserve_tokens)
            .field("truncation", &self.truncation)
            .field("tokens_per_message", &self.tokens_per_message)
            .field("encoder", &self.encoder.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

impl ContextManager {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> ContextManagerBuilder {
        ContextManagerBuilder::default()
    }

    /// Create a context manager for a specific model
    #[must_use]
    pub fn for_model(model: impl Into<String>) -> Self {
        Self::builder().model(model).build()
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the context limit
    #[must_use]
    pub fn context_limit(&self) -> usize {
        self.context_limit
    }

    /// Get reserved tokens
    #[must_use]
    pub fn reserve_tokens(&self) -> usize {
        self.reserve_tokens
    }

    /// Get available tokens (context limit minus reserved)
    #[must_use]
    pub fn available_tokens(&self) -> usize {
        self.context_limit.saturating_sub(self.reserve_tokens)
    }

    /// Get model limits
    #[must_use]
    pub fn limits(&self) -> ModelLimits {
        self.limits
    }

    /// Count tokens in text
    #[must_use]
    pub fn count_tokens(&self, text: &str) -> usize {
        if let Some(ref encoder) = self.encoder {
            encoder.encode_with_special_tokens(text).len()
        } else {
            // Fallback estimation: ~4 characters per token
            text.len().div_ceil(4)
        }
    }

    /// Count tokens in a message
    #[must_use]
    pub fn count_message_tokens(&self, message: &Message) -> usize {
        let content_tokens = match message {
            Message::Human { content, .. }
            | Message::AI { content, .. }
            | Message::System { content, .. }
            | Message::Tool { content, .. }
            | Message::Function { content, .. } => self.count_content_tokens(content),
        };

        // Add overhead for message structure
        content_tokens + self.tokens_per_message
    }

    /// Count tokens in message content
    fn count_content_tokens(&self, content: &MessageContent) -> usize {
        match content {
            MessageContent::Text(text) => self.count_tokens(text),
            MessageContent::Blocks(blocks) => {
                blocks.iter().map(|b| self.count_block_tokens(b)).sum()
            }
        }
    }

    /// Count tokens in a content block
    fn count_block_tokens(&self, block: &ContentBlock) -> usize {
        match block {
            ContentBlock::Text { text } => self.count_tokens(text),
            ContentBlock::Image { .. } => {
                // Images have fixed token cost (high/low detail)
                // High detail: ~765 tokens, Low: ~85 tokens
                // Default to high estimate
                765
            }
            ContentBlock::ToolUse { name, input, .. } => {
                self.count_tokens(name) + self.count_tokens(&input.to_string())
            }
            ContentBlock::ToolResult { content, .. } => self.count_tokens(content),
            ContentBlock::Reasoning { reasoning } => self.count_tokens(reasoning),
            ContentBlock::Thinking { thinking, .. } => self.count_tokens(thinking),
            ContentBlock::RedactedThinking { data } => self.count_tokens(data),
        }
    }

    /// Count total tokens in a list of messages
    #[must_use]
    pub fn count_messages_tokens(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.count_message_tokens(m))
            .sum::<usize>()
            + 3 // Base overhead for message array
    }

    /// Fit messages into context budget, applying truncation if needed
    ///
    /// Returns the messages that fit and metadata about the operation.
    #[must_use]
    pub fn fit(&self, messages: &[Message]) -> FitResult {
        let available = self.available_tokens();
        let total_tokens = self.count_messages_tokens(messages);

        // If messages fit, return as-is
        if total_tokens <= available {
            return FitResult {
                messages: messages.to_vec(),
                token_count: total_tokens,
                messages_dropped: 0,
                tokens_remaining: available.saturating_sub(total_tokens),
            };
        }

        // Apply truncation strategy
        match self.truncation {
            TruncationStrategy::DropOldest => self.truncate_drop_oldest(messages, available),
            TruncationStrategy::SlidingWindow => self.truncate_sliding_window(messages, available),
            TruncationStrategy::KeepFirstAndLast => {
                self.truncate_keep_first_and_last(messages, available)
            }
        }
    }

    /// Drop oldest messages first (keeps system message and most recent)
    fn truncate_drop_oldest(&self, messages: &[Message], available: usize) -> FitResult {
        if messages.is_empty() {
            return FitResult {
                messages: vec![],
                token_count: 0,
                messages_dropped: 0,
                tokens_remaining: available,
            };
        }

        // Always keep system message if first
        let (system_msg, rest) = if matches!(messages.first(), Some(Message::System { .. })) {
            (Some(&messages[0]), &messages[1..])
        } else {
            (None, messages)
        };

        let mut result = Vec::new();
        let mut tokens_used = 3; // Base overhead

        // Add system message first
        if let Some(sys) = system_msg {
            let sys_tokens = self.count_message_tokens(sys);
            result.push(sys.clone());
            tokens_used += sys_tokens;
        }

        // Add messages from newest to oldest until budget exhausted
        let mut messages_to_add: Vec<&Message> = Vec::new();
        let mut pending_tokens = 0;

        for msg in rest.iter().rev() {
            let msg_tokens = self.count_message_tokens(msg);
            if tokens_used + pending_tokens + msg_tokens <= available {
                pending_tokens += msg_tokens;
                messages_to_add.push(msg);
            } else {
                break;
            }
        }

        // Reverse to restore chronological order
        messages_to_add.reverse();
        for msg in messages_to_add {
            result.push(msg.clone());
        }

        tokens_used += pending_tokens;
        let messages_dropped = messages.len() - result.len();

        FitResult {
            messages: result,
            token_count: tokens_used,
            messages_dropped,
            tokens_remaining: available.saturating_sub(tokens_used),
        }
    }

    /// Sliding window - keep last N tokens worth of messages
    fn truncate_sliding_window(&self, messages: &[Message], available: usize) -> FitResult {
        // Same as drop_oldest for now
        self.truncate_drop_oldest(messages, available)
    }

    /// Keep first (system) and last messages, drop middle
    fn truncate_keep_first_and_last(&self, messages: &[Message], available: usize) -> FitResult {
        if messages.len() <= 2 {
            return self.truncate_drop_oldest(messages, available);
        }

        let first = &messages[0];
        let last = &messages[messages.len() - 1];

        let first_tokens = self.count_message_tokens(first);
        let last_tokens = self.count_message_tokens(last);
        let base_tokens = first_tokens + last_tokens + 3;

        // If first + last don't fit, fall back to drop_oldest
        if base_tokens > available {
            return self.truncate_drop_oldest(messages, available);
        }

        let mut result = vec![first.clone()];
        let mut tokens_used = first_tokens + 3;

        // Try to add messages from the end working backwards
        let middle = &messages[1..messages.len() - 1];
        let mut middle_to_add: Vec<&Message> = Vec::new();
        let mut middle_tokens = 0;

        for msg in middle.iter().rev() {
            let msg_tokens = self.count_message_tokens(msg);
            if tokens_used + middle_tokens + msg_tokens + last_tokens <= available {
                middle_tokens += msg_tokens;
                middle_to_add.push(msg);
            } else {
                break;
            }
        }

        // Add middle messages in chronological order
        middle_to_add.reverse();
        for msg in middle_to_add {
            result.push(msg.clone());
            tokens_used += self.count_message_tokens(msg);
        }

        // Add last message
        result.push(last.clone());
        tokens_used += last_tokens;

        let messages_dropped = messages.len() - result.len();

        FitResult {
            messages: result,
            token_count: tokens_used,
            messages_dropped,
            tokens_remaining: available.saturating_sub(tokens_used),
        }
    }

    /// Check if messages fit within the available budget
    #[must_use]
    pub fn fits(&self, messages: &[Message]) -> bool {
        self.count_messages_tokens(messages) <= self.available_tokens()
    }

    /// Get context usage as a percentage (0.0 to 1.0)
    #[must_use]
    pub fn usage_ratio(&self, messages: &[Message]) -> f64 {
        let tokens = self.count_messages_tokens(messages);
        tokens as f64 / self.context_limit as f64
    }

    // ===== Generic IntoLlmMessage API =====
    //
    // These methods accept any type implementing IntoLlmMessage,
    // enabling token counting for custom message types without conversion.

    /// Count tokens for any message type implementing [`IntoLlmMessage`]
    ///
    /// This is the generic version of [`Self::count_message_tokens`] that works with
    /// custom message types. Applications can implement `IntoLlmMessage` for their
    /// own message types and use this method directly.
    ///
    /// # Example
    ///
    /// ```
    /// use dashflow_context::ContextManager;
    /// use dashflow::core::messages::{IntoLlmMessage, ToolCall};
    ///
    /// struct MyMessage {
    ///     role: String,
    ///     content: String,
    /// }
    ///
    /// impl IntoLlmMessage for MyMessage {
    ///     fn role(&self) -> &str { &self.role }
    ///     fn content(&self) -> &str { &self.content }
    ///     fn tool_calls(&self) -> Option<&[ToolCall]> { None }
    ///     fn tool_call_id(&self) -> Option<&str> { None }
    /// }
    ///
    /// let manager = ContextManager::for_model("gpt-4o");
    /// let msg = MyMessage { role: "user".to_string(), content: "Hello!".to_string() };
    /// let tokens = manager.count_llm_message_tokens(&msg);
    /// ```
    #[must_use]
    pub fn count_llm_message_tokens<M: IntoLlmMessage>(&self, message: &M) -> usize {
        let content_tokens = self.count_tokens(message.content());

        // Add tokens for tool calls if present
        let tool_tokens = if let Some(tool_calls) = message.tool_calls() {
            tool_calls
                .iter()
                .map(|tc| self.count_tokens(&tc.name) + self.count_tokens(&tc.args.to_string()))
                .sum()
        } else {
            0
        };

        // Add overhead for message structure
        content_tokens + tool_tokens + self.tokens_per_message
    }

    /// Count tokens for a slice of messages implementing [`IntoLlmMessage`]
    ///
    /// This is the generic version of [`Self::count_messages_tokens`] that works with
    /// custom message types.
    ///
    /// # Example
    ///
    /// ```
    /// use dashflow_context::ContextManager;
    /// use dashflow::core::messages::{IntoLlmMessage, ToolCall};
    ///
    /// struct MyMessage {
    ///     role: String,
    ///     content: String,
    /// }
    ///
    /// impl IntoLlmMessage for MyMessage {
    ///     fn role(&self) -> &str { &self.role }
    ///     fn content(&self) -> &str { &self.content }
    ///     fn tool_calls(&self) -> Option<&[ToolCall]> { None }
    ///     fn tool_call_id(&self) -> Option<&str> { None }
    /// }
    ///
    /// let manager = ContextManager::for_model("gpt-4o");
    /// let messages = vec![
    ///     MyMessage { role: "system".to_string(), content: "You are helpful".to_string() },
    ///     MyMessage { role: "user".to_string(), content: "Hello!".to_string() },
    /// ];
    /// let total_tokens = manager.count_llm_messages_tokens(&messages);
    /// ```
    #[must_use]
    pub fn count_llm_messages_tokens<M: IntoLlmMessage>(&self, messages: &[M]) -> usize {
        messages
            .iter()
            .map(|m| self.count_llm_message_tokens(m))
            .sum::<usize>()
            + 3 // Base overhead for message array
    }

    /// Check if messages implementing [`IntoLlmMessage`] fit within the available budget
    #[must_use]
    pub fn fits_llm_messages<M: IntoLlmMessage>(&self, messages: &[M]) -> bool {
        self.count_llm_messages_tokens(messages) <= self.available_tokens()
    }
}
