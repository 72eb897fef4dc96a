//! `DeepSeek` chat models implementation
//!
//! `DeepSeek` provides an OpenAI-compatible API, so this module wraps
//! the `ChatOpenAI` implementation with DeepSeek-specific defaults.

use crate::DEEPSEEK_DEFAULT_API_BASE;

use async_openai::config::OpenAIConfig;
use async_trait::async_trait;
use dashflow::core::{
    callbacks::CallbackManager,
    config_loader::env_vars::{env_string_or_default, DEEPSEEK_API_BASE, DEEPSEEK_API_KEY},
    error::Error as DashFlowError,
    language_models::{ChatGenerationChunk, ChatModel, ChatResult, ToolChoice, ToolDefinition},
    messages::BaseMessage,
    rate_limiters::RateLimiter,
    serialization::Serializable,
};
use dashflow_openai::ChatOpenAI;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

/// `DeepSeek` model names
pub mod models {
    pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
    pub const DEEPSEEK_CODER: &str = "deepseek-coder";
}

/// `DeepSeek` chat model client
///
/// This is a thin wrapper around `ChatOpenAI` that sets DeepSeek-specific defaults.
/// `DeepSeek`'s API is fully compatible with `OpenAI`'s API.
#[derive(Clone)]
pub struct ChatDeepSeek {
    inner: ChatOpenAI,
}

impl ChatDeepSeek {
    /// Create a new `ChatDeepSeek` instance with default settings
    #[deprecated(
        since = "1.0.1",
        note = "Use `dashflow_deepseek::build_chat_model(&config)` for config-driven instantiation"
    )]
    #[must_use]
    pub fn new() -> Self {
        let api_key = env_string_or_default(DEEPSEEK_API_KEY, "");
        let api_base = env_string_or_default(DEEPSEEK_API_BASE, DEEPSEEK_DEFAULT_API_BASE);

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        let inner = ChatOpenAI::with_config(config).with_model(models::DEEPSEEK_CHAT);

        Self { inner }
    }

    /// Create with custom API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let api_base = env_string_or_default(DEEPSEEK_API_BASE, DEEPSEEK_DEFAULT_API_BASE);

        let config = OpenAIConfig::new()
            .with_api_key(api_key.into())
            .with_api_base(api_base);

        let inner = ChatOpenAI::with_config(config).with_model(models::DEEPSEEK_CHAT);

        Self { inner }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.inner = self.inner.with_model(model);
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.inner = self.inner.with_temperature(temperature);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.inner = self.inner.with_max_tokens(max_tokens);
        self
    }

    /// Set top-p sampling
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.inner = self.inner.with_top_p(top_p);
        self
    }

    /// Set frequency penalty
    #[must_use]
    pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.inner = self.inner.with_frequency_penalty(frequency_penalty);
        self
    }

    /// Set presence penalty
    #[must_use]
    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.inner = self.inner.with_presence_penalty(presence_penalty);
        self
    }

    /// Set rate limiter
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.inner = self.inner.with_rate_limiter(rate_limiter);
        self
    }

    /// Get a reference to the underlying `ChatOpenAI` instance
    #[must_use]
    pub fn inner(&self) -> &ChatOpenAI {
        &self.inner
    }

    /// Get a mutable reference to the underlying `ChatOpenAI` instance
    pub fn inner_mut(&mut self) -> &mut ChatOpenAI {
        &mut self.inner
    }

    /// Convert into the underlying `ChatOpenAI` instance
    #[must_use]
    pub fn into_inner(self) -> ChatOpenAI {
        self.inner
    }
}

#[allow(deprecated, clippy::disallowed_methods)]
impl Default for ChatDeepSeek {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for ChatDeepSeek {
    async fn _generate(
        &self,
        messages: &[BaseMessage],
        stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        tool_choice: Option<&ToolChoice>,
        run_manager: Option<&CallbackManager>,
    ) -> Result<ChatResult, DashFlowError> {
        self.inner
            ._generate(messages, stop, tools, tool_choice, run_manager)
            .await
    }

    async fn _stream(
        &self,
        messages: &[BaseMessage],
        stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        tool_choice: Option<&ToolChoice>,
        run_manager: Option<&CallbackManager>,
    ) -> Result<
        Pin<Box<dyn Stream<Item = Result<ChatGenerationChunk, DashFlowError>> + Send>>,
        DashFlowError,
    > {
        self.inner
            ._stream(messages, stop, tools, tool_choice, run_manager)
            .await
    }

    fn llm_type(&self) -> &'static str {
        "deepseek"
    }

    fn rate_limiter(&self) -> Option<Arc<dyn RateLimiter>> {
        self.inner.rate_limiter()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl Serializable for ChatDeepSeek {
    fn lc_id(&self) -> Vec<String> {
        vec![
            "dashflow".to_string(),
            "chat_models".to_string(),
            "deepseek".to_string(),
            "ChatDeepSeek".to_string(),
        ]
    }

    fn is_lc_serializable(&self) -> bool {
        true
    }

    fn to_json(&self) -> dashflow::core::serialization::SerializedObject {
        // Delegate to inner OpenAI client but override the lc_id
        self.inner.to_json()
    }

    fn lc_secrets(&self) -> HashMap<String, String> {
        let mut secrets = HashMap::new();
        secrets.insert("api_key".to_string(), "DEEPSEEK_API_KEY".to_string());
        secrets
    }
}
