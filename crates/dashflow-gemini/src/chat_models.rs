//! Google Gemini chat models implementation

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use dashflow::core::{
    callbacks::CallbackManager,
    config_loader::env_vars::{env_string, GEMINI_API_KEY},
    error::Error as DashFlowError,
    language_models::{
        ChatGeneration, ChatGenerationChunk, ChatModel, ChatResult, ToolChoice, ToolDefinition,
    },
    messages::{AIMessage, AIMessageChunk, BaseMessage, Message, MessageContent, ToolCall},
    rate_limiters::RateLimiter,
    retry::{with_retry, RetryPolicy},
    usage::UsageMetadata,
};
use eventsource_stream::Eventsource;
use futures::stream::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini chat model
///
/// Supports Gemini 2.0 Flash, Pro, and other models with streaming,
/// function calling, and multimodal capabilities.
///
/// # Example
///
/// ```no_run
/// use dashflow_gemini::ChatGemini;
/// use dashflow::core::messages::Message;
/// use dashflow::core::language_models::ChatModel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let model = ChatGemini::new()
///     .with_api_key(std::env::var("GEMINI_API_KEY")?)
///     .with_model("gemini-2.0-flash-exp");
///
/// let messages = vec![Message::human("Hello!")];
/// let response = model.generate(&messages, None, None, None, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatGemini {
    /// API key for authentication
    api_key: Option<String>,
    /// Model name (e.g., "gemini-2.0-flash-exp")
    model: String,
    /// HTTP client
    client: Client,
    /// Temperature for sampling (0.0 to 2.0)
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
    /// Top-p sampling parameter
    top_p: Option<f32>,
    /// Top-k sampling parameter
    top_k: Option<u32>,
    /// System instruction for the model
    system_instruction: Option<String>,
    /// Safety settings
    safety_settings: Vec<SafetySettings>,
    /// Enable thinking mode (extended reasoning)
    enable_thinking: bool,
    /// Retry policy for API calls
    retry_policy: RetryPolicy,
    /// Optional rate limiter to control request rate
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

// Custom Debug to prevent API key exposure in logs
impl std::fmt::Debug for ChatGemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGemini")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("client", &"[reqwest::Client]")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("system_instruction", &self.system_instruction)
            .field("safety_settings", &self.safety_settings)
            .field("enable_thinking", &self.enable_thinking)
            .field("retry_policy", &self.retry_policy)
            .field("rate_limiter", &self.rate_limiter.as_ref().map(|_| "[RateLimiter]"))
            .finish()
    }
}

impl ChatGemini {
    /// Creates a new `ChatGemini` instance with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: env_string(GEMINI_API_KEY),
            model: DEFAULT_MODEL.to_string(),
            client: Client::new(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
            system_instruction: None,
            safety_settings: Vec::new(),
            enable_thinking: false,
            retry_policy: RetryPolicy::exponential(3),
            rate_limiter: None,
        }
    }

    /// Sets the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model name
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature (0.0 to 2.0)
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of tokens to generate
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the top-p sampling parameter
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets the top-k sampling parameter
    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the system instruction
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Adds a safety setting
    #[must_use]
    pub fn with_safety_setting(mut self, setting: SafetySettings) -> Self {
        self.safety_settings.push(setting);
        self
    }

    /// Enables thinking mode (extended reasoning)
    #[must_use]
    pub fn with_thinking(mut self, enable: bool) -> Self {
        self.enable_thinking = enable;
        self
    }

    /// Set the retry policy for API calls
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_gemini::ChatGemini;
    /// use dashflow::core::retry::RetryPolicy;
    ///
    /// let model = ChatGemini::new()
    ///     .with_retry_policy(RetryPolicy::exponential(5));
    /// ```
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set a rate limiter to control request rate
    ///
    /// # Example
    /// ```no_run
    /// use dashflow_gemini::ChatGemini;
    /// use dashflow::core::rate_limiters::InMemoryRateLimiter;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let rate_limiter = InMemoryRateLimiter::new(
    ///     10.0,                        // 10 requests per second
    ///     Duration::from_millis(100),  // check every 100ms
    ///     20.0,                        // max bucket size
    /// );
    ///
    /// let model = ChatGemini::new()
    ///     .with_rate_limiter(Arc::new(rate_limiter));
    /// # }
    /// ```
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Builds the API endpoint URL
    fn endpoint(&self, streaming: bool) -> String {
        let method = if streaming {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        format!("{}/models/{}:{}", API_BASE, self.model, method)
    }

    /// Creates a request builder with authentication
    fn request(&self, url: &str) -> Result<reqwest::RequestBuilder, DashFlowError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| {
                DashFlowError::authentication(
                    "API key is required. Set it with with_api_key() or the GEMINI_API_KEY environment variable",
                )
            })?;

        Ok(self.client.post(url).header("x-goog-api-key", api_key))
    }

    /// Converts `DashFlow` messages to Gemini API format
    fn convert_messages(
        &self,
        messages: &[BaseMessage],
    ) -> Result<Vec<GeminiContent>, DashFlowError> {
        let mut gemini_contents = Vec::new();

        for message in messages {
            match message {
                Message::System { .. } => {
                    // System messages handled separately in system_instruction
                    continue;
                }
                Message::Human { content, .. } => {
                    let text = content.as_text();
                    let parts = vec![GeminiPart {
                        text: Some(text),
                        inline_data: None,
                        function_call: None,
                        function_response: None,
                    }];

                    gemini_contents.push(GeminiContent {
                        role: "user".to_string(),
                        parts,
                    });
                }
                Message::AI {
                    content,
                    tool_calls,
                    ..
                } => {
                    let mut parts = Vec::new();

                    // Add text content
                    let text = content.as_text();
                    if !text.is_empty() {
                        parts.push(GeminiPart {
                            text: Some(text),
                            inline_data: None,
                            function_call: None,
                            function_response: None,
                        });
                    }

                    // Add tool calls
                    for tool_call in tool_calls {
                        parts.push(GeminiPart {
                            text: None,
                            inline_data: None,
                            function_call: Some(GeminiFunctionCall {
                                name: tool_call.name.clone(),
                                args: tool_call.args.clone(),
                            }),
                            function_response: None,
                        });
                    }

                    gemini_contents.push(GeminiContent {
                        role: "model".to_string(),
                        parts,
                    });
                }
                Message::Tool {
                    content,
                    tool_call_id,
                    ..
                } => {
                    // Tool results need to be sent back as function responses
                    let parts = vec![GeminiPart {
                        text: None,
                        inline_data: None,
                        function_call: None,
                        function_response: Some(GeminiFunctionResponse {
                            name: tool_call_id.clone(),
                            response: serde_json::json!({ "result": content.as_text() }),
                        }),
                    }];

                    gemini_contents.push(GeminiContent {
                        role: "function".to_string(),
                        parts,
                    });
                }
                Message::Function { content, name, .. } => {
                    // Function messages - legacy format similar to Tool
                    let parts = vec![GeminiPart {
                        text: None,
                        inline_data: None,
                        function_call: None,
                        function_response: Some(GeminiFunctionResponse {
                            name: name.clone(),
                            response: serde_json::json!({ "result": content.as_text() }),
                        }),
                    }];

                    gemini_contents.push(GeminiContent {
                        role: "function".to_string(),
                        parts,
                    });
                }
            }
        }

        Ok(gemini_contents)
    }

    /// Builds the request payload
    fn build_request(
        &self,
        messages: &[BaseMessage],
        stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<GeminiRequest, DashFlowError> {
        let contents = self.convert_messages(messages)?;

        // Build generation config
        let generation_config = GeminiGenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
            top_p: self.top_p,
            top_k: self.top_k,
            stop_sequences: stop.map(<[std::string::String]>::to_vec),
        };

        // Convert tools to function declarations
        let tool_config = tools.map(|tools_slice| {
            let function_declarations: Vec<_> = tools_slice
                .iter()
                .map(|tool| GeminiFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect();

            vec![GeminiTool {
                function_declarations,
            }]
        });

        // Build system instruction
        let system_instruction = if let Some(inst) = &self.system_instruction {
            Some(GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(inst.clone()),
                    inline_data: None,
                    function_call: None,
                    function_response: None,
                }],
            })
        } else {
            // Check for system messages in input
            messages.iter().find_map(|msg| {
                if let Message::System { content, .. } = msg {
                    Some(GeminiContent {
                        role: "user".to_string(),
                        parts: vec![GeminiPart {
                            text: Some(content.as_text()),
                            inline_data: None,
                            function_call: None,
                            function_response: None,
                        }],
                    })
                } else {
                    None
                }
            })
        };

        Ok(GeminiRequest {
            contents,
            generation_config: Some(generation_config),
            safety_settings: if self.safety_settings.is_empty() {
                None
            } else {
                Some(self.safety_settings.clone())
            },
            tools: tool_config,
            system_instruction,
        })
    }

    /// Parses the response from Gemini API
    fn parse_response(&self, response: GeminiResponse) -> Result<ChatResult, DashFlowError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| DashFlowError::api_format("No candidates in response"))?;

        let content = candidate.content;
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();

        for part in content.parts {
            if let Some(text) = part.text {
                text_parts.push(text);
            }
            if let Some(function_call) = part.function_call {
                tool_calls.push(ToolCall {
                    id: Uuid::new_v4().to_string(),
                    name: function_call.name,
                    args: function_call.args,
                    tool_type: "tool_call".to_string(),
                    index: None,
                });
            }
        }

        let message_content = text_parts.join("");

        // Extract token usage (clone to use twice)
        let usage_metadata = response.usage_metadata.as_ref().map(|usage| UsageMetadata {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
            input_token_details: None,
            output_token_details: None,
        });

        // Build response metadata
        let mut response_metadata = HashMap::new();
        if let Some(finish_reason) = candidate.finish_reason {
            response_metadata.insert(
                "finish_reason".to_string(),
                serde_json::json!(finish_reason),
            );
        }

        // Create AI message
        let ai_message = AIMessage::new(MessageContent::Text(message_content))
            .with_tool_calls(tool_calls.clone());

        let ai_message = if let Some(usage) = usage_metadata {
            ai_message.with_usage(usage)
        } else {
            ai_message
        };

        // Convert to Message enum
        let mut message = Message::from(ai_message);
        message.fields_mut().response_metadata = response_metadata;

        // Build generation_info
        let mut generation_info = HashMap::new();
        if let Some(usage) = &response.usage_metadata {
            generation_info.insert(
                "usage".to_string(),
                serde_json::json!({
                    "prompt_token_count": usage.prompt_token_count,
                    "candidates_token_count": usage.candidates_token_count,
                    "total_token_count": usage.total_token_count,
                }),
            );
        }

        let generation = ChatGeneration {
            message,
            generation_info: Some(generation_info),
        };

        Ok(ChatResult {
            generations: vec![generation],
            llm_output: None,
        })
    }
}

impl Default for ChatGemini {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for ChatGemini {
    async fn _generate(
        &self,
        messages: &[BaseMessage],
        stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        _tool_choice: Option<&ToolChoice>,
        _run_manager: Option<&CallbackManager>,
    ) -> Result<ChatResult, DashFlowError> {
        let request = self.build_request(messages, stop, tools)?;
        let url = self.endpoint(false);

        // Clone necessary data for retry closure
        let api_key = self.api_key.clone();
        let client = self.client.clone();

        // Make API call with retry
        let gemini_response = with_retry(&self.retry_policy, move || {
            let api_key = api_key.clone();
            let client = client.clone();
            let url = url.clone();
            let request = request.clone();
            async move {
                let request_builder = match &api_key {
                    Some(key) => client.post(&url).header("x-goog-api-key", key),
                    None => {
                        return Err(DashFlowError::authentication(
                            "API key is required. Set it with with_api_key() or the GEMINI_API_KEY environment variable",
                        ))
                    }
                };

                let response = request_builder
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| DashFlowError::api(format!("HTTP request failed: {e}")))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(DashFlowError::api(format!(
                        "Gemini API error ({status}): {error_text}"
                    )));
                }

                response
                    .json::<GeminiResponse>()
                    .await
                    .map_err(|e| DashFlowError::api_format(format!("Failed to parse response: {e}")))
            }
        })
        .await?;

        self.parse_response(gemini_response)
    }

    async fn _stream(
        &self,
        messages: &[BaseMessage],
        stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        _tool_choice: Option<&ToolChoice>,
        _run_manager: Option<&CallbackManager>,
    ) -> Result<
        Pin<Box<dyn Stream<Item = Result<ChatGenerationChunk, DashFlowError>> + Send + 'static>>,
        DashFlowError,
    > {
        let request = self.build_request(messages, stop, tools)?;
        let url = self.endpoint(true);

        let response = self
            .request(&url)?
            .json(&request)
            .send()
            .await
            .map_err(|e| DashFlowError::api(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DashFlowError::api(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        // Gemini uses Server-Sent Events for streaming
        let byte_stream = response.bytes_stream();
        let event_stream = byte_stream.eventsource();

        let chunk_stream = stream! {
            use futures::StreamExt;

            let mut event_stream = event_stream;
            while let Some(event_result) = event_stream.next().await {
                match event_result {
                    Ok(event) => {
                        // Parse the JSON data
                        if let Ok(response) = serde_json::from_str::<GeminiResponse>(&event.data) {
                            // Extract text from first candidate
                            if let Some(candidate) = response.candidates.first() {
                                for part in &candidate.content.parts {
                                    if let Some(text) = &part.text {
                                        let chunk = AIMessageChunk::new(text.clone());
                                        yield Ok(ChatGenerationChunk::new(chunk));
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(DashFlowError::other(format!("SSE stream error: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(chunk_stream))
    }

    fn llm_type(&self) -> &'static str {
        "gemini"
    }

    fn rate_limiter(&self) -> Option<Arc<dyn RateLimiter>> {
        self.rate_limiter.clone()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Gemini API request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySettings>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

/// Gemini content (message)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

/// Gemini content part (text, image, function call, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

/// Inline data (images, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String, // Base64 encoded
}

/// Function call from the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: JsonValue,
}

/// Function response back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: JsonValue,
}

/// Generation configuration
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

/// Tool configuration (function declarations)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

/// Function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: JsonValue,
}

/// Safety settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SafetySettings {
    pub category: SafetyCategory,
    pub threshold: SafetyThreshold,
}

/// Safety categories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyCategory {
    HarmCategoryUnspecified,
    HarmCategoryDerogatory,
    HarmCategoryToxicity,
    HarmCategoryViolence,
    HarmCategorySexual,
    HarmCategoryMedical,
    HarmCategoryDangerous,
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

/// Safety thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    HarmBlockThresholdUnspecified,
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

/// Gemini API response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

/// Response candidate
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token usage metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: u32,
    candidates_token_count: u32,
    total_token_count: u32,
}
