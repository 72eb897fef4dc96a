//! AWS Bedrock chat models implementation
//!
//! This module provides integration with AWS Bedrock's foundation models.

use async_stream::stream;
use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_bedrockruntime::{
    operation::converse::ConverseOutput,
    types::{
        ContentBlock as BedrockContentBlock, ConversationRole,
        ConverseStreamOutput as BedrockStreamEvent, Message as BedrockMessage, SystemContentBlock,
        Tool as BedrockTool, ToolChoice as BedrockToolChoice, ToolConfiguration, ToolInputSchema,
        ToolResultBlock, ToolResultContentBlock, ToolResultStatus, ToolSpecification, ToolUseBlock,
    },
    Client as BedrockClient,
};
use aws_smithy_types::Document;
use dashflow::core::{
    callbacks::CallbackManager,
    config::RunnableConfig,
    error::Error as DashFlowError,
    language_models::{
        ChatGeneration, ChatGenerationChunk, ChatModel, ChatResult, ToolChoice, ToolDefinition,
    },
    messages::{AIMessage, AIMessageChunk, Message, ToolCall},
    rate_limiters::RateLimiter,
    runnable::Runnable,
    serialization::{Serializable, SerializedObject},
    usage::UsageMetadata,
};
use futures::stream::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

/// Bedrock model identifiers
pub mod models {
    // Claude models
    /// Claude Sonnet 4.5 model identifier (newest, most capable Claude model as of 2025)
    pub const CLAUDE_SONNET_4_5: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";
    /// Claude 3.5 Sonnet v2 model identifier (released October 2024)
    pub const CLAUDE_3_5_SONNET_V2: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";
    /// Claude 3.5 Sonnet model identifier (released June 2024)
    pub const CLAUDE_3_5_SONNET: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";
    /// Claude 3.5 Haiku model identifier (fast, cost-effective model)
    pub const CLAUDE_3_5_HAIKU: &str = "anthropic.claude-3-5-haiku-20241022-v1:0";
    /// Claude 3 Opus model identifier (most capable Claude 3 model)
    pub const CLAUDE_3_OPUS: &str = "anthropic.claude-3-opus-20240229-v1:0";
    /// Claude 3 Sonnet model identifier (balanced performance)
    pub const CLAUDE_3_SONNET: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
    /// Claude 3 Haiku model identifier (fastest Claude 3 model)
    pub const CLAUDE_3_HAIKU: &str = "anthropic.claude-3-haiku-20240307-v1:0";
    /// Claude 2.1 model identifier (legacy model)
    pub const CLAUDE_2_1: &str = "anthropic.claude-v2:1";
    /// Claude 2 model identifier (legacy model)
    pub const CLAUDE_2: &str = "anthropic.claude-v2";

    // Llama models
    /// Llama 3.3 70B Instruct model identifier
    pub const LLAMA_3_3_70B: &str = "us.meta.llama3-3-70b-instruct-v1:0";
    /// Llama 3.2 90B Instruct model identifier
    pub const LLAMA_3_2_90B: &str = "us.meta.llama3-2-90b-instruct-v1:0";
    /// Llama 3.2 11B Instruct model identifier
    pub const LLAMA_3_2_11B: &str = "us.meta.llama3-2-11b-instruct-v1:0";
    /// Llama 3.2 3B Instruct model identifier
    pub const LLAMA_3_2_3B: &str = "us.meta.llama3-2-3b-instruct-v1:0";
    /// Llama 3.2 1B Instruct model identifier
    pub const LLAMA_3_2_1B: &str = "us.meta.llama3-2-1b-instruct-v1:0";
    /// Llama 3.1 405B Instruct model identifier (largest Llama 3.1 model)
    pub const LLAMA_3_1_405B: &str = "us.meta.llama3-1-405b-instruct-v1:0";
    /// Llama 3.1 70B Instruct model identifier
    pub const LLAMA_3_1_70B: &str = "us.meta.llama3-1-70b-instruct-v1:0";
    /// Llama 3.1 8B Instruct model identifier
    pub const LLAMA_3_1_8B: &str = "us.meta.llama3-1-8b-instruct-v1:0";

    // Mistral models
    /// Mistral Large 2407 model identifier (released July 2024)
    pub const MISTRAL_LARGE_2407: &str = "mistral.mistral-large-2407-v1:0";
    /// Mistral Large 2402 model identifier (released February 2024)
    pub const MISTRAL_LARGE_2402: &str = "mistral.mistral-large-2402-v1:0";
    /// Mistral Small model identifier (cost-effective model)
    pub const MISTRAL_SMALL: &str = "mistral.mistral-small-2402-v1:0";
    /// Mixtral 8x7B Instruct model identifier (mixture-of-experts model)
    pub const MIXTRAL_8X7B: &str = "mistral.mixtral-8x7b-instruct-v0:1";

    // Cohere models
    /// Cohere Command R+ model identifier (most capable Cohere model)
    pub const COHERE_COMMAND_R_PLUS: &str = "cohere.command-r-plus-v1:0";
    /// Cohere Command R model identifier
    pub const COHERE_COMMAND_R: &str = "cohere.command-r-v1:0";

    // Amazon Titan models
    /// Amazon Titan Text Premier model identifier (most capable Titan model)
    pub const TITAN_TEXT_PREMIER: &str = "amazon.titan-text-premier-v1:0";
    /// Amazon Titan Text Express model identifier (balanced performance)
    pub const TITAN_TEXT_EXPRESS: &str = "amazon.titan-text-express-v1";
    /// Amazon Titan Text Lite model identifier (fastest, most cost-effective)
    pub const TITAN_TEXT_LITE: &str = "amazon.titan-text-lite-v1";
}

/// AWS Bedrock chat model
///
/// # Example
///
/// ```no_run
/// use dashflow_bedrock::ChatBedrock;
/// use dashflow::core::messages::Message;
/// use dashflow::core::language_models::ChatModel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let model = ChatBedrock::new("us-east-1")
///     .await?
///     .with_model("anthropic.claude-3-5-sonnet-20241022-v2:0");
///
/// let messages = vec![Message::human("What is AWS Bedrock?")];
/// let response = model.generate(&messages, None, None, None, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatBedrock {
    client: BedrockClient,
    model_id: String,
    region: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    stop_sequences: Option<Vec<String>>,
    tools: Option<Vec<serde_json::Value>>,
    tool_choice: Option<String>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl ChatBedrock {
    /// Create a new `ChatBedrock` instance with specified region
    ///
    /// Uses standard AWS SDK authentication chain:
    /// - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
    /// - AWS credentials file (~/.aws/credentials)
    /// - IAM instance profile (for EC2/ECS)
    /// - IAM role (for Lambda)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dashflow_bedrock::ChatBedrock;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let bedrock = ChatBedrock::new("us-east-1").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(region: impl Into<String>) -> Result<Self, anyhow::Error> {
        let region_str = region.into();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region_str.clone()))
            .load()
            .await;

        let client = BedrockClient::new(&config);

        Ok(Self {
            client,
            model_id: models::CLAUDE_3_5_SONNET_V2.to_string(),
            region: region_str,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
            rate_limiter: None,
        })
    }

    /// Set the model ID
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dashflow_bedrock::ChatBedrock;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let bedrock = ChatBedrock::new("us-east-1")
    ///     .await?
    ///     .with_model("anthropic.claude-3-5-sonnet-20241022-v2:0");
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set temperature (0.0 to 1.0)
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set `top_p` (nucleus sampling)
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set `max_tokens`
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set stop sequences
    #[must_use]
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    /// Bind tools to the model
    ///
    /// Tools must have `name`, `description`, and `input_schema` fields.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dashflow_bedrock::ChatBedrock;
    /// # use serde_json::json;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let tool = json!({
    ///     "name": "get_weather",
    ///     "description": "Get weather for a location",
    ///     "input_schema": {
    ///         "type": "object",
    ///         "properties": {
    ///             "location": { "type": "string" }
    ///         },
    ///         "required": ["location"]
    ///     }
    /// });
    ///
    /// let bedrock = ChatBedrock::new("us-east-1")
    ///     .await?
    ///     .bind_tools(vec![tool]);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn bind_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    ///
    /// Options: "auto", "any", or specific tool name
    pub fn with_tool_choice(mut self, tool_choice: impl Into<String>) -> Self {
        self.tool_choice = Some(tool_choice.into());
        self
    }

    /// Set rate limiter
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Convert `DashFlow` messages to Bedrock format
    fn convert_messages(
        &self,
        messages: &[Message],
    ) -> Result<(Vec<BedrockMessage>, Option<Vec<SystemContentBlock>>), DashFlowError> {
        let mut system_messages = Vec::new();
        let mut conversation_messages = Vec::new();

        for message in messages {
            match message {
                Message::System { content, .. } => {
                    system_messages.push(SystemContentBlock::Text(content.as_text()));
                }
                Message::Human { content, .. } => {
                    conversation_messages.push(
                        BedrockMessage::builder()
                            .role(ConversationRole::User)
                            .content(BedrockContentBlock::Text(content.as_text()))
                            .build()
                            .map_err(|e| DashFlowError::other(e.to_string()))?,
                    );
                }
                Message::AI {
                    content,
                    tool_calls,
                    ..
                } => {
                    let mut content_blocks = Vec::new();

                    // Add text content if present
                    let text_content = content.as_text();
                    if !text_content.is_empty() {
                        content_blocks.push(BedrockContentBlock::Text(text_content));
                    }

                    // Add tool calls if present
                    for tool_call in tool_calls {
                        let input_doc = json_to_document(&tool_call.args)?;
                        content_blocks.push(BedrockContentBlock::ToolUse(
                            ToolUseBlock::builder()
                                .tool_use_id(&tool_call.id)
                                .name(&tool_call.name)
                                .input(input_doc)
                                .build()
                                .map_err(|e| DashFlowError::other(e.to_string()))?,
                        ));
                    }

                    if content_blocks.is_empty() {
                        content_blocks.push(BedrockContentBlock::Text(String::new()));
                    }

                    let mut builder = BedrockMessage::builder().role(ConversationRole::Assistant);
                    for block in content_blocks {
                        builder = builder.content(block);
                    }
                    conversation_messages.push(
                        builder
                            .build()
                            .map_err(|e| DashFlowError::other(e.to_string()))?,
                    );
                }
                Message::Tool {
                    content,
                    tool_call_id,
                    ..
                } => {
                    let tool_result = ToolResultBlock::builder()
                        .tool_use_id(tool_call_id)
                        .content(ToolResultContentBlock::Text(content.as_text()))
                        .status(ToolResultStatus::Success)
                        .build()
                        .map_err(|e| DashFlowError::other(e.to_string()))?;

                    conversation_messages.push(
                        BedrockMessage::builder()
                            .role(ConversationRole::User)
                            .content(BedrockContentBlock::ToolResult(tool_result))
                            .build()
                            .map_err(|e| DashFlowError::other(e.to_string()))?,
                    );
                }
                _ => {}
            }
        }

        let system = if system_messages.is_empty() {
            None
        } else {
            Some(system_messages)
        };

        Ok((conversation_messages, system))
    }

    /// Convert tools to Bedrock format
    ///
    /// Takes tools from parameters if provided, otherwise falls back to internal fields.
    /// This allows both the new standard API (via parameters) and legacy API (via struct fields).
    fn convert_tools(
        &self,
        tools: Option<&[ToolDefinition]>,
        tool_choice: Option<&ToolChoice>,
    ) -> Result<Option<ToolConfiguration>, DashFlowError> {
        // Use provided tools if available, otherwise fall back to internal fields
        let tools_source = if let Some(tool_defs) = tools {
            // Convert ToolDefinition to serde_json::Value for processing
            let tools_json: Vec<serde_json::Value> = tool_defs
                .iter()
                .map(|def| {
                    serde_json::json!({
                        "name": def.name,
                        "description": def.description,
                        "input_schema": def.parameters,
                    })
                })
                .collect();
            Some(tools_json)
        } else {
            // Fall back to internal fields for backward compatibility
            self.tools.clone()
        };

        if let Some(tools) = tools_source {
            let mut bedrock_tools = Vec::new();

            for tool in tools {
                let name = tool["name"]
                    .as_str()
                    .ok_or_else(|| DashFlowError::other("Tool missing 'name' field".to_string()))?;
                let description = tool["description"].as_str();
                let input_schema = &tool["input_schema"];

                let schema_doc = json_to_document(input_schema)?;

                let mut spec_builder = ToolSpecification::builder()
                    .name(name)
                    .input_schema(ToolInputSchema::Json(schema_doc));

                if let Some(desc) = description {
                    spec_builder = spec_builder.description(desc);
                }

                let spec = spec_builder
                    .build()
                    .map_err(|e| DashFlowError::other(e.to_string()))?;

                bedrock_tools.push(BedrockTool::ToolSpec(spec));
            }

            let mut config_builder = ToolConfiguration::builder().set_tools(Some(bedrock_tools));

            // Set tool choice if specified (from parameter or internal field)
            // Need to create owned value to avoid lifetime issues
            let choice_from_string = self.tool_choice.as_ref().map(|s| {
                // Convert internal String to ToolChoice for consistent handling
                match s.as_str() {
                    "auto" => ToolChoice::Auto,
                    "none" => ToolChoice::None,
                    "any" | "required" => ToolChoice::Required,
                    name => ToolChoice::Specific(name.to_string()),
                }
            });
            let choice_source = tool_choice.or(choice_from_string.as_ref());

            if let Some(choice) = choice_source {
                let bedrock_choice = match choice {
                    ToolChoice::Auto => BedrockToolChoice::Auto(
                        aws_sdk_bedrockruntime::types::AutoToolChoice::builder().build(),
                    ),
                    ToolChoice::None => {
                        // Bedrock doesn't have explicit "none" - just don't set tool_choice
                        // Return config without tool_choice set
                        return Ok(Some(
                            config_builder
                                .build()
                                .map_err(|e| DashFlowError::other(e.to_string()))?,
                        ));
                    }
                    ToolChoice::Required => BedrockToolChoice::Any(
                        aws_sdk_bedrockruntime::types::AnyToolChoice::builder().build(),
                    ),
                    ToolChoice::Specific(name) => BedrockToolChoice::Tool(
                        aws_sdk_bedrockruntime::types::SpecificToolChoice::builder()
                            .name(name)
                            .build()
                            .map_err(|e| DashFlowError::other(e.to_string()))?,
                    ),
                };
                config_builder = config_builder.tool_choice(bedrock_choice);
            }

            Ok(Some(
                config_builder
                    .build()
                    .map_err(|e| DashFlowError::other(e.to_string()))?,
            ))
        } else {
            Ok(None)
        }
    }

    /// Convert Bedrock response to `ChatResult`
    fn convert_response(&self, output: ConverseOutput) -> Result<ChatResult, DashFlowError> {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(aws_sdk_bedrockruntime::types::ConverseOutput::Message(message)) = output.output
        {
            for block in message.content {
                match block {
                    BedrockContentBlock::Text(text) => {
                        content.push_str(&text);
                    }
                    BedrockContentBlock::ToolUse(tool_use) => {
                        let args = document_to_json(tool_use.input)?;
                        tool_calls.push(ToolCall {
                            id: tool_use.tool_use_id,
                            name: tool_use.name,
                            args,
                            tool_type: "tool_call".to_string(),
                            index: None,
                        });
                    }
                    other => {
                        tracing::debug!(
                            content_block = ?other,
                            "Ignoring unhandled Bedrock content block type in response"
                        );
                    }
                }
            }
        }

        // Build usage metadata
        let usage_metadata = output.usage.map(|usage| UsageMetadata {
            input_tokens: usage.input_tokens as u32,
            output_tokens: usage.output_tokens as u32,
            total_tokens: (usage.input_tokens + usage.output_tokens) as u32,
            input_token_details: None,
            output_token_details: None,
        });

        // Create AI message with tool calls and usage
        let mut ai_message = AIMessage::new(content).with_tool_calls(tool_calls);
        if let Some(usage) = usage_metadata {
            ai_message = ai_message.with_usage(usage);
        }

        // Convert to Message enum
        let mut message = Message::from(ai_message);

        // Add response metadata
        let fields = message.fields_mut();
        fields.response_metadata.insert(
            "stop_reason".to_string(),
            serde_json::json!(format!("{:?}", output.stop_reason)),
        );
        fields
            .response_metadata
            .insert("model".to_string(), serde_json::json!(self.model_id));

        Ok(ChatResult {
            generations: vec![ChatGeneration {
                message,
                generation_info: None,
            }],
            llm_output: None,
        })
    }
}

/// Helper function to convert `serde_json::Value` to AWS Document
fn json_to_document(value: &serde_json::Value) -> Result<Document, DashFlowError> {
    match value {
        serde_json::Value::Null => Ok(Document::Null),
        serde_json::Value::Bool(b) => Ok(Document::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i >= 0 {
                    Ok(Document::Number(aws_smithy_types::Number::PosInt(i as u64)))
                } else {
                    Ok(Document::Number(aws_smithy_types::Number::NegInt(i)))
                }
            } else if let Some(f) = n.as_f64() {
                Ok(Document::Number(aws_smithy_types::Number::Float(f)))
            } else {
                Err(DashFlowError::other("Invalid number".to_string()))
            }
        }
        serde_json::Value::String(s) => Ok(Document::String(s.clone())),
        serde_json::Value::Array(arr) => {
            let docs: Result<Vec<_>, _> = arr.iter().map(json_to_document).collect();
            Ok(Document::Array(docs?))
        }
        serde_json::Value::Object(obj) => {
            let map: Result<HashMap<_, _>, _> = obj
                .iter()
                .map(|(k, v)| json_to_document(v).map(|d| (k.clone(), d)))
                .collect();
            Ok(Document::Object(map?))
        }
    }
}

/// Helper function to convert AWS Document to `serde_json::Value`
fn document_to_json(doc: Document) -> Result<serde_json::Value, DashFlowError> {
    match doc {
        Document::Null => Ok(serde_json::Value::Null),
        Document::Bool(b) => Ok(serde_json::Value::Bool(b)),
        Document::Number(n) => match n {
            aws_smithy_types::Number::PosInt(i) => Ok(serde_json::json!(i)),
            aws_smithy_types::Number::NegInt(i) => Ok(serde_json::json!(i)),
            aws_smithy_types::Number::Float(f) => Ok(serde_json::json!(f)),
        },
        Document::String(s) => Ok(serde_json::Value::String(s)),
        Document::Array(arr) => {
            let values: Result<Vec<_>, _> = arr.into_iter().map(document_to_json).collect();
            Ok(serde_json::Value::Array(values?))
        }
        Document::Object(obj) => {
            let map: Result<serde_json::Map<_, _>, _> = obj
                .into_iter()
                .map(|(k, v)| document_to_json(v).map(|j| (k, j)))
                .collect();
            Ok(serde_json::Value::Object(map?))
        }
    }
}

#[async_trait]
impl ChatModel for ChatBedrock {
    async fn _generate(
        &self,
        messages: &[Message],
        _stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        tool_choice: Option<&ToolChoice>,
        _run_manager: Option<&CallbackManager>,
    ) -> Result<ChatResult, DashFlowError> {
        // Rate limiting
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let (bedrock_messages, system) = self.convert_messages(messages)?;
        let tool_config = self.convert_tools(tools, tool_choice)?;

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(bedrock_messages))
            .set_system(system);

        if let Some(temp) = self.temperature {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .temperature(temp)
                    .build(),
            );
        }

        if let Some(top_p) = self.top_p {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .top_p(top_p)
                    .build(),
            );
        }

        if let Some(max_tokens) = self.max_tokens {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .max_tokens(max_tokens as i32)
                    .build(),
            );
        }

        if let Some(stop_seqs) = &self.stop_sequences {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .set_stop_sequences(Some(stop_seqs.clone()))
                    .build(),
            );
        }

        if let Some(config) = tool_config {
            request = request.tool_config(config);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DashFlowError::api(format!("Bedrock API error: {e}")))?;

        self.convert_response(response)
    }

    fn llm_type(&self) -> &'static str {
        "bedrock"
    }

    async fn _stream(
        &self,
        messages: &[Message],
        _stop: Option<&[String]>,
        tools: Option<&[ToolDefinition]>,
        tool_choice: Option<&ToolChoice>,
        _run_manager: Option<&CallbackManager>,
    ) -> Result<
        Pin<Box<dyn Stream<Item = Result<ChatGenerationChunk, DashFlowError>> + Send>>,
        DashFlowError,
    > {
        // Rate limiting
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let (bedrock_messages, system) = self.convert_messages(messages)?;
        let tool_config = self.convert_tools(tools, tool_choice)?;

        let mut request = self
            .client
            .converse_stream()
            .model_id(&self.model_id)
            .set_messages(Some(bedrock_messages))
            .set_system(system);

        if let Some(temp) = self.temperature {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .temperature(temp)
                    .build(),
            );
        }

        if let Some(top_p) = self.top_p {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .top_p(top_p)
                    .build(),
            );
        }

        if let Some(max_tokens) = self.max_tokens {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .max_tokens(max_tokens as i32)
                    .build(),
            );
        }

        if let Some(stop_seqs) = &self.stop_sequences {
            request = request.inference_config(
                aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
                    .set_stop_sequences(Some(stop_seqs.clone()))
                    .build(),
            );
        }

        if let Some(config) = tool_config {
            request = request.tool_config(config);
        }

        let output = request
            .send()
            .await
            .map_err(|e| DashFlowError::api(format!("Bedrock streaming error: {e}")))?;

        let mut stream = output.stream;

        let output_stream = stream! {
            let mut accumulated_tool_id = String::new();
            let mut accumulated_tool_name = String::new();
            let mut accumulated_tool_json = String::new();

            loop {
                match stream.recv().await {
                    Ok(Some(stream_output)) => {
                        match stream_output {
                            BedrockStreamEvent::ContentBlockStart(block_start) => {
                                if let Some(aws_sdk_bedrockruntime::types::ContentBlockStart::ToolUse(tool_use)) = block_start.start {
                                    accumulated_tool_id = tool_use.tool_use_id;
                                    accumulated_tool_name = tool_use.name;
                                    accumulated_tool_json.clear();
                                }
                            }
                            BedrockStreamEvent::ContentBlockDelta(block_delta) => {
                                if let Some(delta) = block_delta.delta {
                                    match delta {
                                        aws_sdk_bedrockruntime::types::ContentBlockDelta::Text(text_delta) => {
                                            let chunk = ChatGenerationChunk::new(AIMessageChunk::new(text_delta));
                                            yield Ok(chunk);
                                        }
                                        aws_sdk_bedrockruntime::types::ContentBlockDelta::ToolUse(tool_delta) => {
                                            accumulated_tool_json.push_str(&tool_delta.input);
                                        }
                                        other => {
                                            tracing::debug!(
                                                delta = ?other,
                                                "Ignoring unhandled Bedrock content block delta type"
                                            );
                                        }
                                    }
                                }
                            }
                            BedrockStreamEvent::ContentBlockStop(_) => {
                                // Emit complete tool call if we accumulated one
                                if !accumulated_tool_id.is_empty() {
                                    let args = match serde_json::from_str(&accumulated_tool_json) {
                                        Ok(value) => value,
                                        Err(e) => {
                                            serde_json::json!({
                                                "error": format!("Failed to parse tool args: {}", e),
                                                "raw": accumulated_tool_json.clone()
                                            })
                                        }
                                    };

                                    let mut ai_chunk = AIMessageChunk::new("");
                                    ai_chunk.tool_calls.push(ToolCall {
                                        id: accumulated_tool_id.clone(),
                                        name: accumulated_tool_name.clone(),
                                        args,
                                        tool_type: "tool_call".to_string(),
                index: None,
                                    });

                                    let chunk = ChatGenerationChunk::new(ai_chunk);
                                    yield Ok(chunk);

                                    // Reset accumulators
                                    accumulated_tool_id.clear();
                                    accumulated_tool_name.clear();
                                    accumulated_tool_json.clear();
                                }
                            }
                            BedrockStreamEvent::MessageStart(_) => {}
                            BedrockStreamEvent::MessageStop(_) => {}
                            BedrockStreamEvent::Metadata(metadata) => {
                                if let Some(usage) = metadata.usage {
                                    let mut ai_chunk = AIMessageChunk::new("");
                                    ai_chunk.usage_metadata = Some(UsageMetadata {
                                        input_tokens: usage.input_tokens as u32,
                                        output_tokens: usage.output_tokens as u32,
                                        total_tokens: (usage.input_tokens + usage.output_tokens) as u32,
                                        input_token_details: None,
                                        output_token_details: None,
                                    });
                                    let chunk = ChatGenerationChunk::new(ai_chunk);
                                    yield Ok(chunk);
                                }
                            }
                            other => {
                                tracing::debug!(
                                    event = ?other,
                                    "Ignoring unhandled Bedrock stream event type"
                                );
                            }
                        }
                    }
                    Ok(None) => {
                        // Stream ended normally
                        break;
                    }
                    Err(e) => {
                        yield Err(DashFlowError::api(format!("Stream error: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(output_stream))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl Runnable for ChatBedrock {
    type Input = Vec<Message>;
    type Output = ChatResult;

    async fn invoke(
        &self,
        input: Self::Input,
        _config: Option<RunnableConfig>,
    ) -> Result<Self::Output, DashFlowError> {
        self.generate(&input, None, None, None, None).await
    }

    async fn stream(
        &self,
        input: Self::Input,
        _config: Option<RunnableConfig>,
    ) -> Result<
        Pin<Box<dyn Stream<Item = Result<Self::Output, DashFlowError>> + Send>>,
        DashFlowError,
    > {
        let stream = ChatModel::stream(self, &input, None, None, None, None).await?;
        let output_stream = stream! {
            let mut accumulated_content = String::new();
            let mut accumulated_tool_calls = Vec::new();
            let mut accumulated_usage: Option<UsageMetadata> = None;
            let mut accumulated_metadata: HashMap<String, serde_json::Value> = HashMap::new();

            for await chunk_result in stream {
                match chunk_result {
                    Ok(chunk) => {
                        // Accumulate content
                        accumulated_content.push_str(&chunk.message.content);

                        // Accumulate tool calls
                        accumulated_tool_calls.extend(chunk.message.tool_calls);

                        // Update usage metadata
                        if let Some(usage) = chunk.message.usage_metadata {
                            accumulated_usage = Some(usage);
                        }

                        // Merge response metadata
                        for (k, v) in chunk.message.fields.response_metadata {
                            accumulated_metadata.insert(k, v);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            // Build final AI message
            let mut ai_message = AIMessage::new(accumulated_content).with_tool_calls(accumulated_tool_calls);
            if let Some(usage) = accumulated_usage {
                ai_message = ai_message.with_usage(usage);
            }

            // Convert to Message enum
            let mut message = Message::from(ai_message);
            let fields = message.fields_mut();
            fields.response_metadata = accumulated_metadata;

            yield Ok(ChatResult {
                generations: vec![ChatGeneration {
                    message,
                    generation_info: None,
                }],
                llm_output: None,
            });
        };

        Ok(Box::pin(output_stream))
    }
}

impl Serializable for ChatBedrock {
    fn lc_id(&self) -> Vec<String> {
        vec![
            "dashflow".to_string(),
            "chat_models".to_string(),
            "bedrock".to_string(),
            "ChatBedrock".to_string(),
        ]
    }

    fn is_lc_serializable(&self) -> bool {
        true
    }

    fn to_json(&self) -> SerializedObject {
        let mut kwargs = serde_json::Map::new();
        kwargs.insert("model_id".to_string(), serde_json::json!(self.model_id));
        kwargs.insert("region".to_string(), serde_json::json!(self.region));

        if let Some(temp) = self.temperature {
            kwargs.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(top_p) = self.top_p {
            kwargs.insert("top_p".to_string(), serde_json::json!(top_p));
        }
        if let Some(max_tokens) = self.max_tokens {
            kwargs.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
        }

        SerializedObject::Constructor {
            lc: 1,
            id: self.lc_id(),
            kwargs: serde_json::Value::Object(kwargs),
        }
    }
}
