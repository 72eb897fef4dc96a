//! Build ChatModel and LLMNode from ChatModelConfig
//!
//! This module provides functions to build `ChatXAI` and optimizable `LLMNode`
//! instances from configuration.

use crate::{ChatXAI, XAI_DEFAULT_API_BASE};
use async_openai::config::OpenAIConfig;
use dashflow::core::config_loader::ChatModelConfig;
use dashflow::core::config_loader::env_vars::{
    env_string_or_default, XAI_API_BASE as XAI_API_BASE_ENV,
};
use dashflow::core::language_models::ChatModel;
use dashflow::core::Error as DashFlowError;
use dashflow::optimize::{LLMNode, Signature};
use dashflow::state::GraphState;
use std::sync::Arc;

/// Build an xAI ChatModel from a ChatModelConfig
///
/// # Example
///
/// ```rust,ignore
/// use dashflow::core::config_loader::{ChatModelConfig, SecretReference};
/// use dashflow_xai::build_chat_model;
///
/// let config = ChatModelConfig::XAI {
///     model: "grok-beta".to_string(),
///     api_key: SecretReference::from_env("XAI_API_KEY"),
///     temperature: Some(0.7),
/// };
///
/// let llm = build_chat_model(&config)?;
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The config is not an XAI config
/// - Secret resolution fails (e.g., environment variable not set)
pub fn build_chat_model(config: &ChatModelConfig) -> Result<Arc<dyn ChatModel>, DashFlowError> {
    match config {
        ChatModelConfig::XAI {
            model,
            api_key,
            temperature,
        } => {
            let key = api_key.resolve()?;

            let api_base = env_string_or_default(XAI_API_BASE_ENV, XAI_DEFAULT_API_BASE);

            let openai_config = OpenAIConfig::new()
                .with_api_key(&key)
                .with_api_base(&api_base);

            let mut llm = ChatXAI::with_config(openai_config).with_model(model);

            if let Some(t) = temperature {
                llm = llm.with_temperature(*t);
            }

            Ok(Arc::new(llm))
        }
        other => Err(DashFlowError::InvalidInput(format!(
            "build_chat_model from dashflow-xai only supports XAI configs, \
             got {} config. Use the appropriate provider crate for this config type.",
            other.provider()
        ))),
    }
}

/// Build an optimizable LLMNode from a ChatModelConfig and Signature
///
/// This creates an LLMNode that can be used with DashOptimize algorithms
/// (BootstrapFewShot, MIPROv2, GRPO, etc.) for automatic prompt optimization.
///
/// # Example
///
/// ```rust,ignore
/// use dashflow::core::config_loader::{ChatModelConfig, SecretReference};
/// use dashflow::optimize::{make_signature, Signature};
/// use dashflow_xai::build_llm_node;
///
/// let config = ChatModelConfig::XAI {
///     model: "grok-beta".to_string(),
///     api_key: SecretReference::from_env("XAI_API_KEY"),
///     temperature: Some(0.7),
/// };
///
/// let signature = make_signature("question -> answer", "Answer accurately")?;
/// let llm_node: LLMNode<MyState> = build_llm_node(&config, signature)?;
/// ```
///
/// # Type Parameters
///
/// * `S` - The graph state type (must implement `GraphState`)
///
/// # Errors
///
/// Returns an error if:
/// - The config is not an XAI config
/// - Secret resolution fails (e.g., environment variable not set)
pub fn build_llm_node<S: GraphState>(
    config: &ChatModelConfig,
    signature: Signature,
) -> Result<LLMNode<S>, DashFlowError> {
    let llm = build_chat_model(config)?;
    Ok(LLMNode::new(signature, llm))
}
