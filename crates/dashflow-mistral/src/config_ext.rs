//! Build ChatModel and LLMNode from ChatModelConfig
//!
//! This module provides functions to build `ChatMistralAI` and optimizable `LLMNode`
//! instances from configuration.

use crate::ChatMistralAI;
use dashflow::core::config_loader::ChatModelConfig;
use dashflow::core::language_models::ChatModel;
use dashflow::core::Error as DashFlowError;
use dashflow::optimize::{LLMNode, Signature};
use dashflow::state::GraphState;
use std::sync::Arc;

/// Build a Mistral ChatModel from a ChatModelConfig
///
/// # Example
///
/// ```rust,ignore
/// use dashflow::core::config_loader::{ChatModelConfig, SecretReference};
/// use dashflow_mistral::build_chat_model;
///
/// let config = ChatModelConfig::Mistral {
///     model: "mistral-small-latest".to_string(),
///     api_key: SecretReference::from_env("MISTRAL_API_KEY"),
///     temperature: Some(0.7),
/// };
///
/// let llm = build_chat_model(&config)?;
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The config is not a Mistral config
/// - Secret resolution fails (e.g., environment variable not set)
/// - Mistral client creation fails
pub fn build_chat_model(config: &ChatModelConfig) -> Result<Arc<dyn ChatModel>, DashFlowError> {
    match config {
        ChatModelConfig::Mistral {
            model,
            api_key,
            temperature,
        } => {
            let key = api_key.resolve()?;

            let mut llm = ChatMistralAI::with_api_key(&key)
                .map_err(|e| {
                    DashFlowError::InvalidInput(format!("Failed to create Mistral client: {}", e))
                })?
                .with_model(model);

            if let Some(t) = temperature {
                llm = llm.with_temperature(*t);
            }

            Ok(Arc::new(llm))
        }
        other => Err(DashFlowError::InvalidInput(format!(
            "build_chat_model from dashflow-mistral only supports Mistral configs, \
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
/// use dashflow_mistral::build_llm_node;
///
/// let config = ChatModelConfig::Mistral {
///     model: "mistral-small-latest".to_string(),
///     api_key: SecretReference::from_env("MISTRAL_API_KEY"),
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
/// - The config is not a Mistral config
/// - Secret resolution fails (e.g., environment variable not set)
/// - Mistral client creation fails
pub fn build_llm_node<S: GraphState>(
    config: &ChatModelConfig,
    signature: Signature,
) -> Result<LLMNode<S>, DashFlowError> {
    let llm = build_chat_model(config)?;
    Ok(LLMNode::new(signature, llm))
}
