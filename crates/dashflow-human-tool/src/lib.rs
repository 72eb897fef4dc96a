//! Human input tool for `DashFlow` Rust.
//!
//! This crate provides a tool for requesting input from a human user, enabling
//! human-in-the-loop workflows for AI agents and LLM applications.
//!
//! # Features
//!
//! - Request input from human users via stdin/stdout
//! - Simple prompt and response pattern
//! - Async-compatible using tokio
//! - Support for custom prompts
//! - Non-blocking I/O
//!
//! # Example
//!
//! ```rust
//! use dashflow_human_tool::HumanTool;
//! use dashflow::core::tools::{Tool, ToolInput};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let tool = HumanTool::new();
//!
//! // Request human input with a custom prompt
//! let input = json!({
//!     "prompt": "What is your name?"
//! });
//! // Note: In tests, stdin would need to be mocked. This example shows the API.
//! // let result = tool._call(ToolInput::Structured(input)).await.unwrap();
//! # });
//! ```
//!
//! # Security Considerations
//!
//! - This tool reads from stdin, which may block if no input is available
//! - Use with caution in automated environments
//! - Consider implementing timeouts for production use
//! - Input is not sanitized - validate user responses as needed
//!
//! # See Also
//!
//! - [`Tool`] - The trait this implements
//! - [`dashflow-shell-tool`](https://docs.rs/dashflow-shell-tool) - Shell command execution for automated tasks
//! - [`dashflow-calculator`](https://docs.rs/dashflow-calculator) - Calculator tool for mathematical expressions
//! - [Human-in-the-Loop Patterns](https://langchain.com/docs/modules/agents/how_to/human_approval) - Design patterns

use async_trait::async_trait;
use dashflow::core::tools::{Tool, ToolInput};
use dashflow::core::Error;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Human input tool for requesting information from a human user.
///
/// This tool enables human-in-the-loop workflows by prompting the user
/// for input via stdin/stdout. It's useful for:
/// - Gathering information that the AI cannot access
/// - Getting user confirmation for important actions
/// - Collecting feedback or preferences
/// - Interactive debugging and development
///
/// # Input Format
///
/// The tool accepts either:
/// - **String**: Used directly as the prompt text
/// - **Structured Object** with:
///   - `prompt` (string, required): The prompt to display to the user
///
/// # Output Format
///
/// Returns the user's response as a string (with trailing newline removed).
///
/// # Example
///
/// ```rust
/// use dashflow_human_tool::HumanTool;
/// use dashflow::core::tools::{Tool, ToolInput};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let tool = HumanTool::new();
///
/// // Using string input
/// // let response = tool._call(ToolInput::String("Enter your name:".to_string())).await.unwrap();
///
/// // Using structured input
/// let input = json!({"prompt": "What is your favorite color?"});
/// // let response = tool._call(ToolInput::Structured(input)).await.unwrap();
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct HumanTool;

impl HumanTool {
    /// Create a new `HumanTool` instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for HumanTool {
    fn name(&self) -> &'static str {
        "human"
    }

    fn description(&self) -> &'static str {
        "Request input from a human user. Use this tool when you need information, \
         confirmation, or feedback from a human. The input should be the prompt or \
         question to display to the user."
    }

    fn args_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt or question to display to the user"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String, Error> {
        // Extract the prompt from the input
        let prompt = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(obj) => {
                // Try to extract "prompt" field
                if let Some(prompt_value) = obj.get("prompt") {
                    if let Some(prompt_str) = prompt_value.as_str() {
                        prompt_str.to_string()
                    } else {
                        return Err(Error::tool_error("The 'prompt' field must be a string"));
                    }
                } else {
                    return Err(Error::tool_error(
                        "Missing required 'prompt' field in input",
                    ));
                }
            }
        };

        // Get stdin/stdout
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();

        // Display the prompt
        stdout
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| Error::tool_error(format!("Failed to write prompt: {e}")))?;

        // Add a space after the prompt if it doesn't end with whitespace
        if !prompt.ends_with(' ') && !prompt.ends_with('\n') {
            stdout
                .write_all(b" ")
                .await
                .map_err(|e| Error::tool_error(format!("Failed to write space: {e}")))?;
        }

        stdout
            .flush()
            .await
            .map_err(|e| Error::tool_error(format!("Failed to flush stdout: {e}")))?;

        // Read the response
        let mut reader = BufReader::new(stdin);
        let mut response = String::new();

        reader
            .read_line(&mut response)
            .await
            .map_err(|e| Error::tool_error(format!("Failed to read input: {e}")))?;

        // Remove trailing newline
        let response = response.trim_end().to_string();

        Ok(response)
    }
}
