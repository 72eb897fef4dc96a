//! Mock Tool for testing tool-using agents

use async_trait::async_trait;
use dashflow::core::{
    error::{Error, Result},
    tools::{Tool, ToolInput},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Handler function type for mock tool execution
pub type MockToolHandler = Arc<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// A configurable mock tool for testing
///
/// # Example
///
/// ```rust
/// use dashflow_testing::MockTool;
///
/// let tool = MockTool::new("calculator")
///     .with_description("Performs calculations")
///     .with_handler(|input| Ok(format!("Result: {}", input)));
/// ```
#[derive(Clone)]
pub struct MockTool {
    /// Tool name
    name: String,
    /// Tool description
    description: String,
    /// JSON schema for parameters
    schema: Value,
    /// Handler function
    handler: Option<MockToolHandler>,
    /// Fixed response (used when no handler is set)
    fixed_response: String,
    /// Call history (input -> output)
    call_history: Arc<Mutex<Vec<(String, String)>>>,
    /// Number of times call was called
    call_count: Arc<Mutex<usize>>,
    /// Whether to fail on next invocation
    should_fail: Arc<Mutex<bool>>,
    /// Error message when failing
    error_message: String,
}

impl std::fmt::Debug for MockTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("call_count", &self.call_count())
            .finish()
    }
}

impl MockTool {
    /// Create a new MockTool with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "A mock tool for testing".to_string(),
            schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "Input to the tool"
                    }
                },
                "required": ["input"]
            }),
            handler: None,
            fixed_response: "Mock tool response".to_string(),
            call_history: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
            error_message: "Mock tool error".to_string(),
        }
    }

    /// Set the tool description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the parameter schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Set a handler function for dynamic responses
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Set a fixed response (used when no handler is set)
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = response.into();
        self
    }

    /// Configure the tool to fail on the next invocation
    pub fn fail_next(&self) {
        *self.should_fail.lock().unwrap() = true;
    }

    /// Set the error message when failing
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Get the number of times call was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Get the call history as (input, output) pairs
    pub fn call_history(&self) -> Vec<(String, String)> {
        self.call_history.lock().unwrap().clone()
    }

    /// Get just the inputs from call history
    pub fn inputs(&self) -> Vec<String> {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .map(|(input, _)| input.clone())
            .collect()
    }

    /// Reset the call count and history
    pub fn reset(&self) {
        *self.call_count.lock().unwrap() = 0;
        self.call_history.lock().unwrap().clear();
        *self.should_fail.lock().unwrap() = false;
    }

    /// Check if a specific input was received
    pub fn was_called_with(&self, input: &str) -> bool {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .any(|(i, _)| i.contains(input))
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        // Increment call count
        *self.call_count.lock().unwrap() += 1;

        // Check if we should fail
        {
            let mut should_fail = self.should_fail.lock().unwrap();
            if *should_fail {
                *should_fail = false;
                return Err(Error::tool_error(self.error_message.clone()));
            }
        }

        // Get input string
        let input_str = match &input {
            ToolInput::String(s) => s.clone(),
            ToolInput::Structured(v) => v.to_string(),
        };

        // Execute handler or return fixed response
        let output = if let Some(handler) = &self.handler {
            handler(&input_str)?
        } else {
            self.fixed_response.clone()
        };

        // Record in history
        self.call_history
            .lock()
            .unwrap()
            .push((input_str, output.clone()));

        Ok(output)
    }
}

/// A builder for creating MockTools with specific behaviors
pub struct MockToolBuilder {
    tool: MockTool,
}

impl MockToolBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tool: MockTool::new(name),
        }
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.tool = self.tool.with_description(desc);
        self
    }

    /// Set the parameters schema
    pub fn schema(mut self, schema: Value) -> Self {
        self.tool = self.tool.with_schema(schema);
        self
    }

    /// Set a fixed response
    pub fn response(mut self, resp: impl Into<String>) -> Self {
        self.tool = self.tool.with_response(resp);
        self
    }

    /// Set a handler function
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.tool = self.tool.with_handler(f);
        self
    }

    /// Build the MockTool
    pub fn build(self) -> MockTool {
        self.tool
    }
}
