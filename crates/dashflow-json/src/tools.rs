//! JSON tools for listing keys and retrieving values

use crate::spec::JsonSpec;
use async_trait::async_trait;
use dashflow::core::error::Result;
use dashflow::core::tools::{Tool, ToolInput};

/// Tool for listing keys in a JSON spec at a given path.
///
/// This tool allows agents to explore JSON data structures by listing
/// the keys available at any path in the JSON document.
///
/// # Examples
///
/// ```rust
/// use dashflow_json::{JsonSpec, JsonListKeysTool};
/// use dashflow::core::tools::Tool;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let data = json!({
///     "users": {"alice": {}, "bob": {}},
///     "metadata": {}
/// });
/// let spec = JsonSpec::new(data);
/// let tool = JsonListKeysTool::new(spec);
///
/// let result = tool._call_str("data[\"users\"]".to_string()).await.unwrap();
/// // Result contains: "['alice', 'bob']"
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonListKeysTool {
    spec: JsonSpec,
}

impl JsonListKeysTool {
    /// Creates a new `JsonListKeysTool` with the given JSON spec.
    ///
    /// # Arguments
    ///
    /// * `spec` - The JSON specification to query
    #[must_use]
    pub fn new(spec: JsonSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonListKeysTool {
    fn name(&self) -> &'static str {
        "json_spec_list_keys"
    }

    fn description(&self) -> &'static str {
        r#"Can be used to list all keys at a given path.
Before calling this you should be SURE that the path to this exists.
The input is a text representation of the path to the dict in Python syntax (e.g. data["key1"][0]["key2"])."#
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let path = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(v) => {
                // Try to extract "input" field from structured input
                v.get("input")
                    .and_then(|v| v.as_str())
                    .unwrap_or("data")
                    .to_string()
            }
        };
        Ok(self.spec.keys(&path))
    }
}

/// Tool for getting a value in a JSON spec at a given path.
///
/// This tool allows agents to retrieve values from JSON data structures
/// using Python-style path expressions.
///
/// # Examples
///
/// ```rust
/// use dashflow_json::{JsonSpec, JsonGetValueTool};
/// use dashflow::core::tools::Tool;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let data = json!({
///     "users": [
///         {"name": "Alice", "age": 30}
///     ]
/// });
/// let spec = JsonSpec::new(data);
/// let tool = JsonGetValueTool::new(spec);
///
/// let result = tool._call_str("data[\"users\"][0][\"name\"]".to_string()).await.unwrap();
/// assert_eq!(result, "Alice");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonGetValueTool {
    spec: JsonSpec,
}

impl JsonGetValueTool {
    /// Creates a new `JsonGetValueTool` with the given JSON spec.
    ///
    /// # Arguments
    ///
    /// * `spec` - The JSON specification to query
    #[must_use]
    pub fn new(spec: JsonSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonGetValueTool {
    fn name(&self) -> &'static str {
        "json_spec_get_value"
    }

    fn description(&self) -> &'static str {
        r#"Can be used to see value in string format at a given path.
Before calling this you should be SURE that the path to this exists.
The input is a text representation of the path to the dict in Python syntax (e.g. data["key1"][0]["key2"])."#
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let path = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(v) => {
                // Try to extract "input" field from structured input
                v.get("input")
                    .and_then(|v| v.as_str())
                    .unwrap_or("data")
                    .to_string()
            }
        };
        Ok(self.spec.value(&path))
    }
}
