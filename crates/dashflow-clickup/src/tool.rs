//! `ClickupAction` tool implementation

use crate::api::{ClickupAPIWrapper, ClickupError};
use crate::prompts::{
    CLICKUP_FOLDER_CREATE_PROMPT, CLICKUP_GET_ALL_TEAMS_PROMPT, CLICKUP_GET_FOLDERS_PROMPT,
    CLICKUP_GET_LIST_PROMPT, CLICKUP_GET_SPACES_PROMPT, CLICKUP_GET_TASK_ATTRIBUTE_PROMPT,
    CLICKUP_GET_TASK_PROMPT, CLICKUP_LIST_CREATE_PROMPT, CLICKUP_TASK_CREATE_PROMPT,
    CLICKUP_UPDATE_TASK_ASSIGNEE_PROMPT, CLICKUP_UPDATE_TASK_PROMPT,
};
use async_trait::async_trait;
use dashflow::core::tools::{Tool, ToolInput};
use serde::{Deserialize, Serialize};

/// `ClickupAction` tool that queries the `ClickUp` API
///
/// This tool allows agents to interact with `ClickUp` to create tasks,
/// lists, folders, and query information from a `ClickUp` workspace.
///
/// # Example
///
/// ```no_run
/// use dashflow_clickup::{ClickupAPIWrapper, ClickupAction};
/// use dashflow::core::tools::Tool;
/// use std::env;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// env::set_var("CLICKUP_ACCESS_TOKEN", "your_token_here");
///
/// let api = ClickupAPIWrapper::new().await?;
/// let tool = ClickupAction::new(api, "get_teams");
///
/// let result = tool.run("{}").await?;
/// println!("{}", result);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ClickupAction {
    #[serde(skip)]
    api_wrapper: Option<ClickupAPIWrapper>,
    mode: String,
    name: String,
    description: String,
}

impl ClickupAction {
    /// Create a new `ClickupAction` with the given API wrapper and mode
    ///
    /// # Arguments
    ///
    /// * `api_wrapper` - The `ClickupAPIWrapper` to use for API calls
    /// * `mode` - The operation mode (e.g., "`get_task`", "`create_task`", "`get_teams`")
    ///
    /// # Supported Modes
    ///
    /// * `get_task` - Get a specific task by ID
    /// * `get_task_attribute` - Get a specific attribute from a task
    /// * `get_teams` - Get all teams the user is part of
    /// * `create_task` - Create a new task
    /// * `create_list` - Create a new list
    /// * `create_folder` - Create a new folder
    /// * `get_lists` - Get all lists
    /// * `get_folders` - Get all folders
    /// * `get_spaces` - Get all spaces
    /// * `update_task` - Update a task attribute
    /// * `update_task_assignees` - Add or remove task assignees
    pub fn new(api_wrapper: ClickupAPIWrapper, mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let (name, description) = Self::get_name_and_description(&mode);

        Self {
            api_wrapper: Some(api_wrapper),
            mode,
            name,
            description,
        }
    }

    fn get_name_and_description(mode: &str) -> (String, String) {
        match mode {
            "create_task" => (
                "Create ClickUp Task".to_string(),
                CLICKUP_TASK_CREATE_PROMPT.to_string(),
            ),
            "create_list" => (
                "Create ClickUp List".to_string(),
                CLICKUP_LIST_CREATE_PROMPT.to_string(),
            ),
            "create_folder" => (
                "Create ClickUp Folder".to_string(),
                CLICKUP_FOLDER_CREATE_PROMPT.to_string(),
            ),
            "get_task" => (
                "Get ClickUp Task".to_string(),
                CLICKUP_GET_TASK_PROMPT.to_string(),
            ),
            "get_task_attribute" => (
                "Get ClickUp Task Attribute".to_string(),
                CLICKUP_GET_TASK_ATTRIBUTE_PROMPT.to_string(),
            ),
            "get_teams" => (
                "Get ClickUp Teams".to_string(),
                CLICKUP_GET_ALL_TEAMS_PROMPT.to_string(),
            ),
            "get_lists" => (
                "Get ClickUp Lists".to_string(),
                CLICKUP_GET_LIST_PROMPT.to_string(),
            ),
            "get_folders" => (
                "Get ClickUp Folders".to_string(),
                CLICKUP_GET_FOLDERS_PROMPT.to_string(),
            ),
            "get_spaces" => (
                "Get ClickUp Spaces".to_string(),
                CLICKUP_GET_SPACES_PROMPT.to_string(),
            ),
            "update_task" => (
                "Update ClickUp Task".to_string(),
                CLICKUP_UPDATE_TASK_PROMPT.to_string(),
            ),
            "update_task_assignees" => (
                "Update ClickUp Task Assignees".to_string(),
                CLICKUP_UPDATE_TASK_ASSIGNEE_PROMPT.to_string(),
            ),
            _ => (
                format!("ClickUp Action: {mode}"),
                format!("Execute ClickUp operation: {mode}"),
            ),
        }
    }

    /// Run the tool with the given instructions
    pub async fn run(&self, instructions: &str) -> Result<String, ClickupError> {
        let api = self
            .api_wrapper
            .as_ref()
            .ok_or(ClickupError::NotInitialized)?;
        api.run(&self.mode, instructions).await
    }
}

#[async_trait]
impl Tool for ClickupAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn _call(&self, input: ToolInput) -> dashflow::core::error::Result<String> {
        let input_str = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(v) => serde_json::to_string(&v)
                .map_err(|e| dashflow::core::error::Error::tool_error(e.to_string()))?,
        };

        self.run(&input_str)
            .await
            .map_err(|e| dashflow::core::error::Error::tool_error(e.to_string()))
    }
}
