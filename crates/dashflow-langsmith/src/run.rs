//! Run types and structures for `LangSmith` tracing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Type of run (chain, llm, tool, retriever, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    /// LLM run (completion or chat)
    Llm,
    /// Chain run (sequence of operations)
    Chain,
    /// Tool run (function/tool execution)
    Tool,
    /// Retriever run (document retrieval)
    Retriever,
    /// Embedding run (text embedding)
    Embedding,
    /// Prompt run (prompt template)
    Prompt,
    /// Parser run (output parsing)
    Parser,
}

/// A run represents a single execution trace in `LangSmith`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for the run
    pub id: Uuid,

    /// Name of the run (e.g., "`ChatOpenAI`", "`RetrievalQA`")
    pub name: String,

    /// Type of run
    pub run_type: RunType,

    /// Start time of the run
    pub start_time: DateTime<Utc>,

    /// End time of the run (None if still running)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Parent run ID (if this is a child run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,

    /// Input to the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,

    /// Output from the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Value>,

    /// Error that occurred during the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Serialized version of the object that was run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized: Option<serde_json::Value>,

    /// Tags for the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Session/project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    /// Reference example ID (for evaluation runs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<Uuid>,

    /// Extra information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<HashMap<String, serde_json::Value>>,

    /// Events that occurred during the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<serde_json::Value>>,
}

/// Parameters for creating a new run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreate {
    /// Unique identifier for the run
    pub id: Uuid,

    /// Name of the run
    pub name: String,

    /// Type of run
    pub run_type: RunType,

    /// Start time of the run
    pub start_time: DateTime<Utc>,

    /// Parent run ID (if this is a child run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,

    /// Input to the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,

    /// Serialized version of the object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized: Option<serde_json::Value>,

    /// Tags for the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Session/project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    /// Reference example ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<Uuid>,

    /// Extra information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<HashMap<String, serde_json::Value>>,
}

/// Parameters for updating an existing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunUpdate {
    /// End time of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Output from the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Value>,

    /// Error that occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional metadata to merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Events that occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<serde_json::Value>>,

    /// Extra information to merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<HashMap<String, serde_json::Value>>,
}

impl RunCreate {
    /// Create a new `RunCreate` with required fields
    pub fn new(id: Uuid, name: impl Into<String>, run_type: RunType) -> Self {
        Self {
            id,
            name: name.into(),
            run_type,
            start_time: Utc::now(),
            parent_run_id: None,
            inputs: None,
            serialized: None,
            tags: None,
            metadata: None,
            session_name: None,
            reference_example_id: None,
            extra: None,
        }
    }

    /// Set the parent run ID
    #[must_use]
    pub fn with_parent_run_id(mut self, parent_run_id: Uuid) -> Self {
        self.parent_run_id = Some(parent_run_id);
        self
    }

    /// Set the inputs
    #[must_use]
    pub fn with_inputs(mut self, inputs: serde_json::Value) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Set the tags
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set the session name
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    /// Set metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl RunUpdate {
    /// Create a new empty `RunUpdate`
    #[must_use]
    pub fn new() -> Self {
        Self {
            end_time: None,
            outputs: None,
            error: None,
            metadata: None,
            events: None,
            extra: None,
        }
    }

    /// Set the end time
    #[must_use]
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set the outputs
    #[must_use]
    pub fn with_outputs(mut self, outputs: serde_json::Value) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Set an error
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl Default for RunUpdate {
    fn default() -> Self {
        Self::new()
    }
}
