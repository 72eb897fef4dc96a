//! Upstash Redis-based chat message history storage
//!
//! Stores chat message history in Upstash Redis using REST API. Messages are serialized to JSON
//! and stored in a Redis list, with optional TTL (time-to-live) for automatic expiration.
//!
//! # Overview
//!
//! The Upstash Redis backend uses:
//! - **REST API** for communication (not Redis protocol)
//! - **Redis lists** (LPUSH/LRANGE) for message storage
//! - **JSON serialization** for message persistence
//! - **Session-based keys** (key_prefix + session_id)
//! - **Optional TTL** for automatic expiration
//!
//! # Usage
//!
//! ```rust,ignore
//! use dashflow_memory::UpstashRedisChatMessageHistory;
//! use dashflow::core::chat_history::BaseChatMessageHistory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! // Create Upstash Redis history
//! let history = UpstashRedisChatMessageHistory::new(
//!     "session-123".to_string(),
//!     "https://example.upstash.io".to_string(),
//!     "your-token".to_string(),
//!     Some("message_store:".to_string()),
//!     None, // no TTL
//! )?;
//!
//! // Add messages
//! history.add_user_message("Hello!").await?;
//! history.add_ai_message("Hi there!").await?;
//!
//! // Retrieve messages
//! let messages = history.get_messages().await?;
//! assert_eq!(messages.len(), 2);
//!
//! // Clear history
//! history.clear().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Python Baseline Compatibility
//!
//! Matches `UpstashRedisChatMessageHistory` from
//! `dashflow_community.chat_message_histories.upstash_redis:15-70`.
//!
//! Key features:
//! - Uses Upstash Redis REST API (not Redis protocol)
//! - Stores messages in Redis lists (LPUSH/LRANGE)
//! - Supports optional TTL for automatic expiration
//! - Configurable key prefix for namespace isolation

use async_trait::async_trait;
use dashflow::core::chat_history::BaseChatMessageHistory;
use dashflow::core::messages::Message;
use reqwest::Client;
use serde_json;

/// Upstash Redis-based chat message history implementation.
///
/// Stores chat messages in Upstash Redis using the REST API, with each message
/// serialized as JSON. Messages are pushed to the list using LPUSH and retrieved
/// in chronological order.
///
/// # Storage Format
///
/// - **Key**: `{key_prefix}{session_id}` (default prefix: "message_store:")
/// - **Structure**: Redis list
/// - **Message format**: JSON-serialized Message objects
/// - **Order**: Chronological (oldest first when retrieved)
/// - **Protocol**: REST API (not Redis protocol)
///
/// # Features
///
/// - **Session-based**: Each session_id gets its own Redis key
/// - **TTL support**: Optional expiration time for automatic cleanup
/// - **JSON serialization**: Uses serde_json for Message serialization
/// - **REST API**: Uses HTTP for communication with Upstash
#[derive(Clone)]
pub struct UpstashRedisChatMessageHistory {
    client: Client,
    session_id: String,
    url: String,
    token: String,
    key_prefix: String,
    ttl: Option<u64>,
}

impl UpstashRedisChatMessageHistory {
    /// Creates a new Upstash Redis chat message history.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Unique identifier for the conversation session
    /// * `url` - Upstash Redis REST URL (e.g., <https://example.upstash.io>)
    /// * `token` - Upstash Redis REST token
    /// * `key_prefix` - Optional prefix for Redis keys (default: "message_store:")
    /// * `ttl` - Optional time-to-live in seconds for automatic expiration
    ///
    /// # Errors
    ///
    /// Returns an error if url or token is empty.
    pub fn new(
        session_id: String,
        url: String,
        token: String,
        key_prefix: Option<String>,
        ttl: Option<u64>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if url.is_empty() || token.is_empty() {
            return Err("UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN are required".into());
        }

        Ok(Self {
            client: Client::new(),
            session_id,
            url,
            token,
            key_prefix: key_prefix.unwrap_or_else(|| "message_store:".to_string()),
            ttl,
        })
    }

    /// Get the full Redis key for this session
    fn key(&self) -> String {
        format!("{}{}", self.key_prefix, self.session_id)
    }

    /// Execute a Redis command via the REST API
    async fn execute_command(
        &self,
        command: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&command)
            .send()
            .await?;

        let result = response.json::<serde_json::Value>().await?;

        // Check for error in response
        if let Some(error) = result.get("error") {
            return Err(format!("Upstash Redis error: {}", error).into());
        }

        Ok(result)
    }

    /// Read messages from Upstash Redis
    async fn read_messages(
        &self,
    ) -> Result<Vec<Message>, Box<dyn std::error::Error + Send + Sync>> {
        // LRANGE key 0 -1 returns all elements
        let command = serde_json::json!(["LRANGE", self.key(), "0", "-1"]);
        let result = self.execute_command(vec![command]).await?;

        // Parse the result array
        let items = match result.get("result") {
            Some(serde_json::Value::Array(arr)) => arr,
            _ => return Ok(Vec::new()),
        };

        // Items are in reverse order (newest first), so we reverse them
        let mut messages = Vec::new();
        for item in items.iter().rev() {
            if let serde_json::Value::String(json_str) = item {
                let message: Message = serde_json::from_str(json_str)?;
                messages.push(message);
            }
        }

        Ok(messages)
    }
}

#[async_trait]
impl BaseChatMessageHistory for UpstashRedisChatMessageHistory {
    async fn add_messages(
        &self,
        messages: &[Message],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for message in messages {
            // Serialize message to JSON
            let json_str = serde_json::to_string(message)?;

            // LPUSH key value
            let lpush_command = serde_json::json!(["LPUSH", self.key(), json_str]);
            self.execute_command(vec![lpush_command]).await?;

            // Set TTL if configured
            if let Some(ttl_seconds) = self.ttl {
                let expire_command = serde_json::json!(["EXPIRE", self.key(), ttl_seconds]);
                self.execute_command(vec![expire_command]).await?;
            }
        }

        Ok(())
    }

    async fn get_messages(&self) -> Result<Vec<Message>, Box<dyn std::error::Error + Send + Sync>> {
        self.read_messages().await
    }

    async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // DEL key
        let command = serde_json::json!(["DEL", self.key()]);
        self.execute_command(vec![command]).await?;
        Ok(())
    }
}
