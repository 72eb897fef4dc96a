// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

// Kafka Topic Management Utilities
// Author: Andrew Yates (ayates@dropbox.com) © 2025 Dropbox

//! # Kafka Topic Management
//!
//! Utilities for managing Kafka topics for DashFlow Streaming.
//!
//! ## Features
//!
//! - **Topic Creation**: Create topics with custom configuration
//! - **Topic Deletion**: Delete topics (use with caution)
//! - **Topic Listing**: List all available topics
//! - **Topic Configuration**: Check and update topic settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use dashflow_streaming::kafka::{create_topic, list_topics, TopicConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a topic
//!     let config = TopicConfig {
//!         num_partitions: 10,
//!         replication_factor: 3,
//!         ..Default::default()
//!     };
//!     create_topic("localhost:9092", "dashstream-events", config).await?;
//!
//!     // List topics
//!     let topics = list_topics("localhost:9092").await?;
//!     println!("Topics: {:?}", topics);
//!
//!     Ok(())
//! }
//! ```

use crate::errors::{Error, Result};
use crate::env_vars;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use std::env;
use std::time::Duration;

// =============================================================================
// Kafka Security Configuration (M-413: Unified across all Kafka clients)
// =============================================================================

/// Valid security protocols for Kafka connections
pub const VALID_SECURITY_PROTOCOLS: &[&str] = &["plaintext", "ssl", "sasl_plaintext", "sasl_ssl"];

/// Valid SASL mechanisms for Kafka authentication
pub const VALID_SASL_MECHANISMS: &[&str] =
    &["PLAIN", "SCRAM-SHA-256", "SCRAM-SHA-512", "GSSAPI", "OAUTHBEARER"];

/// Valid SSL endpoint identification algorithms
pub const VALID_SSL_ENDPOINT_ALGORITHMS: &[&str] = &["https", "none", ""];

/// Valid broker address family values for rdkafka
pub const VALID_BROKER_ADDRESS_FAMILIES: &[&str] = &["any", "v4", "v6"];

// =============================================================================
// Kafka Timeout Constants (M-618: Centralized timeout values)
// =============================================================================

/// Session timeout for metadata-only operations in milliseconds.
///
/// This is used for short-lived BaseConsumer instances that only fetch metadata
/// (topic listing, partition info, etc.) and don't join consumer groups.
///
/// 6 seconds is sufficient for metadata operations while keeping connections
/// short-lived. This is NOT the same as consumer group session timeout, which
/// should use `consumer::DEFAULT_SESSION_TIMEOUT_MS` (30 seconds).
pub const METADATA_SESSION_TIMEOUT_MS: &str = "6000";

/// Default timeout for Kafka admin operations (create/delete topic, etc.) in seconds.
///
/// This is the timeout for admin operations like creating and deleting topics.
/// Configurable via `KAFKA_OPERATION_TIMEOUT_SECS` env var.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default timeout for Kafka metadata operations (fetch topic list, partition info) in seconds.
///
/// This is the timeout for metadata fetch operations like listing topics.
/// Configurable via `KAFKA_METADATA_TIMEOUT_SECS` env var.
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 30;

/// Get the Kafka admin operation timeout from environment or default.
///
/// # Environment Variables
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `KAFKA_OPERATION_TIMEOUT_SECS` | Timeout for admin operations (create/delete topic) | 30 |
///
/// # Example
///
/// ```rust
/// use dashflow_streaming::kafka::get_operation_timeout;
///
/// // Returns default (30s) or env var value
/// let timeout = get_operation_timeout();
/// assert!(timeout.as_secs() >= 1);
/// ```
#[must_use]
pub fn get_operation_timeout() -> Duration {
    Duration::from_secs(env_vars::env_u64_or_default(
        env_vars::KAFKA_OPERATION_TIMEOUT_SECS,
        DEFAULT_OPERATION_TIMEOUT_SECS,
    ))
}

/// Get the Kafka metadata fetch timeout from environment or default.
///
/// # Environment Variables
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `KAFKA_METADATA_TIMEOUT_SECS` | Timeout for metadata operations (list topics) | 30 |
///
/// # Example
///
/// ```rust
/// use dashflow_streaming::kafka::get_metadata_timeout;
///
/// // Returns default (30s) or env var value
/// let timeout = get_metadata_timeout();
/// assert!(timeout.as_secs() >= 1);
/// ```
#[must_use]
pub fn get_metadata_timeout() -> Duration {
    Duration::from_secs(env_vars::env_u64_or_default(
        env_vars::KAFKA_METADATA_TIMEOUT_SECS,
        DEFAULT_METADATA_TIMEOUT_SECS,
    ))
}

/// Get the broker address family based on environment and bootstrap servers.
///
/// # M-478: Configurable Address Family
///
/// This function determines the appropriate `broker.address.family` setting:
///
/// 1. If `KAFKA_BROKER_ADDRESS_FAMILY` env var is set, use that value (must be "any", "v4", or "v6")
/// 2. For localhost-like addresses (localhost, 127.0.0.1, ::1), default to "v4" to avoid
///    IPv6 resolution issues with Docker-advertised brokers
/// 3. For all other addresses, default to "any" to allow IPv6-only environments
///
/// # Environment Variables
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `KAFKA_BROKER_ADDRESS_FAMILY` | Force address family: any, v4, v6 | auto-detect |
///
/// # Examples
///
/// ```rust
/// use dashflow_streaming::kafka::get_broker_address_family;
///
/// // Localhost defaults to v4 for Docker compatibility
/// assert_eq!(get_broker_address_family("localhost:9092"), "v4");
/// assert_eq!(get_broker_address_family("127.0.0.1:9092"), "v4");
///
/// // Remote hosts allow both IPv4 and IPv6
/// assert_eq!(get_broker_address_family("kafka.example.com:9092"), "any");
///
/// // Multiple brokers: if any is localhost, use v4
/// assert_eq!(get_broker_address_family("localhost:9092,kafka.example.com:9092"), "v4");
/// ```
#[must_use]
pub fn get_broker_address_family(bootstrap_servers: &str) -> &'static str {
    // Check for explicit override first
    if let Ok(family) = env::var(env_vars::KAFKA_BROKER_ADDRESS_FAMILY) {
        let family_lower = family.to_lowercase();
        if VALID_BROKER_ADDRESS_FAMILIES.contains(&family_lower.as_str()) {
            // Return static str for valid values
            return match family_lower.as_str() {
                "v4" => "v4",
                "v6" => "v6",
                _ => "any",
            };
        }
        // Invalid value - log warning and fall through to auto-detect
        tracing::warn!(
            value = %family,
            valid = ?VALID_BROKER_ADDRESS_FAMILIES,
            "Invalid KAFKA_BROKER_ADDRESS_FAMILY, using auto-detect"
        );
    }

    // Auto-detect based on bootstrap servers
    // If any broker looks like localhost, use v4 for Docker compatibility
    let is_localhost = bootstrap_servers
        .split(',')
        .any(|server| {
            let host = server.trim().split(':').next().unwrap_or("");
            host.eq_ignore_ascii_case("localhost")
                || host == "127.0.0.1"
                || host == "::1"
                || host.starts_with("127.")
        });

    if is_localhost {
        "v4"
    } else {
        "any"
    }
}

/// Unified Kafka security configuration.
///
/// This struct provides consistent security settings across all Kafka clients
/// (producer, consumer, admin client). Use `from_env()` to load from environment
/// variables for consistent configuration in production.
///
/// # Environment Variables
///
/// | Variable | Description | Default |
/// |----------|-------------|---------|
/// | `KAFKA_SECURITY_PROTOCOL` | Protocol: plaintext, ssl, sasl_plaintext, sasl_ssl | plaintext |
/// | `KAFKA_SASL_MECHANISM` | SASL mechanism: PLAIN, SCRAM-SHA-256, SCRAM-SHA-512, GSSAPI, OAUTHBEARER | PLAIN |
/// | `KAFKA_SASL_USERNAME` | Username for SASL authentication | None |
/// | `KAFKA_SASL_PASSWORD` | Password for SASL authentication | None |
/// | `KAFKA_SSL_CA_LOCATION` | Path to CA certificate file | None |
/// | `KAFKA_SSL_CERTIFICATE_LOCATION` | Path to client certificate (mTLS) | None |
/// | `KAFKA_SSL_KEY_LOCATION` | Path to client private key (mTLS) | None |
/// | `KAFKA_SSL_KEY_PASSWORD` | Password for client private key | None |
/// | `KAFKA_SSL_ENDPOINT_ALGORITHM` | Hostname verification: https, none | https |
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_streaming::kafka::KafkaSecurityConfig;
///
/// // Load from environment
/// let security = KafkaSecurityConfig::from_env();
///
/// // Or configure manually
/// let security = KafkaSecurityConfig {
///     security_protocol: "sasl_ssl".to_string(),
///     sasl_mechanism: Some("SCRAM-SHA-256".to_string()),
///     sasl_username: Some("kafka-user".to_string()),
///     sasl_password: Some("kafka-password".to_string()),
///     ssl_ca_location: Some("/etc/kafka/ca.pem".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct KafkaSecurityConfig {
    /// Security protocol: plaintext, ssl, sasl_plaintext, sasl_ssl
    pub security_protocol: String,

    /// SASL mechanism for authentication
    pub sasl_mechanism: Option<String>,

    /// SASL username for PLAIN and SCRAM mechanisms
    pub sasl_username: Option<String>,

    /// SASL password for PLAIN and SCRAM mechanisms
    pub sasl_password: Option<String>,

    /// Path to CA certificate file for SSL/TLS
    pub ssl_ca_location: Option<String>,

    /// Path to client certificate file for mutual TLS (mTLS)
    pub ssl_certificate_location: Option<String>,

    /// Path to client private key file for mutual TLS (mTLS)
    pub ssl_key_location: Option<String>,

    /// Password for the client private key (if encrypted)
    pub ssl_key_password: Option<String>,

    /// SSL endpoint identification algorithm for hostname verification
    pub ssl_endpoint_identification_algorithm: Option<String>,
}

impl Default for KafkaSecurityConfig {
    fn default() -> Self {
        Self {
            security_protocol: "plaintext".to_string(),
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
            ssl_certificate_location: None,
            ssl_key_location: None,
            ssl_key_password: None,
            ssl_endpoint_identification_algorithm: Some("https".to_string()),
        }
    }
}

impl KafkaSecurityConfig {
    /// Create a new plaintext (insecure) configuration for development.
    #[must_use]
    pub fn plaintext() -> Self {
        Self::default()
    }

    /// Create a TLS-only configuration (no SASL authentication).
    #[must_use]
    pub fn tls(ca_location: impl Into<String>) -> Self {
        Self {
            security_protocol: "ssl".to_string(),
            ssl_ca_location: Some(ca_location.into()),
            ..Default::default()
        }
    }

    /// Create a SASL + TLS configuration (recommended for production).
    #[must_use]
    pub fn sasl_ssl(
        mechanism: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        ca_location: Option<String>,
    ) -> Self {
        Self {
            security_protocol: "sasl_ssl".to_string(),
            sasl_mechanism: Some(mechanism.into()),
            sasl_username: Some(username.into()),
            sasl_password: Some(password.into()),
            ssl_ca_location: ca_location,
            ..Default::default()
        }
    }

    /// Load security configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let security_protocol = env_vars::env_string_or_default(
            env_vars::KAFKA_SECURITY_PROTOCOL,
            "plaintext",
        );

        let sasl_mechanism = env_vars::env_string(env_vars::KAFKA_SASL_MECHANISM);
        let sasl_username = env_vars::env_string(env_vars::KAFKA_SASL_USERNAME);
        let sasl_password = env_vars::env_string(env_vars::KAFKA_SASL_PASSWORD);

        let ssl_ca_location = env_vars::env_string(env_vars::KAFKA_SSL_CA_LOCATION);
        let ssl_certificate_location =
            env_vars::env_string(env_vars::KAFKA_SSL_CERTIFICATE_LOCATION);
        let ssl_key_location = env_vars::env_string(env_vars::KAFKA_SSL_KEY_LOCATION);
        let ssl_key_password = env_vars::env_string(env_vars::KAFKA_SSL_KEY_PASSWORD);

        let ssl_endpoint_identification_algorithm = env_vars::env_string_or_default(
            env_vars::KAFKA_SSL_ENDPOINT_ALGORITHM,
            "https",
        );

        Self {
            security_protocol,
            sasl_mechanism,
            sasl_username,
            sasl_password,
            ssl_ca_location,
            ssl_certificate_location,
            ssl_key_location,
            ssl_key_password,
            ssl_endpoint_identification_algorithm: Some(ssl_endpoint_identification_algorithm),
        }
    }

    /// Validate the security configuration.
    pub fn validate(&self) -> Result<()> {
        if !VALID_SECURITY_PROTOCOLS.contains(&self.security_protocol.as_str()) {
            return Err(Error::Kafka(format!(
                "Invalid security_protocol '{}'; expected one of: {}",
                self.security_protocol,
                VALID_SECURITY_PROTOCOLS.join(", ")
            )));
        }

        if let Some(ref mechanism) = self.sasl_mechanism {
            if !VALID_SASL_MECHANISMS.contains(&mechanism.as_str()) {
                return Err(Error::Kafka(format!(
                    "Invalid sasl_mechanism '{}'; expected one of: {}",
                    mechanism,
                    VALID_SASL_MECHANISMS.join(", ")
                )));
            }
        }

        if self.sasl_username.is_some() != self.sasl_password.is_some() {
            return Err(Error::Kafka(
                "Both sasl_username and sasl_password must be set together".to_string(),
            ));
        }

        if self.ssl_certificate_location.is_some() != self.ssl_key_location.is_some() {
            return Err(Error::Kafka(
                "Both ssl_certificate_location and ssl_key_location must be set together"
                    .to_string(),
            ));
        }

        if let Some(ref algorithm) = self.ssl_endpoint_identification_algorithm {
            if !VALID_SSL_ENDPOINT_ALGORITHMS.contains(&algorithm.as_str()) {
                return Err(Error::Kafka(format!(
                    "Invalid ssl_endpoint_identification_algorithm '{}'; expected one of: https, none, \"\"",
                    algorithm
                )));
            }
        }

        Ok(())
    }

    /// Apply this security configuration to an rdkafka `ClientConfig`.
    pub fn apply_to_rdkafka(&self, client_config: &mut ClientConfig) {
        client_config.set("security.protocol", &self.security_protocol);

        if let Some(ref ca_location) = self.ssl_ca_location {
            client_config.set("ssl.ca.location", ca_location);
        }
        if let Some(ref cert_location) = self.ssl_certificate_location {
            client_config.set("ssl.certificate.location", cert_location);
        }
        if let Some(ref key_location) = self.ssl_key_location {
            client_config.set("ssl.key.location", key_location);
        }
        if let Some(ref key_password) = self.ssl_key_password {
            client_config.set("ssl.key.password", key_password);
        }

        if self.security_protocol.contains("ssl") {
            if let Some(ref algorithm) = self.ssl_endpoint_identification_algorithm {
                client_config.set("ssl.endpoint.identification.algorithm", algorithm);
            }
        }

        if let Some(ref mechanism) = self.sasl_mechanism {
            client_config.set("sasl.mechanism", mechanism);
        }
        if let Some(ref username) = self.sasl_username {
            client_config.set("sasl.username", username);
        }
        if let Some(ref password) = self.sasl_password {
            client_config.set("sasl.password", password);
        }
    }

    /// Check if TLS/SSL is enabled.
    #[must_use]
    pub fn is_tls_enabled(&self) -> bool {
        self.security_protocol.contains("ssl")
    }

    /// Check if SASL authentication is enabled.
    #[must_use]
    pub fn is_sasl_enabled(&self) -> bool {
        self.security_protocol.contains("sasl")
    }

    /// Check if this is a secure configuration (not plaintext).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.security_protocol != "plaintext"
    }

    /// Create a base `ClientConfig` with standard settings and security applied.
    ///
    /// This applies:
    /// - Bootstrap servers
    /// - IPv4 address family (to avoid localhost IPv6 issues with Docker)
    /// - All security settings from this config
    ///
    /// # M-413: Unified Security Config
    ///
    /// Use this method to ensure consistent security settings across all Kafka clients.
    ///
    /// # Note
    ///
    /// This method does NOT validate the configuration. Use [`Self::create_client_config_checked`]
    /// if you want validation errors to surface immediately. Invalid configurations will
    /// cause cryptic errors when the client tries to connect.
    #[must_use]
    pub fn create_client_config(&self, bootstrap_servers: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", bootstrap_servers);
        // M-478: Use configurable address family instead of hardcoded v4
        config.set(
            "broker.address.family",
            get_broker_address_family(bootstrap_servers),
        );
        self.apply_to_rdkafka(&mut config);
        config
    }

    /// Create a base `ClientConfig` with validation.
    ///
    /// Same as [`Self::create_client_config`] but validates the security configuration first,
    /// returning a clear error if any env vars have invalid values.
    ///
    /// # M-474: Validated Config Creation
    ///
    /// Prefer this method over [`Self::create_client_config`] in production code to get
    /// early, actionable error messages instead of cryptic failures at connect time.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Bootstrap servers is empty
    /// - Security protocol is invalid (not one of: plaintext, ssl, sasl_plaintext, sasl_ssl)
    /// - SASL mechanism is invalid (not one of: PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    /// - SASL username is set without password (or vice versa)
    /// - SSL certificate is set without key (or vice versa)
    /// - SSL endpoint identification algorithm is invalid
    pub fn create_client_config_checked(&self, bootstrap_servers: &str) -> Result<ClientConfig> {
        // M-474: Validate early for clear error messages
        if bootstrap_servers.trim().is_empty() {
            return Err(Error::Kafka("bootstrap_servers cannot be empty".to_string()));
        }
        self.validate()?;
        Ok(self.create_client_config(bootstrap_servers))
    }
}

// =============================================================================
// Topic Configuration
// =============================================================================

/// Valid cleanup policies for Kafka topics
pub const VALID_CLEANUP_POLICIES: &[&str] = &["delete", "compact", "compact,delete"];

/// Valid compression types for Kafka topics
pub const VALID_COMPRESSION_TYPES: &[&str] = &["none", "gzip", "snappy", "lz4", "zstd", "producer"];

/// Topic configuration
#[derive(Debug, Clone)]
pub struct TopicConfig {
    /// Number of partitions (must be >= 1)
    pub num_partitions: i32,

    /// Replication factor (must be >= 1)
    pub replication_factor: i32,

    /// Retention time in milliseconds (-1 = forever)
    pub retention_ms: i64,

    /// Segment size in bytes
    pub segment_bytes: i64,

    /// Cleanup policy: "delete", "compact", or "compact,delete"
    pub cleanup_policy: String,

    /// Compression type: "none", "gzip", "snappy", "lz4", "zstd", or "producer"
    pub compression_type: String,

    /// Minimum in-sync replicas (optional, for production use with replication_factor > 1)
    /// When set, producers with acks=all will wait for this many replicas to acknowledge.
    pub min_insync_replicas: Option<i32>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            num_partitions: 10,
            replication_factor: 1, // Default for single-node setup
            retention_ms: 7 * 24 * 60 * 60 * 1000, // 7 days
            segment_bytes: 1024 * 1024 * 1024, // 1 GB
            cleanup_policy: "delete".to_string(),
            compression_type: "zstd".to_string(),
            min_insync_replicas: None, // Not set by default
        }
    }
}

/// Validate bootstrap_servers is not empty
fn validate_bootstrap_servers(bootstrap_servers: &str) -> Result<()> {
    if bootstrap_servers.trim().is_empty() {
        return Err(Error::Kafka(
            "bootstrap_servers cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate TopicConfig fields
fn validate_topic_config(config: &TopicConfig) -> Result<()> {
    // K-1: Validate num_partitions >= 1
    if config.num_partitions < 1 {
        return Err(Error::Kafka(format!(
            "num_partitions must be >= 1, got {}",
            config.num_partitions
        )));
    }

    // K-2: Validate replication_factor >= 1
    if config.replication_factor < 1 {
        return Err(Error::Kafka(format!(
            "replication_factor must be >= 1, got {}",
            config.replication_factor
        )));
    }

    // K-3: Validate cleanup_policy
    if !VALID_CLEANUP_POLICIES.contains(&config.cleanup_policy.as_str()) {
        return Err(Error::Kafka(format!(
            "invalid cleanup_policy '{}', must be one of: {}",
            config.cleanup_policy,
            VALID_CLEANUP_POLICIES.join(", ")
        )));
    }

    // K-4: Validate compression_type
    if !VALID_COMPRESSION_TYPES.contains(&config.compression_type.as_str()) {
        return Err(Error::Kafka(format!(
            "invalid compression_type '{}', must be one of: {}",
            config.compression_type,
            VALID_COMPRESSION_TYPES.join(", ")
        )));
    }

    // K-9: Validate min_insync_replicas if set
    if let Some(min_isr) = config.min_insync_replicas {
        if min_isr < 1 {
            return Err(Error::Kafka(format!(
                "min_insync_replicas must be >= 1, got {}",
                min_isr
            )));
        }
        if min_isr > config.replication_factor {
            return Err(Error::Kafka(format!(
                "min_insync_replicas ({}) cannot exceed replication_factor ({})",
                min_isr, config.replication_factor
            )));
        }
    }

    Ok(())
}

/// Maximum retry attempts for transient failures
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Create a new Kafka topic with validation and retry logic
pub async fn create_topic(
    bootstrap_servers: &str,
    topic_name: &str,
    config: TopicConfig,
) -> Result<()> {
    // K-7: Validate bootstrap_servers
    validate_bootstrap_servers(bootstrap_servers)?;

    // K-1, K-2, K-3, K-4, K-9: Validate topic config
    validate_topic_config(&config)?;

    // K-10: Retry logic with exponential backoff
    let mut last_error = None;
    for attempt in 0..MAX_RETRY_ATTEMPTS {
        if attempt > 0 {
            // Exponential backoff: 100ms, 200ms, 400ms...
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match create_topic_inner(bootstrap_servers, topic_name, &config).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                // Check if error is retryable (transient)
                let err_str = e.to_string();
                let is_retryable = err_str.contains("timeout")
                    || err_str.contains("Timeout")
                    || err_str.contains("connection")
                    || err_str.contains("Connection")
                    || err_str.contains("temporarily")
                    || err_str.contains("LeaderNotAvailable")
                    || err_str.contains("NotLeaderForPartition");

                if !is_retryable || attempt == MAX_RETRY_ATTEMPTS - 1 {
                    return Err(e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Kafka("create_topic failed after retries".to_string())))
}

/// Internal topic creation (without retry)
async fn create_topic_inner(
    bootstrap_servers: &str,
    topic_name: &str,
    config: &TopicConfig,
) -> Result<()> {
    // M-413: Apply security config from environment
    let security_config = KafkaSecurityConfig::from_env();
    let admin_client: AdminClient<DefaultClientContext> = security_config
        .create_client_config(bootstrap_servers)
        .create()
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create admin client: {e}"
            )))
        })?;

    // Create temporary strings to avoid lifetime issues
    let retention_ms = config.retention_ms.to_string();
    let segment_bytes = config.segment_bytes.to_string();

    let mut topic = NewTopic::new(
        topic_name,
        config.num_partitions,
        TopicReplication::Fixed(config.replication_factor),
    );

    // Set topic configuration
    topic = topic
        .set("retention.ms", &retention_ms)
        .set("segment.bytes", &segment_bytes)
        .set("cleanup.policy", &config.cleanup_policy)
        .set("compression.type", &config.compression_type);

    // K-9: Apply min.insync.replicas if set
    let min_isr_str;
    if let Some(min_isr) = config.min_insync_replicas {
        min_isr_str = min_isr.to_string();
        topic = topic.set("min.insync.replicas", &min_isr_str);
    }

    // M-49: Use configurable operation timeout
    let opts = AdminOptions::new().operation_timeout(Some(get_operation_timeout()));

    let results = admin_client
        .create_topics(&[topic], &opts)
        .await
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create topic: {e}"
            )))
        })?;

    for result in results {
        match result {
            Ok(_) => {}
            Err((topic, err)) => {
                // Ignore "already exists" error
                if !err.to_string().contains("already exists") {
                    return Err(Error::Io(std::io::Error::other(format!(
                        "Failed to create topic '{topic}': {err}"
                    ))));
                }
            }
        }
    }

    Ok(())
}

/// Delete a Kafka topic
///
/// Returns Ok(()) if the topic was deleted or if it didn't exist.
pub async fn delete_topic(bootstrap_servers: &str, topic_name: &str) -> Result<()> {
    // K-7: Validate bootstrap_servers
    validate_bootstrap_servers(bootstrap_servers)?;

    // M-413: Apply security config from environment
    let security_config = KafkaSecurityConfig::from_env();
    let admin_client: AdminClient<DefaultClientContext> = security_config
        .create_client_config(bootstrap_servers)
        .create()
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create admin client: {e}"
            )))
        })?;

    // M-49: Use configurable operation timeout
    let opts = AdminOptions::new().operation_timeout(Some(get_operation_timeout()));

    let results = admin_client
        .delete_topics(&[topic_name], &opts)
        .await
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to delete topic: {e}"
            )))
        })?;

    for result in results {
        match result {
            Ok(_) => {}
            Err((topic, err)) => {
                let err_str = err.to_string();
                // K-5: Gracefully handle "topic doesn't exist" errors
                // These are not failures - the desired end state (topic gone) is achieved
                if err_str.contains("Unknown topic")
                    || err_str.contains("does not exist")
                    || err_str.contains("UnknownTopicOrPartition")
                {
                    // Topic doesn't exist, which is fine - idempotent delete
                    continue;
                }
                return Err(Error::Io(std::io::Error::other(format!(
                    "Failed to delete topic '{topic}': {err}"
                ))));
            }
        }
    }

    Ok(())
}

/// List all Kafka topics
pub async fn list_topics(bootstrap_servers: &str) -> Result<Vec<String>> {
    // K-7: Validate bootstrap_servers
    validate_bootstrap_servers(bootstrap_servers)?;

    let bootstrap_servers = bootstrap_servers.to_string();
    tokio::task::spawn_blocking(move || {
        // M-413: Apply security config from environment
        let security_config = KafkaSecurityConfig::from_env();
        let mut client_config = security_config.create_client_config(&bootstrap_servers);
        client_config.set("session.timeout.ms", METADATA_SESSION_TIMEOUT_MS);
        let consumer: BaseConsumer = client_config.create().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create consumer: {e}"
            )))
        })?;

        // M-49: Use configurable metadata timeout
        let metadata = consumer
            .fetch_metadata(None, get_metadata_timeout())
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to fetch metadata: {e}"
                )))
            })?;

        let topics: Vec<String> = metadata
            .topics()
            .iter()
            .map(|t| t.name().to_string())
            .collect();

        Ok(topics)
    })
    .await
    .map_err(|e| {
        Error::Io(std::io::Error::other(format!(
            "list_topics join error: {e}"
        )))
    })?
}

/// Check if a topic exists
///
/// K-6: Optimized to use O(1) metadata lookup instead of fetching all topics.
/// Uses `fetch_metadata(Some(topic_name), ...)` for efficient single-topic check.
pub async fn topic_exists(bootstrap_servers: &str, topic_name: &str) -> Result<bool> {
    // K-7: Validate bootstrap_servers
    validate_bootstrap_servers(bootstrap_servers)?;

    let bootstrap_servers = bootstrap_servers.to_string();
    let topic_name = topic_name.to_string();

    tokio::task::spawn_blocking(move || {
        // M-413: Apply security config from environment
        let security_config = KafkaSecurityConfig::from_env();
        let mut client_config = security_config.create_client_config(&bootstrap_servers);
        client_config.set("session.timeout.ms", METADATA_SESSION_TIMEOUT_MS);
        let consumer: BaseConsumer = client_config.create().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create consumer: {e}"
            )))
        })?;

        // K-6: Fetch metadata for specific topic only (O(1) instead of O(n))
        // M-49: Use configurable metadata timeout
        let metadata = consumer
            .fetch_metadata(Some(&topic_name), get_metadata_timeout())
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to fetch metadata: {e}"
                )))
            })?;

        // If the topic doesn't exist, Kafka still returns metadata but with error
        // We check if any topic in the result matches our name and has no error
        let exists = metadata.topics().iter().any(|t| {
            t.name() == topic_name && t.error().is_none()
        });

        Ok(exists)
    })
    .await
    .map_err(|e| {
        Error::Io(std::io::Error::other(format!(
            "topic_exists join error: {e}"
        )))
    })?
}

/// Get the number of partitions for a topic
///
/// S-2: Returns the partition count for a given topic, enabling multi-partition consumers
/// to spawn one consumer per partition.
///
/// # Errors
/// Returns an error if the topic doesn't exist or if metadata fetch fails.
pub async fn get_partition_count(bootstrap_servers: &str, topic_name: &str) -> Result<i32> {
    validate_bootstrap_servers(bootstrap_servers)?;

    let bootstrap_servers = bootstrap_servers.to_string();
    let topic_name = topic_name.to_string();

    tokio::task::spawn_blocking(move || {
        // M-413: Apply security config from environment
        let security_config = KafkaSecurityConfig::from_env();
        let mut client_config = security_config.create_client_config(&bootstrap_servers);
        client_config.set("session.timeout.ms", METADATA_SESSION_TIMEOUT_MS);
        let consumer: BaseConsumer = client_config.create().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create consumer: {e}"
            )))
        })?;

        // M-49: Use configurable metadata timeout
        let metadata = consumer
            .fetch_metadata(Some(&topic_name), get_metadata_timeout())
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to fetch metadata: {e}"
                )))
            })?;

        // Find the topic in metadata
        for topic in metadata.topics() {
            if topic.name() == topic_name {
                if let Some(err) = topic.error() {
                    return Err(Error::Kafka(format!(
                        "Topic '{}' has error: {:?}",
                        topic_name, err
                    )));
                }
                return Ok(topic.partitions().len() as i32);
            }
        }

        Err(Error::Kafka(format!("Topic '{}' not found", topic_name)))
    })
    .await
    .map_err(|e| {
        Error::Io(std::io::Error::other(format!(
            "get_partition_count join error: {e}"
        )))
    })?
}

/// Get recommended topic configuration for DashFlow Streaming
#[must_use]
pub fn recommended_config() -> TopicConfig {
    TopicConfig {
        num_partitions: 10,
        replication_factor: 3,                 // For production with 3+ brokers
        retention_ms: 7 * 24 * 60 * 60 * 1000, // 7 days
        segment_bytes: 1024 * 1024 * 1024,     // 1 GB
        cleanup_policy: "delete".to_string(),
        compression_type: "zstd".to_string(),
        min_insync_replicas: Some(2),          // K-9: Require 2 replicas for durability
    }
}

/// Get development topic configuration for DashFlow Streaming
#[must_use]
pub fn dev_config() -> TopicConfig {
    TopicConfig {
        num_partitions: 3,
        replication_factor: 1,             // Single broker
        retention_ms: 24 * 60 * 60 * 1000, // 1 day
        segment_bytes: 256 * 1024 * 1024,  // 256 MB
        cleanup_policy: "delete".to_string(),
        compression_type: "producer".to_string(), // Use producer's compression setting (none)
        min_insync_replicas: None,         // Not needed for single broker
    }
}

/// Get topic configuration for Dead Letter Queue (DLQ) topics
///
/// DLQ topics have different requirements than main topics:
/// - Longer retention (30 days) for forensic analysis of failed messages
/// - Fewer partitions (3) since DLQ volume is typically much lower
/// - zstd compression for space efficiency
///
/// # M-410: Topic Provisioning
///
/// Use this with [`ensure_topics_with_dlq`] to provision main + DLQ topics together.
#[must_use]
pub fn dlq_config() -> TopicConfig {
    TopicConfig {
        num_partitions: 3,
        replication_factor: 1,                  // Override for production
        retention_ms: 30 * 24 * 60 * 60 * 1000, // 30 days for forensic analysis
        segment_bytes: 256 * 1024 * 1024,       // 256 MB (lower volume)
        cleanup_policy: "delete".to_string(),
        compression_type: "zstd".to_string(),   // Space efficiency for long retention
        min_insync_replicas: None,
    }
}

/// Ensure a topic exists, creating it if necessary
///
/// This is an idempotent operation - calling it multiple times is safe.
///
/// # Arguments
///
/// * `bootstrap_servers` - Kafka broker addresses
/// * `topic_name` - Name of the topic to ensure exists
/// * `config` - Configuration to use if creating the topic
///
/// # Returns
///
/// * `Ok(true)` - Topic was created
/// * `Ok(false)` - Topic already existed
/// * `Err(_)` - Failed to check or create topic
///
/// # M-410: Topic Provisioning
///
/// Use this instead of relying on Kafka auto-create, which may create topics
/// with incorrect partition counts and retention settings.
pub async fn ensure_topic_exists(
    bootstrap_servers: &str,
    topic_name: &str,
    config: TopicConfig,
) -> Result<bool> {
    // Check if topic already exists
    if topic_exists(bootstrap_servers, topic_name).await? {
        return Ok(false);
    }

    // Topic doesn't exist, create it
    create_topic(bootstrap_servers, topic_name, config).await?;
    Ok(true)
}

/// Ensure both a main topic and its DLQ topic exist
///
/// Creates `{topic_name}` and `{topic_name}-dlq` with appropriate configurations.
/// This is idempotent - safe to call multiple times.
///
/// # Arguments
///
/// * `bootstrap_servers` - Kafka broker addresses
/// * `topic_name` - Base name for the topic (DLQ will be `{topic_name}-dlq`)
/// * `main_config` - Configuration for the main topic
/// * `dlq_config` - Configuration for the DLQ topic
///
/// # Returns
///
/// * `Ok((main_created, dlq_created))` - Tuple of bools indicating if each was created
/// * `Err(_)` - Failed to check or create topics
///
/// # Example
///
/// ```no_run
/// use dashflow_streaming::kafka::{ensure_topics_with_dlq, recommended_config, dlq_config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (main_created, dlq_created) = ensure_topics_with_dlq(
///     "localhost:9092",
///     "my-events",
///     recommended_config(),
///     dlq_config(),
/// ).await?;
///
/// if main_created {
///     println!("Created my-events topic");
/// }
/// if dlq_created {
///     println!("Created my-events-dlq topic");
/// }
/// # Ok(())
/// # }
/// ```
///
/// # M-410: Topic Provisioning
///
/// This ensures production deployments have topics with correct settings,
/// rather than relying on Kafka auto-create which may use defaults.
pub async fn ensure_topics_with_dlq(
    bootstrap_servers: &str,
    topic_name: &str,
    main_config: TopicConfig,
    dlq_config: TopicConfig,
) -> Result<(bool, bool)> {
    let dlq_topic_name = format!("{topic_name}-dlq");

    let main_created = ensure_topic_exists(bootstrap_servers, topic_name, main_config).await?;
    let dlq_created = ensure_topic_exists(bootstrap_servers, &dlq_topic_name, dlq_config).await?;

    Ok((main_created, dlq_created))
}
