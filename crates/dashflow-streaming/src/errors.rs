// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

use thiserror::Error;

/// Error types for DashFlow Streaming operations
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Protobuf encoding error
    #[error("Protobuf encoding error: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),

    /// Protobuf decoding error
    #[error("Protobuf decoding error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Decompression error
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Diff/patch error
    #[error("Diff/patch error: {0}")]
    DiffError(String),

    /// Kafka configuration/validation error
    #[error("Kafka error: {0}")]
    Kafka(String),
}

/// Result type for DashFlow Streaming operations
pub type Result<T> = std::result::Result<T, Error>;
