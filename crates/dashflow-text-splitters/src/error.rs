//! Error types for text splitters

use thiserror::Error;

/// Errors that can occur when using text splitters
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration for text splitter
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error during text splitting
    #[error("Text splitting failed: {0}")]
    SplittingError(String),

    /// Error from dashflow::core
    #[error("Core error: {0}")]
    CoreError(#[from] dashflow::core::Error),
}

/// Result type for text splitters
pub type Result<T> = std::result::Result<T, Error>;
