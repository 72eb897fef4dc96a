//! Compression support for `DashFlow` checkpointers
//!
//! This crate provides compression algorithms for reducing storage size
//! of checkpoint data. It supports:
//!
//! - **Zstd**: Best compression ratio (5-10Ã—), moderate speed
//! - **LZ4**: Fastest compression (2-3Ã—), lowest CPU usage
//! - **Snappy**: Balanced (3-5Ã—), good for mixed workloads
//!
//! # Example
//!
//! ```rust
//! use dashflow_compression::{Compression, CompressionType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a Zstd compressor with level 3
//! let compressor = CompressionType::Zstd(3).build()?;
//!
//! let data = b"Hello, world! This is a test of compression.";
//! let compressed = compressor.compress(data)?;
//! let decompressed = compressor.decompress(&compressed)?;
//!
//! assert_eq!(data, decompressed.as_slice());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Default maximum decompressed size: 100 MB
/// This prevents decompression bombs from consuming all available memory.
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// Compression errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CompressionError {
    /// Compression failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    /// Decompression failed
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// Feature not enabled
    #[error("Compression type not available: {0}. Enable the corresponding feature flag.")]
    FeatureNotEnabled(String),

    /// Decompressed size exceeds maximum allowed limit (protection against decompression bombs)
    #[error("Decompressed size {actual} exceeds maximum allowed {max_allowed} bytes")]
    DecompressionSizeExceeded {
        /// Actual or estimated decompressed size
        actual: usize,
        /// Maximum allowed decompressed size
        max_allowed: usize,
    },
}

/// Compression trait for implementing different compression algorithms
pub trait Compression: Send + Sync {
    /// Compress data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Decompress data
    ///
    /// **Warning:** This method has no size limit and could be vulnerable to
    /// decompression bombs. For untrusted input, use [`Self::decompress_with_limit`]
    /// instead.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    /// Decompress data with a maximum output size limit
    ///
    /// This method provides protection against decompression bombs (malicious
    /// compressed data that expands to enormous sizes). If the decompressed
    /// data would exceed `max_size`, returns [`CompressionError::DecompressionSizeExceeded`].
    ///
    /// # Arguments
    ///
    /// * `data` - Compressed data to decompress
    /// * `max_size` - Maximum allowed decompressed size in bytes
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_compression::{Compression, CompressionType, DEFAULT_MAX_DECOMPRESSED_SIZE};
    ///
    /// let compressor = CompressionType::Zstd(3).build().unwrap();
    /// let data = b"Hello, world!";
    /// let compressed_data = compressor.compress(data).unwrap();
    /// let result = compressor.decompress_with_limit(&compressed_data, DEFAULT_MAX_DECOMPRESSED_SIZE);
    /// assert!(result.is_ok());
    /// ```
    fn decompress_with_limit(
        &self,
        data: &[u8],
        max_size: usize,
    ) -> Result<Vec<u8>, CompressionError> {
        let result = self.decompress(data)?;
        if result.len() > max_size {
            return Err(CompressionError::DecompressionSizeExceeded {
                actual: result.len(),
                max_allowed: max_size,
            });
        }
        Ok(result)
    }

    /// Decompress data with the default size limit (100 MB)
    ///
    /// This is a convenience method that calls [`Self::decompress_with_limit`] with
    /// [`DEFAULT_MAX_DECOMPRESSED_SIZE`].
    fn decompress_safe(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        self.decompress_with_limit(data, DEFAULT_MAX_DECOMPRESSED_SIZE)
    }

    /// Get the name of the compression algorithm
    fn name(&self) -> &str;
}

/// Compression type with configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Zstd compression with level (1-22, default: 3)
    /// - Best ratio: 5-10Ã— compression
    /// - Moderate speed
    /// - Good for large states
    Zstd(i32),

    /// LZ4 compression (no level configuration)
    /// - Fastest: 2-3Ã— compression
    /// - Lowest CPU usage
    /// - Good for frequent checkpoints
    Lz4,

    /// Snappy compression (no level configuration)
    /// - Balanced: 3-5Ã— compression
    /// - Good for mixed workloads
    Snappy,
}

impl CompressionType {
    /// Build a compression instance from this type
    pub fn build(self) -> Result<Box<dyn Compression>, CompressionError> {
        match self {
            #[cfg(feature = "zstd")]
            CompressionType::Zstd(level) => Ok(Box::new(ZstdCompression { level })),
            #[cfg(not(feature = "zstd"))]
            CompressionType::Zstd(_) => Err(CompressionError::FeatureNotEnabled(
                "zstd (enable with feature: zstd)".to_string(),
            )),

            #[cfg(feature = "lz4")]
            CompressionType::Lz4 => Ok(Box::new(Lz4Compression)),
            #[cfg(not(feature = "lz4"))]
            CompressionType::Lz4 => Err(CompressionError::FeatureNotEnabled(
                "lz4 (enable with feature: lz4)".to_string(),
            )),

            #[cfg(feature = "snappy")]
            CompressionType::Snappy => Ok(Box::new(SnappyCompression)),
            #[cfg(not(feature = "snappy"))]
            CompressionType::Snappy => Err(CompressionError::FeatureNotEnabled(
                "snappy (enable with feature: snappy)".to_string(),
            )),
        }
    }

    /// Get the name of this compression type
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CompressionType::Zstd(_) => "zstd",
            CompressionType::Lz4 => "lz4",
            CompressionType::Snappy => "snappy",
        }
    }
}

impl Default for CompressionType {
    /// Default compression: Zstd level 3
    fn default() -> Self {
        CompressionType::Zstd(3)
    }
}

// Zstd implementation
#[cfg(feature = "zstd")]
struct ZstdCompression {
    level: i32,
}

#[cfg(feature = "zstd")]
impl Compression for ZstdCompression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::encode_all(data, self.level).map_err(|e| {
            CompressionError::CompressionFailed(format!("Zstd compression failed: {e}"))
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::decode_all(data).map_err(|e| {
            CompressionError::DecompressionFailed(format!("Zstd decompression failed: {e}"))
        })
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}

// LZ4 implementation
#[cfg(feature = "lz4")]
struct Lz4Compression;

#[cfg(feature = "lz4")]
impl Compression for Lz4Compression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        lz4_flex::decompress_size_prepended(data).map_err(|e| {
            CompressionError::DecompressionFailed(format!("LZ4 decompression failed: {e}"))
        })
    }

    fn name(&self) -> &'static str {
        "lz4"
    }
}

// Snappy implementation
#[cfg(feature = "snappy")]
struct SnappyCompression;

#[cfg(feature = "snappy")]
impl Compression for SnappyCompression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = snap::raw::Encoder::new();
        encoder.compress_vec(data).map_err(|e| {
            CompressionError::CompressionFailed(format!("Snappy compression failed: {e}"))
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut decoder = snap::raw::Decoder::new();
        decoder.decompress_vec(data).map_err(|e| {
            CompressionError::DecompressionFailed(format!("Snappy decompression failed: {e}"))
        })
    }

    fn name(&self) -> &'static str {
        "snappy"
    }
}
