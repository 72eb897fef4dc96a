//! Utility functions for Redis vector store operations.

use dashflow::core::error::{Error, Result};

/// Encode a vector of f32 values to bytes for Redis storage.
///
/// Redis expects vectors as binary blobs. This function converts a slice of
/// f32 values to bytes in little-endian format.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode bytes from Redis back to a vector of f32 values.
///
/// Reverses the encoding done by `encode_vector()`.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::config(format!(
            "Invalid vector bytes length: {} (must be multiple of 4)",
            bytes.len()
        )));
    }

    let mut vector = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        vector.push(value);
    }
    Ok(vector)
}
