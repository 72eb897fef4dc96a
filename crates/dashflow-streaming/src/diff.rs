// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! State diffing and patching for efficient state transmission
//!
//! This module provides functionality to compute diffs between state snapshots
//! and apply patches to reconstruct states. It implements JSON Patch (RFC 6902)
//! operations optimized for DashFlow state transmission.
//!
//! # Key Features
//!
//! - **Diff Generation**: Compute minimal JSON Patch operations between states
//! - **Patch Application**: Apply patches to reconstruct states
//! - **Size Optimization**: Automatically use full state if smaller than patch
//! - **Integrity Validation**: SHA-256 hashes verify patch correctness
//! - **High Performance**: Optimized for large state graphs
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use dashflow_streaming::diff::{diff_states, apply_patch, DiffResult};
//!
//! // Old and new state
//! let old_state = json!({
//!     "messages": ["Hello"],
//!     "counter": 5
//! });
//! let new_state = json!({
//!     "messages": ["Hello", "World"],
//!     "counter": 6
//! });
//!
//! // Generate diff
//! let result = diff_states(&old_state, &new_state).unwrap();
//!
//! // Apply patch to reconstruct state
//! let reconstructed = apply_patch(&old_state, &result.patch).unwrap();
//! assert_eq!(reconstructed, new_state);
//! ```

pub mod protobuf;

use json_patch::{diff as json_diff, patch as json_patch};

// Re-export Patch for external use
pub use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{Error, Result};

/// Result of a diff operation, including the patch and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    /// JSON Patch operations (RFC 6902)
    pub patch: Patch,

    /// Size of the patch in bytes when serialized
    pub patch_size: usize,

    /// Size of the full new state in bytes
    pub full_state_size: usize,

    /// Whether to use full state instead of patch (when patch is larger)
    pub use_full_state: bool,

    /// SHA-256 hash of the new state for integrity verification
    pub state_hash: String,

    /// SHA-256 hash of the patch for integrity verification
    pub patch_hash: String,
}

impl DiffResult {
    /// Check if the patch should be used instead of full state
    #[must_use]
    pub fn should_use_patch(&self) -> bool {
        !self.use_full_state
    }

    /// Get the optimal payload (patch or full state) as JSON
    #[must_use]
    pub fn optimal_payload(&self, full_state: &Value) -> Value {
        if self.use_full_state {
            full_state.clone()
        } else {
            serde_json::to_value(&self.patch).unwrap_or_else(|_| full_state.clone())
        }
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DiffResult {{ patch_ops: {}, patch_size: {} bytes, full_state_size: {} bytes, use_full_state: {}, savings: {:.1}% }}",
            self.patch.0.len(),
            self.patch_size,
            self.full_state_size,
            self.use_full_state,
            if self.use_full_state {
                0.0
            } else {
                (1.0 - (self.patch_size as f64 / self.full_state_size as f64)) * 100.0
            }
        )
    }
}

/// Compute diff between two JSON states
///
/// Returns a `DiffResult` containing the patch and metadata about whether
/// to use the patch or full state based on size optimization.
///
/// # Arguments
///
/// * `old_state` - The previous state
/// * `new_state` - The current state
///
/// # Returns
///
/// A `DiffResult` with the patch and optimization metadata
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use dashflow_streaming::diff::diff_states;
///
/// let old = json!({"count": 1});
/// let new = json!({"count": 2});
/// let result = diff_states(&old, &new).unwrap();
/// assert_eq!(result.patch.0.len(), 1); // One replace operation
/// ```
pub fn diff_states(old_state: &Value, new_state: &Value) -> Result<DiffResult> {
    // Generate JSON Patch
    let patch = json_diff(old_state, new_state);

    // Calculate sizes
    let patch_json = serde_json::to_vec(&patch)
        .map_err(|e| Error::Serialization(format!("Failed to serialize patch: {e}")))?;
    let patch_size = patch_json.len();

    let full_state_json = serde_json::to_vec(new_state)
        .map_err(|e| Error::Serialization(format!("Failed to serialize state: {e}")))?;
    let full_state_size = full_state_json.len();

    // Compute hashes
    let state_hash = compute_state_hash_hex(new_state)?;
    let patch_hash = compute_hash(&patch_json);

    // Optimization: use full state if patch is larger
    // Add 10% buffer to account for compression differences
    let use_full_state = patch_size > (full_state_size * 11 / 10);

    Ok(DiffResult {
        patch,
        patch_size,
        full_state_size,
        use_full_state,
        state_hash,
        patch_hash,
    })
}

/// Apply a JSON Patch to a state
///
/// # Arguments
///
/// * `old_state` - The state to apply the patch to
/// * `patch` - The JSON Patch operations
///
/// # Returns
///
/// The new state after applying the patch
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use json_patch::Patch;
/// use dashflow_streaming::diff::apply_patch;
///
/// let state = json!({"count": 1});
/// let patch: Patch = serde_json::from_value(json!([
///     {"op": "replace", "path": "/count", "value": 2}
/// ])).unwrap();
///
/// let new_state = apply_patch(&state, &patch).unwrap();
/// assert_eq!(new_state["count"], 2);
/// ```
pub fn apply_patch(old_state: &Value, patch: &Patch) -> Result<Value> {
    let mut state = old_state.clone();
    json_patch(&mut state, patch)
        .map_err(|e| Error::DiffError(format!("Failed to apply patch: {e}")))?;
    Ok(state)
}

/// Verify the integrity of a state using its hash
///
/// # Arguments
///
/// * `state` - The state to verify
/// * `expected_hash` - The expected SHA-256 hash (hex string)
///
/// # Returns
///
/// `Ok(())` if the hash matches, error otherwise
pub fn verify_state_hash(state: &Value, expected_hash: &str) -> Result<()> {
    let actual_hash = compute_state_hash_hex(state)?;

    if actual_hash != expected_hash {
        return Err(Error::DiffError(format!(
            "State hash mismatch: expected {expected_hash}, got {actual_hash}"
        )));
    }

    Ok(())
}

/// Verify the integrity of a patch using its hash
///
/// # Arguments
///
/// * `patch` - The patch to verify
/// * `expected_hash` - The expected SHA-256 hash (hex string)
///
/// # Returns
///
/// `Ok(())` if the hash matches, error otherwise
pub fn verify_patch_hash(patch: &Patch, expected_hash: &str) -> Result<()> {
    let patch_json = serde_json::to_vec(patch)
        .map_err(|e| Error::Serialization(format!("Failed to serialize patch: {e}")))?;
    let actual_hash = compute_hash(&patch_json);

    if actual_hash != expected_hash {
        return Err(Error::DiffError(format!(
            "Patch hash mismatch: expected {expected_hash}, got {actual_hash}"
        )));
    }

    Ok(())
}

fn compute_state_hash_hex(state: &Value) -> Result<String> {
    let canonical = canonical_json_bytes(state)?;
    Ok(compute_hash(&canonical))
}

fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_canonical_json(value, &mut out)?;
    Ok(out)
}

fn write_canonical_json(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let json = serde_json::to_vec(value)
                .map_err(|e| Error::Serialization(format!("Failed to serialize value: {e}")))?;
            out.extend_from_slice(&json);
            Ok(())
        }
        Value::Array(values) => {
            out.push(b'[');
            for (i, item) in values.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical_json(item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        Value::Object(map) => {
            out.push(b'{');

            let mut entries: Vec<(&str, &Value)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            for (i, (key, child)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }

                let key_json = serde_json::to_vec(key)
                    .map_err(|e| Error::Serialization(format!("Failed to serialize key: {e}")))?;
                out.extend_from_slice(&key_json);
                out.push(b':');
                write_canonical_json(child, out)?;
            }

            out.push(b'}');
            Ok(())
        }
    }
}

/// Compute SHA-256 hash of data
fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
