//! Utility functions for memory implementations.

use dashflow::core::error::{Error, Result};
use std::collections::HashMap;

/// Get the prompt input key from inputs, excluding memory variables.
///
/// Returns the single input key that should be used for the prompt,
/// after excluding memory variables and special keys like "stop".
///
/// # Arguments
///
/// * `inputs` - The input dictionary
/// * `memory_variables` - List of memory variable keys to exclude
///
/// # Returns
///
/// The single prompt input key
///
/// # Errors
///
/// Returns an error if there is not exactly one prompt input key.
///
/// # Python Baseline Compatibility
///
/// Matches `dashflow.memory.utils.get_prompt_input_key`.
/// Source: ~/`dashflow/libs/dashflow/dashflow_classic/memory/utils.py` (lines 4-20)
pub fn get_prompt_input_key(
    inputs: &HashMap<String, String>,
    memory_variables: &[String],
) -> Result<String> {
    // Build set of keys to exclude
    let mut exclude = memory_variables.to_vec();
    exclude.push("stop".to_string()); // "stop" is a special key

    let exclude_set: std::collections::HashSet<_> = exclude.into_iter().collect();

    // Get input keys that aren't in the exclude set
    let prompt_input_keys: Vec<_> = inputs
        .keys()
        .filter(|k| !exclude_set.contains(k.as_str()))
        .cloned()
        .collect();

    // Must have exactly one prompt input key
    if prompt_input_keys.len() != 1 {
        return Err(Error::config(format!(
            "One input key expected, got {prompt_input_keys:?}"
        )));
    }

    Ok(prompt_input_keys[0].clone())
}
