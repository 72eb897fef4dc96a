//! File management tools for agents.
//!
//! This module provides individual tools for file operations including:
//! - Reading files
//! - Writing files (with append support)
//! - Copying files
//! - Moving files
//! - Deleting files
//! - Listing directories
//! - Searching for files with patterns

use async_trait::async_trait;
use dashflow::core::tools::{Tool, ToolInput};
use dashflow::core::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{format_invalid_path_error, get_validated_relative_path};

/// Tool for reading files from disk.
///
/// # Security
///
/// When using `root_dir`, file operations are restricted to paths within that directory.
/// Directory traversal attacks (e.g., "../../../etc/passwd") are prevented.
///
/// # Examples
///
/// ```no_run
/// use dashflow_file_management::tools::ReadFileTool;
/// use dashflow::core::tools::Tool;
///
/// #[tokio::main]
/// async fn main() {
///     let tool = ReadFileTool::new(Some("/tmp/sandbox".to_string()));
///     // Can only read files within /tmp/sandbox
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ReadFileTool {
    /// Optional root directory to scope file operations
    pub root_dir: Option<String>,
}

impl ReadFileTool {
    /// Create a new `ReadFileTool` with optional root directory
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    /// Get the validated path relative to `root_dir`
    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read file from disk"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let file_path = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(ref v) => v
                .get("file_path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    dashflow::core::Error::tool_error("Missing file_path parameter".to_string())
                })?
                .to_string(),
        };

        let read_path = match self.get_relative_path(&file_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("file_path", &file_path)),
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let file_path_clone = file_path.clone();
        tokio::task::spawn_blocking(move || {
            if !read_path.exists() {
                return format!("Error: no such file or directory: {file_path_clone}");
            }

            match fs::read_to_string(&read_path) {
                Ok(content) => content,
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for writing files to disk.
///
/// Supports both overwrite and append modes.
#[derive(Debug, Clone)]
pub struct WriteFileTool {
    /// Optional root directory to scope file operations
    pub root_dir: Option<String>,
}

impl WriteFileTool {
    /// Create a new `WriteFileTool` with optional root directory
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write file to disk"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let (file_path, text, append) = match input {
            ToolInput::String(s) => {
                // Simple mode: just the text content, write to "output.txt"
                ("output.txt".to_string(), s, false)
            }
            ToolInput::Structured(ref v) => {
                let file_path = v
                    .get("file_path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error("Missing file_path parameter".to_string())
                    })?
                    .to_string();
                let text = v
                    .get("text")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error("Missing text parameter".to_string())
                    })?
                    .to_string();
                let append = v
                    .get("append")
                    .and_then(serde_json::value::Value::as_bool)
                    .unwrap_or(false);
                (file_path, text, append)
            }
        };

        let write_path = match self.get_relative_path(&file_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("file_path", &file_path)),
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let file_path_clone = file_path.clone();
        tokio::task::spawn_blocking(move || {
            // Create parent directories if needed
            if let Some(parent) = write_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    return format!("Error: {e}");
                }
            }

            let result = if append {
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&write_path)
                    .and_then(|mut file| {
                        use std::io::Write;
                        file.write_all(text.as_bytes())
                    })
            } else {
                fs::write(&write_path, text)
            };

            match result {
                Ok(()) => format!("File written successfully to {file_path_clone}."),
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for copying files.
#[derive(Debug, Clone)]
pub struct CopyFileTool {
    pub root_dir: Option<String>,
}

impl CopyFileTool {
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &'static str {
        "copy_file"
    }

    fn description(&self) -> &'static str {
        "Create a copy of a file in a specified location"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let (source_path, destination_path) = match input {
            ToolInput::String(_s) => {
                return Ok("Error: copy_file requires structured input with source_path and destination_path".to_string());
            }
            ToolInput::Structured(ref v) => {
                let source = v
                    .get("source_path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error(
                            "Missing source_path parameter".to_string(),
                        )
                    })?
                    .to_string();
                let dest = v
                    .get("destination_path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error(
                            "Missing destination_path parameter".to_string(),
                        )
                    })?
                    .to_string();
                (source, dest)
            }
        };

        let source_path_resolved = match self.get_relative_path(&source_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("source_path", &source_path)),
        };

        let dest_path_resolved = match self.get_relative_path(&destination_path) {
            Ok(path) => path,
            Err(_) => {
                return Ok(format_invalid_path_error(
                    "destination_path",
                    &destination_path,
                ))
            }
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let source_path_clone = source_path.clone();
        let dest_path_clone = destination_path.clone();
        tokio::task::spawn_blocking(move || {
            match fs::copy(&source_path_resolved, &dest_path_resolved) {
                Ok(_) => format!(
                    "File copied successfully from {source_path_clone} to {dest_path_clone}."
                ),
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for moving/renaming files.
#[derive(Debug, Clone)]
pub struct MoveFileTool {
    pub root_dir: Option<String>,
}

impl MoveFileTool {
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for MoveFileTool {
    fn name(&self) -> &'static str {
        "move_file"
    }

    fn description(&self) -> &'static str {
        "Move or rename a file from one location to another"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let (source_path, destination_path) = match input {
            ToolInput::String(_s) => {
                return Ok("Error: move_file requires structured input with source_path and destination_path".to_string());
            }
            ToolInput::Structured(ref v) => {
                let source = v
                    .get("source_path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error(
                            "Missing source_path parameter".to_string(),
                        )
                    })?
                    .to_string();
                let dest = v
                    .get("destination_path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        dashflow::core::Error::tool_error(
                            "Missing destination_path parameter".to_string(),
                        )
                    })?
                    .to_string();
                (source, dest)
            }
        };

        let source_path_resolved = match self.get_relative_path(&source_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("source_path", &source_path)),
        };

        let dest_path_resolved = match self.get_relative_path(&destination_path) {
            Ok(path) => path,
            Err(_) => {
                return Ok(format_invalid_path_error(
                    "destination_path",
                    &destination_path,
                ))
            }
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let source_path_clone = source_path.clone();
        let dest_path_clone = destination_path.clone();
        tokio::task::spawn_blocking(move || {
            if !source_path_resolved.exists() {
                return format!("Error: no such file or directory {source_path_clone}");
            }

            match fs::rename(&source_path_resolved, &dest_path_resolved) {
                Ok(()) => format!(
                    "File moved successfully from {source_path_clone} to {dest_path_clone}."
                ),
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for deleting files.
#[derive(Debug, Clone)]
pub struct DeleteFileTool {
    pub root_dir: Option<String>,
}

impl DeleteFileTool {
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &'static str {
        "file_delete"
    }

    fn description(&self) -> &'static str {
        "Delete a file"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let file_path = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(ref v) => v
                .get("file_path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    dashflow::core::Error::tool_error("Missing file_path parameter".to_string())
                })?
                .to_string(),
        };

        let file_path_resolved = match self.get_relative_path(&file_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("file_path", &file_path)),
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let file_path_clone = file_path.clone();
        tokio::task::spawn_blocking(move || {
            if !file_path_resolved.exists() {
                return format!("Error: no such file or directory: {file_path_clone}");
            }

            match fs::remove_file(&file_path_resolved) {
                Ok(()) => format!("File deleted successfully: {file_path_clone}."),
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for listing directory contents.
#[derive(Debug, Clone)]
pub struct ListDirectoryTool {
    pub root_dir: Option<String>,
}

impl ListDirectoryTool {
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "List files and directories in a specified folder"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let dir_path = match input {
            ToolInput::String(s) => s,
            ToolInput::Structured(ref v) => v
                .get("dir_path")
                .and_then(|v| v.as_str())
                .unwrap_or(".")
                .to_string(),
        };

        let dir_path_resolved = match self.get_relative_path(&dir_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("dir_path", &dir_path)),
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let dir_path_clone = dir_path.clone();
        tokio::task::spawn_blocking(move || {
            match fs::read_dir(&dir_path_resolved) {
                Ok(entries) => {
                    let names: Vec<String> = entries
                        .filter_map(|entry| {
                            entry.ok().and_then(|e| {
                                e.file_name().to_str().map(std::string::ToString::to_string)
                            })
                        })
                        .collect();

                    if names.is_empty() {
                        format!("No files found in directory {dir_path_clone}")
                    } else {
                        names.join("\n")
                    }
                }
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}

/// Tool for searching files with glob patterns.
#[derive(Debug, Clone)]
pub struct FileSearchTool {
    pub root_dir: Option<String>,
}

impl FileSearchTool {
    #[must_use]
    pub fn new(root_dir: Option<String>) -> Self {
        Self { root_dir }
    }

    fn get_relative_path(&self, file_path: &str) -> std::result::Result<PathBuf, String> {
        if let Some(ref root) = self.root_dir {
            let root_path = Path::new(root);
            get_validated_relative_path(root_path, file_path).map_err(|_e| {
                format!("Path {file_path} is outside of the allowed directory {root}")
            })
        } else {
            Ok(PathBuf::from(file_path))
        }
    }

    /// Match a filename against a pattern (Unix shell style: * matches everything)
    fn matches_pattern(filename: &str, pattern: &str) -> bool {
        // Simple glob matching: * matches any sequence of characters
        let pattern_parts: Vec<&str> = pattern.split('*').collect();

        if pattern_parts.len() == 1 {
            // No wildcards, exact match
            return filename == pattern;
        }

        let mut pos = 0;
        for (i, part) in pattern_parts.iter().enumerate() {
            if i == 0 {
                // First part must match the start
                if !filename.starts_with(part) {
                    return false;
                }
                pos = part.len();
            } else if i == pattern_parts.len() - 1 {
                // Last part must match the end
                if !filename.ends_with(part) {
                    return false;
                }
            } else {
                // Middle parts must be found in order
                if let Some(idx) = filename[pos..].find(part) {
                    pos += idx + part.len();
                } else {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &'static str {
        "file_search"
    }

    fn description(&self) -> &'static str {
        "Recursively search for files in a subdirectory that match the regex pattern"
    }

    async fn _call(&self, input: ToolInput) -> Result<String> {
        let (dir_path, pattern) = match input {
            ToolInput::String(s) => (".".to_string(), s),
            ToolInput::Structured(ref v) => {
                let dir = v.get("dir_path").and_then(|v| v.as_str()).unwrap_or(".");
                let pat = v.get("pattern").and_then(|v| v.as_str()).ok_or_else(|| {
                    dashflow::core::Error::tool_error("Missing pattern parameter".to_string())
                })?;
                (dir.to_string(), pat.to_string())
            }
        };

        let dir_path_resolved = match self.get_relative_path(&dir_path) {
            Ok(path) => path,
            Err(_) => return Ok(format_invalid_path_error("dir_path", &dir_path)),
        };

        // Wrap blocking I/O in spawn_blocking to avoid blocking async runtime (M-634)
        let dir_path_clone = dir_path.clone();
        let pattern_clone = pattern.clone();
        tokio::task::spawn_blocking(move || {
            let mut matches = Vec::new();

            fn visit_dirs(
                dir: &Path,
                pattern: &str,
                base_dir: &Path,
                matches: &mut Vec<String>,
            ) -> std::io::Result<()> {
                if dir.is_dir() {
                    for entry in fs::read_dir(dir)? {
                        let entry = entry?;
                        let path = entry.path();
                        if path.is_dir() {
                            visit_dirs(&path, pattern, base_dir, matches)?;
                        } else if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                            if FileSearchTool::matches_pattern(filename, pattern) {
                                if let Ok(relative) = path.strip_prefix(base_dir) {
                                    matches.push(relative.display().to_string());
                                }
                            }
                        }
                    }
                }
                Ok(())
            }

            match visit_dirs(
                &dir_path_resolved,
                &pattern_clone,
                &dir_path_resolved,
                &mut matches,
            ) {
                Ok(()) => {
                    if matches.is_empty() {
                        format!(
                            "No files found for pattern {pattern_clone} in directory {dir_path_clone}"
                        )
                    } else {
                        matches.join("\n")
                    }
                }
                Err(e) => format!("Error: {e}"),
            }
        })
        .await
        .map_err(|e| dashflow::core::Error::tool_error(format!("Task join failed: {e}")))
    }
}
