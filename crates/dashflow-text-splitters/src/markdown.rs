// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Markdown-specific text splitters.
//!
//! This module provides splitters optimized for Markdown documents:
//! - [`MarkdownTextSplitter`]: Split on Markdown boundaries (headers, code blocks, etc.)
//! - [`MarkdownHeaderTextSplitter`]: Split with header metadata extraction

use crate::character::RecursiveCharacterTextSplitter;
use crate::traits::TextSplitter;

/// Markdown-specific text splitter
///
/// A specialized version of [`RecursiveCharacterTextSplitter`] configured with
/// separators optimized for Markdown documents.
#[derive(Debug, Clone)]
pub struct MarkdownTextSplitter {
    inner: RecursiveCharacterTextSplitter,
}

impl MarkdownTextSplitter {
    /// Create a new `MarkdownTextSplitter` with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RecursiveCharacterTextSplitter::new()
                .with_separators(Self::get_separators())
                .with_separator_regex(true),
        }
    }

    fn get_separators() -> Vec<String> {
        vec![
            r"\n#{1,6} ".to_string(),
            "```\n".to_string(),
            r"\n\*\*\*+\n".to_string(),
            r"\n---+\n".to_string(),
            r"\n___+\n".to_string(),
            "\n\n".to_string(),
            "\n".to_string(),
            " ".to_string(),
            String::new(),
        ]
    }

    /// Set custom chunk size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.inner = self.inner.with_chunk_size(chunk_size);
        self
    }

    /// Set custom chunk overlap
    #[must_use]
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.inner = self.inner.with_chunk_overlap(chunk_overlap);
        self
    }
}

impl Default for MarkdownTextSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSplitter for MarkdownTextSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.inner.split_text(text)
    }

    fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }

    fn chunk_overlap(&self) -> usize {
        self.inner.chunk_overlap()
    }

    fn add_start_index(&self) -> bool {
        self.inner.add_start_index()
    }
}

/// Markdown header text splitter with metadata extraction
#[derive(Debug, Clone)]
pub struct MarkdownHeaderTextSplitter {
    headers_to_split_on: Vec<(String, String)>,
    return_each_line: bool,
    strip_headers: bool,
}

#[derive(Debug, Clone)]
struct LineWithMetadata {
    content: String,
    metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct HeaderInfo {
    level: usize,
    name: String,
    _data: String,
}

impl MarkdownHeaderTextSplitter {
    /// Create a new `MarkdownHeaderTextSplitter`
    #[must_use]
    pub fn new(headers_to_split_on: Vec<(String, String)>) -> Self {
        let mut sorted_headers = headers_to_split_on;
        sorted_headers.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            headers_to_split_on: sorted_headers,
            return_each_line: false,
            strip_headers: true,
        }
    }

    /// Set whether to return each line individually with metadata
    #[must_use]
    pub fn with_return_each_line(mut self, return_each_line: bool) -> Self {
        self.return_each_line = return_each_line;
        self
    }

    /// Set whether to strip header lines from chunk content
    #[must_use]
    pub fn with_strip_headers(mut self, strip_headers: bool) -> Self {
        self.strip_headers = strip_headers;
        self
    }

    /// Split markdown text into documents with header metadata
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<crate::Document> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut lines_with_metadata: Vec<LineWithMetadata> = Vec::new();
        let mut current_content: Vec<String> = Vec::new();
        let mut current_metadata: std::collections::HashMap<String, String> =
            std::collections::HashMap::new();
        let mut header_stack: Vec<HeaderInfo> = Vec::new();
        let mut initial_metadata: std::collections::HashMap<String, String> =
            std::collections::HashMap::new();

        let mut in_code_block = false;
        let mut opening_fence = "";

        for line in lines {
            let stripped_line = line.trim();
            let stripped_line: String = stripped_line
                .chars()
                .filter(|c| !c.is_control() || *c == '\t')
                .collect();

            if !in_code_block {
                if stripped_line.starts_with("```") && stripped_line.matches("```").count() == 1 {
                    in_code_block = true;
                    opening_fence = "```";
                } else if stripped_line.starts_with("~~~") {
                    in_code_block = true;
                    opening_fence = "~~~";
                }
            } else if stripped_line.starts_with(opening_fence) {
                in_code_block = false;
                opening_fence = "";
            }

            if in_code_block {
                current_content.push(stripped_line.clone());
                continue;
            }

            let mut matched_header = false;
            for (sep, name) in &self.headers_to_split_on {
                let is_standard_header = stripped_line.starts_with(sep)
                    && (stripped_line.len() == sep.len()
                        || stripped_line.chars().nth(sep.len()) == Some(' '));

                if is_standard_header {
                    let current_header_level = sep.chars().filter(|c| *c == '#').count();

                    while let Some(top) = header_stack.last() {
                        if top.level >= current_header_level {
                            // SAFETY: We just verified last() is Some, so pop() must succeed
                            if let Some(popped) = header_stack.pop() {
                                initial_metadata.remove(&popped.name);
                            }
                        } else {
                            break;
                        }
                    }

                    let header_text = stripped_line[sep.len()..].trim().to_string();
                    let header = HeaderInfo {
                        level: current_header_level,
                        name: name.clone(),
                        _data: header_text.clone(),
                    };
                    header_stack.push(header);
                    initial_metadata.insert(name.clone(), header_text);

                    if !current_content.is_empty() {
                        lines_with_metadata.push(LineWithMetadata {
                            content: current_content.join("\n"),
                            metadata: current_metadata.clone(),
                        });
                        current_content.clear();
                    }

                    if !self.strip_headers {
                        current_content.push(stripped_line.clone());
                    }

                    matched_header = true;
                    break;
                }
            }

            if !matched_header {
                if !stripped_line.is_empty() {
                    current_content.push(stripped_line.clone());
                } else if !current_content.is_empty() {
                    lines_with_metadata.push(LineWithMetadata {
                        content: current_content.join("\n"),
                        metadata: current_metadata.clone(),
                    });
                    current_content.clear();
                }
            }

            current_metadata = initial_metadata.clone();
        }

        if !current_content.is_empty() {
            lines_with_metadata.push(LineWithMetadata {
                content: current_content.join("\n"),
                metadata: current_metadata,
            });
        }

        if self.return_each_line {
            self.lines_to_documents(lines_with_metadata)
        } else {
            self.aggregate_lines_to_chunks(lines_with_metadata)
        }
    }

    fn lines_to_documents(&self, lines: Vec<LineWithMetadata>) -> Vec<crate::Document> {
        lines
            .into_iter()
            .map(|line| {
                let mut doc = crate::Document::new(line.content);
                doc.metadata = line
                    .metadata
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                doc
            })
            .collect()
    }

    fn aggregate_lines_to_chunks(&self, lines: Vec<LineWithMetadata>) -> Vec<crate::Document> {
        let mut aggregated: Vec<LineWithMetadata> = Vec::new();

        for line in lines {
            if let Some(last) = aggregated.last_mut() {
                if last.metadata == line.metadata {
                    last.content.push_str("  \n");
                    last.content.push_str(&line.content);
                } else if last.metadata.len() < line.metadata.len()
                    && last
                        .content
                        .lines()
                        .last()
                        .is_some_and(|l| l.starts_with('#'))
                    && !self.strip_headers
                {
                    last.content.push_str("  \n");
                    last.content.push_str(&line.content);
                    last.metadata = line.metadata;
                } else {
                    aggregated.push(line);
                }
            } else {
                aggregated.push(line);
            }
        }

        aggregated
            .into_iter()
            .map(|chunk| {
                let mut doc = crate::Document::new(chunk.content);
                doc.metadata = chunk
                    .metadata
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                doc
            })
            .collect()
    }
}
