// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// DashFlow Project - Documentation Discovery

// Allow clippy warnings for documentation discovery
// - float_cmp: Documentation score comparisons use exact thresholds
// - unwrap_used: Path operations on known valid paths
#![allow(clippy::float_cmp, clippy::unwrap_used)]

//! # Documentation Discovery
//!
//! Types and logic for discovering project documentation files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Types of documentation files recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentationType {
    /// README files (README, README.md, etc.)
    Readme,
    /// Claude-specific instructions (CLAUDE.md)
    Claude,
    /// Agent instructions (AGENTS.md, .agents/)
    Agents,
    /// Contributing guidelines (CONTRIBUTING.md)
    Contributing,
    /// Changelog (CHANGELOG.md, HISTORY.md)
    Changelog,
    /// License file
    License,
    /// Code of conduct
    CodeOfConduct,
    /// Architecture documentation
    Architecture,
    /// API documentation
    Api,
    /// Security policy
    Security,
    /// Other documentation
    Other,
}

impl DocumentationType {
    /// Detect documentation type from filename
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        let stem = Path::new(&lower)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&lower);

        match stem {
            "readme" => Some(DocumentationType::Readme),
            "claude" => Some(DocumentationType::Claude),
            "agents" | "agent" => Some(DocumentationType::Agents),
            "contributing" => Some(DocumentationType::Contributing),
            "changelog" | "history" | "changes" => Some(DocumentationType::Changelog),
            "license" | "licence" | "copying" => Some(DocumentationType::License),
            "code_of_conduct" | "code-of-conduct" => Some(DocumentationType::CodeOfConduct),
            "architecture" | "design" => Some(DocumentationType::Architecture),
            "api" => Some(DocumentationType::Api),
            "security" => Some(DocumentationType::Security),
            _ => None,
        }
    }

    /// Get priority for context inclusion (lower = higher priority)
    pub fn priority(&self) -> u32 {
        match self {
            DocumentationType::Claude => 1, // Highest priority - agent instructions
            DocumentationType::Agents => 2, // Agent-specific docs
            DocumentationType::Readme => 3, // Project overview
            DocumentationType::Architecture => 4, // Technical context
            DocumentationType::Api => 5,
            DocumentationType::Contributing => 6,
            DocumentationType::Changelog => 7,
            DocumentationType::Security => 8,
            DocumentationType::License => 9,
            DocumentationType::CodeOfConduct => 10,
            DocumentationType::Other => 11,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentationType::Readme => "README",
            DocumentationType::Claude => "Claude Instructions",
            DocumentationType::Agents => "Agent Instructions",
            DocumentationType::Contributing => "Contributing Guide",
            DocumentationType::Changelog => "Changelog",
            DocumentationType::License => "License",
            DocumentationType::CodeOfConduct => "Code of Conduct",
            DocumentationType::Architecture => "Architecture",
            DocumentationType::Api => "API Documentation",
            DocumentationType::Security => "Security Policy",
            DocumentationType::Other => "Documentation",
        }
    }
}

/// A discovered documentation file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Documentation {
    /// Type of documentation
    pub doc_type: DocumentationType,
    /// Path to the file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Content (loaded on demand)
    #[serde(skip)]
    content: Option<String>,
}

impl Documentation {
    /// Create new documentation reference
    pub fn new(doc_type: DocumentationType, path: PathBuf, size: u64) -> Self {
        Self {
            doc_type,
            path,
            size,
            content: None,
        }
    }

    /// Load content from file
    pub fn load_content(&mut self) -> std::io::Result<&str> {
        if self.content.is_none() {
            let content = std::fs::read_to_string(&self.path)?;
            self.content = Some(content);
        }
        Ok(self.content.as_ref().unwrap())
    }

    /// Get content if already loaded
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Get priority for context inclusion
    pub fn priority(&self) -> u32 {
        self.doc_type.priority()
    }
}

/// Known documentation file patterns
#[allow(dead_code)] // Architectural: Constant list for future file discovery filtering
pub const DOC_PATTERNS: &[&str] = &[
    "README*",
    "readme*",
    "CLAUDE.md",
    "claude.md",
    ".claude/commands/*.md",
    "AGENTS.md",
    "agents.md",
    ".agents/*.md",
    "CONTRIBUTING*",
    "contributing*",
    "CHANGELOG*",
    "changelog*",
    "HISTORY*",
    "history*",
    "LICENSE*",
    "license*",
    "LICENCE*",
    "licence*",
    "COPYING*",
    "CODE_OF_CONDUCT*",
    "code_of_conduct*",
    "ARCHITECTURE*",
    "architecture*",
    "DESIGN*",
    "design*",
    "API*",
    "api*",
    "SECURITY*",
    "security*",
    "docs/README*",
    "docs/*.md",
    "doc/README*",
    "doc/*.md",
];
