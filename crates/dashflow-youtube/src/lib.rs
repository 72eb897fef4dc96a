//! # YouTube Integration for DashFlow
//!
//! This crate provides YouTube integration for `DashFlow` Rust, including:
//! - Video transcript loading for document processing
//! - Video search tool for agents
//!
//! ## Features
//!
//! ### Transcript Loading
//!
//! Load YouTube video transcripts as documents for RAG applications:
//!
//! ```rust,no_run
//! use dashflow_youtube::YouTubeTranscriptLoader;
//! use dashflow::core::documents::DocumentLoader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = YouTubeTranscriptLoader::new();
//!
//! // Load transcript from video URL or ID
//! let docs = loader.load_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!
//! for doc in docs {
//!     println!("Transcript: {}", doc.page_content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Video Search
//!
//! Search YouTube videos using the Data API (requires API key):
//!
//! ```rust,no_run
//! use dashflow_youtube::YouTubeSearchTool;
//! use dashflow::core::tools::Tool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Set YOUTUBE_API_KEY environment variable
//! std::env::set_var("YOUTUBE_API_KEY", "your-api-key");
//!
//! let youtube = YouTubeSearchTool::new()?;
//!
//! let results = youtube._call_str("rust programming tutorials".to_string()).await?;
//! println!("{}", results);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variables
//!
//! - `YOUTUBE_API_KEY`: Required for video search (get from Google Cloud Console)
//!
//! ## Python Baseline
//!
//! This crate implements functionality from:
//! - `dashflow_community.document_loaders.youtube` - Transcript loading
//! - `dashflow_community.tools.youtube.search` - Video search

mod search;
mod transcript;

pub use search::{
    SearchOrder, VideoDefinition, VideoDuration, VideoType, YouTubeRetriever,
    YouTubeRetrieverBuilder, YouTubeSearchTool, YouTubeVideo,
};
pub use transcript::{Language, TranscriptChunk, YouTubeTranscriptLoader};

/// Extract video ID from various YouTube URL formats
///
/// Supports:
/// - `https://www.youtube.com/watch?v=VIDEO_ID`
/// - `https://youtu.be/VIDEO_ID`
/// - `https://www.youtube.com/embed/VIDEO_ID`
/// - `https://www.youtube.com/v/VIDEO_ID`
/// - Plain video ID
///
/// # Example
///
/// ```rust
/// use dashflow_youtube::extract_video_id;
///
/// assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
/// assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
/// assert_eq!(extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
/// ```
pub fn extract_video_id(url_or_id: &str) -> Option<String> {
    use regex::Regex;

    // Check if it's already just a video ID (11 characters, alphanumeric with - and _)
    let id_regex = Regex::new(r"^[a-zA-Z0-9_-]{11}$").ok()?;
    if id_regex.is_match(url_or_id) {
        return Some(url_or_id.to_string());
    }

    // Try various URL patterns
    let patterns = [
        // Standard watch URL: youtube.com/watch?v=VIDEO_ID
        r"(?:youtube\.com/watch\?v=|youtube\.com/watch\?.+&v=)([a-zA-Z0-9_-]{11})",
        // Short URL: youtu.be/VIDEO_ID
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        // Embed URL: youtube.com/embed/VIDEO_ID
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        // Old embed URL: youtube.com/v/VIDEO_ID
        r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
        // Shorts URL: youtube.com/shorts/VIDEO_ID
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    ];

    for pattern in patterns {
        if let Ok(regex) = Regex::new(pattern) {
            if let Some(captures) = regex.captures(url_or_id) {
                if let Some(id) = captures.get(1) {
                    return Some(id.as_str().to_string());
                }
            }
        }
    }

    None
}
