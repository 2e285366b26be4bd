//! Page-Insight: a concurrent page analysis engine
//!
//! This crate fetches web pages and extracts structural metadata from them:
//! document version, title, heading distribution, internal/external/broken
//! link counts and login form presence. Batches of targets are analyzed
//! concurrently with bounded resource usage.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Insight operations
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Why a single target failed
///
/// This is the reason recorded alongside the `error` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    FetchError,
    ParseError,
    Cancelled,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchError => "fetch_error",
            Self::ParseError => "parse_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that terminate the analysis of one target
///
/// None of these ever carries a partial result: a target either produces a
/// complete [`crawler::AnalysisResult`] or one of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid target {url}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: UrlError,
    },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Analysis of {url} was cancelled")]
    Cancelled { url: String },

    #[error("Analysis task for {url} failed: {message}")]
    TaskFailed { url: String, message: String },
}

impl AnalysisError {
    /// Maps the error onto the failure reason reported to callers
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::HtmlParse { .. } => FailureReason::ParseError,
            Self::Cancelled { .. } => FailureReason::Cancelled,
            Self::InvalidTarget { .. }
            | Self::Http { .. }
            | Self::HttpStatus { .. }
            | Self::Timeout { .. }
            | Self::TaskFailed { .. } => FailureReason::FetchError,
        }
    }

    /// The target URL this error belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidTarget { url, .. }
            | Self::Http { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Timeout { url }
            | Self::HtmlParse { url, .. }
            | Self::Cancelled { url }
            | Self::TaskFailed { url, .. } => url,
        }
    }
}

/// Errors raised by the batch entry point before any dispatch happens
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch must contain at least one identifier")]
    EmptyBatch,
}

/// An identifier could not be mapped to a target URL
#[derive(Debug, Error)]
#[error("Cannot resolve target {id}: {message}")]
pub struct ResolutionError {
    pub id: String,
    pub message: String,
}

impl ResolutionError {
    pub fn new(id: impl ToString, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for Page-Insight operations
pub type Result<T> = std::result::Result<T, InsightError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{AnalysisResult, CrawlOutcome, DocumentVersion, Engine, HeadingCounts};
pub use state::CrawlStatus;
pub use url::{classify_link, extract_host, validate_target, LinkScope};
