//! Crawler module for page fetching and analysis
//!
//! This module contains the core engine logic, including:
//! - HTTP fetching and link liveness probes
//! - HTML analysis (version, title, headings, links, login forms)
//! - Task slot pooling
//! - Batch orchestration

mod analyzer;
mod coordinator;
mod fetcher;
mod scheduler;

pub use analyzer::{
    analyze_body, count_broken_links, detect_document_version, parse_page, probe_page,
    AnalysisResult, DocumentVersion, HeadingCounts, PageLink, ParsedPage,
};
pub use coordinator::{
    terminal_status, BatchDispatch, BatchHandle, BatchReport, CrawlOutcome, Engine,
    TargetRegistry,
};
pub use fetcher::{build_http_client, fetch_page, probe_link, LinkHealth};
pub use scheduler::{TaskSlot, TaskSlots};
