//! Output module for generating analysis summaries and reports
//!
//! This module handles:
//! - Statistics over stored targets
//! - Plain-text listings of target records
//! - Generating markdown summaries of analysis results

mod listing;
mod markdown;
pub mod stats;

pub use listing::{format_record, print_targets};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, InsightStatistics};

use crate::state::CrawlStatus;
use crate::storage::{Storage, TargetRecord};
use crate::{FailureReason, InsightError};
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the markdown report is rendered from
#[derive(Debug, Clone, Default)]
pub struct InsightSummary {
    pub generated_at: String,
    pub config_hash: String,

    pub total_targets: u64,
    pub targets_queued: u64,
    pub targets_running: u64,
    pub targets_done: u64,
    pub targets_error: u64,

    pub total_internal_links: u64,
    pub total_external_links: u64,
    pub total_broken_links: u64,
    pub login_form_pages: u64,

    /// Failure reason -> count
    pub failures_by_reason: HashMap<FailureReason, u64>,

    /// Every stored record, oldest first
    pub records: Vec<TargetRecord>,
}

impl InsightSummary {
    /// Returns the success rate over finished targets as a percentage
    pub fn success_rate(&self) -> f64 {
        let finished = self.targets_done + self.targets_error;
        if finished == 0 {
            return 0.0;
        }
        (self.targets_done as f64 / finished as f64) * 100.0
    }
}

/// Generates a summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing target records
/// * `config_hash` - Hash of the configuration the report is produced under
///
/// # Returns
///
/// * `Ok(InsightSummary)` - Successfully generated summary
/// * `Err(InsightError)` - Failed to generate summary
pub fn generate_summary(
    storage: &dyn Storage,
    config_hash: &str,
) -> Result<InsightSummary, InsightError> {
    let stats = load_statistics(storage)?;
    let records = storage.list_targets()?;

    let mut failures_by_reason = HashMap::new();
    for reason in records.iter().filter_map(|r| r.failure_reason) {
        *failures_by_reason.entry(reason).or_insert(0) += 1;
    }

    Ok(InsightSummary {
        generated_at: Utc::now().to_rfc3339(),
        config_hash: config_hash.to_string(),
        total_targets: stats.total_targets,
        targets_queued: stats.count(CrawlStatus::Queued),
        targets_running: stats.count(CrawlStatus::Running),
        targets_done: stats.count(CrawlStatus::Done),
        targets_error: stats.count(CrawlStatus::Error),
        total_internal_links: stats.links.internal,
        total_external_links: stats.links.external,
        total_broken_links: stats.links.broken,
        login_form_pages: stats.links.login_forms,
        failures_by_reason,
        records,
    })
}
