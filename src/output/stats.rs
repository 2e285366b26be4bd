//! Statistics generation from the target database
//!
//! This module provides functionality for extracting and displaying
//! analysis statistics from the storage layer.

use crate::state::CrawlStatus;
use crate::storage::{LinkTotals, Storage};
use crate::InsightError;
use std::collections::HashMap;

/// Analysis statistics summary
#[derive(Debug, Clone)]
pub struct InsightStatistics {
    /// Total number of stored targets
    pub total_targets: u64,

    /// Count of targets by status
    pub targets_by_status: HashMap<CrawlStatus, u64>,

    /// Link counts summed over analyzed targets
    pub links: LinkTotals,
}

impl InsightStatistics {
    pub fn count(&self, status: CrawlStatus) -> u64 {
        self.targets_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of finished targets that ended `done`, as a percentage
    pub fn success_rate(&self) -> f64 {
        let done = self.count(CrawlStatus::Done);
        let finished = done + self.count(CrawlStatus::Error);
        if finished == 0 {
            return 0.0;
        }
        (done as f64 / finished as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(InsightStatistics)` - Successfully loaded statistics
/// * `Err(InsightError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<InsightStatistics, InsightError> {
    let total_targets = storage.count_total()?;

    let mut targets_by_status = HashMap::new();
    for status in CrawlStatus::all_statuses() {
        let count = storage.count_by_status(status)?;
        if count > 0 {
            targets_by_status.insert(status, count);
        }
    }

    let links = storage.link_totals()?;

    Ok(InsightStatistics {
        total_targets,
        targets_by_status,
        links,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &InsightStatistics) {
    println!("=== Analysis Statistics ===\n");

    println!("Overview:");
    println!("  Total targets: {}", stats.total_targets);
    println!();

    println!("Targets by Status:");
    for status in CrawlStatus::all_statuses() {
        let count = stats.count(status);
        let percentage = if stats.total_targets > 0 {
            (count as f64 / stats.total_targets as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!("Links (analyzed targets):");
    println!("  Internal: {}", stats.links.internal);
    println!("  External: {}", stats.links.external);
    println!("  Broken: {}", stats.links.broken);
    println!("  Pages with login form: {}", stats.links.login_forms);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} finished targets done)",
        stats.success_rate(),
        stats.count(CrawlStatus::Done),
        stats.count(CrawlStatus::Done) + stats.count(CrawlStatus::Error)
    );
}
