//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::AnalysisResult;
use crate::state::CrawlStatus;
use crate::storage::{LinkTotals, TargetRecord};
use crate::FailureReason;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Target not found: {0}")]
    TargetNotFound(i64),

    #[error("Invalid status transition for target {id}: {from} -> {to}")]
    InvalidTransition {
        id: i64,
        from: CrawlStatus,
        to: CrawlStatus,
    },

    #[error("Storage lock poisoned")]
    Lock,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Terminal writes (`record_result`, `record_failure`) only apply to a
/// target that is currently `running` and report whether they applied.
pub trait Storage {
    // ===== Target Management =====

    /// Inserts a new target in the `queued` status
    ///
    /// # Arguments
    ///
    /// * `url` - The validated target URL
    ///
    /// # Returns
    ///
    /// The ID of the newly created target
    fn insert_target(&mut self, url: &str) -> StorageResult<i64>;

    /// Gets a target by ID
    fn get_target(&self, id: i64) -> StorageResult<TargetRecord>;

    /// Gets every target, oldest first
    fn list_targets(&self) -> StorageResult<Vec<TargetRecord>>;

    /// Gets the IDs of every target in a specific status
    fn list_ids_by_status(&self, status: CrawlStatus) -> StorageResult<Vec<i64>>;

    /// Deletes targets
    ///
    /// # Returns
    ///
    /// The number of targets that existed and were removed
    fn delete_targets(&mut self, ids: &[i64]) -> StorageResult<usize>;

    // ===== Status Changes =====

    /// Moves a target to `running`
    ///
    /// A target that is already `running` is left as is.
    fn mark_running(&mut self, id: i64) -> StorageResult<()>;

    /// Stores a completed analysis and moves the target to `done`
    fn record_result(&mut self, id: i64, result: &AnalysisResult) -> StorageResult<bool>;

    /// Stores a failure and moves the target to `error`
    fn record_failure(
        &mut self,
        id: i64,
        reason: FailureReason,
        message: &str,
    ) -> StorageResult<bool>;

    // ===== Statistics =====

    /// Counts targets by status
    fn count_by_status(&self, status: CrawlStatus) -> StorageResult<u64>;

    /// Gets total target count
    fn count_total(&self) -> StorageResult<u64>;

    /// Sums link counts over every `done` target
    fn link_totals(&self) -> StorageResult<LinkTotals>;
}
