//! Storage module for persisting target records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Target record persistence and status changes
//! - The registry adapter that lets a store back a batch

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::{terminal_status, AnalysisResult, CrawlOutcome, TargetRegistry};
use crate::state::CrawlStatus;
use crate::{FailureReason, InsightError, ResolutionError};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(InsightError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, InsightError> {
    SqliteStorage::new(path)
}

/// Represents a target in the database
#[derive(Debug, Clone)]
pub struct TargetRecord {
    pub id: i64,
    pub url: String,
    pub status: CrawlStatus,
    /// Present only when `status` is `done`
    pub result: Option<AnalysisResult>,
    pub failure_reason: Option<FailureReason>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Link counts summed over every analyzed target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTotals {
    pub internal: u64,
    pub external: u64,
    pub broken: u64,
    pub login_forms: u64,
}

/// Adapter that backs a batch with a [`Storage`]
///
/// A target is only dispatched once the store has recorded it as `running`.
/// Terminal outcomes go through the store's compare-and-set writes, so an
/// outcome arriving for a target that is no longer `running` is dropped.
pub struct StoreRegistry<S> {
    storage: Arc<Mutex<S>>,
}

impl<S> Clone for StoreRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage + Send + 'static> StoreRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Locks the underlying store for direct access
    pub fn lock(&self) -> StorageResult<MutexGuard<'_, S>> {
        self.storage.lock().map_err(|_| StorageError::Lock)
    }

    fn apply_outcome(&self, id: i64, outcome: &CrawlOutcome) -> StorageResult<bool> {
        let mut storage = self.lock()?;
        match outcome {
            Ok(result) => storage.record_result(id, result),
            Err(e) => storage.record_failure(id, e.reason(), &e.to_string()),
        }
    }
}

impl<S: Storage + Send + 'static> TargetRegistry for StoreRegistry<S> {
    type Id = i64;

    fn resolve(&self, id: &i64) -> Result<String, ResolutionError> {
        let storage = self.lock().map_err(|e| ResolutionError::new(id, e.to_string()))?;
        match storage.get_target(*id) {
            Ok(record) => Ok(record.url),
            Err(StorageError::TargetNotFound(_)) => Err(ResolutionError::new(id, "no such target")),
            Err(e) => Err(ResolutionError::new(id, e.to_string())),
        }
    }

    fn status_changed(&self, id: &i64, status: CrawlStatus) -> Result<(), ResolutionError> {
        if status != CrawlStatus::Running {
            return Ok(());
        }

        self.lock()
            .and_then(|mut storage| storage.mark_running(*id))
            .map_err(|e| ResolutionError::new(id, format!("cannot mark running: {}", e)))
    }

    fn completed(&self, id: &i64, outcome: CrawlOutcome) {
        match self.apply_outcome(*id, &outcome) {
            Ok(true) => {
                tracing::debug!("Target {} stored as {}", id, terminal_status(&outcome));
            }
            Ok(false) => {
                tracing::warn!("Dropped stale outcome for target {} (not running)", id);
            }
            Err(e) => {
                tracing::error!("Failed to store outcome for target {}: {}", id, e);
            }
        }
    }
}
