//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{AnalysisResult, DocumentVersion, HeadingCounts};
use crate::state::CrawlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{LinkTotals, TargetRecord};
use crate::{FailureReason, InsightError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const TARGET_COLUMNS: &str = "id, url, status, html_version, page_title,
    h1_count, h2_count, h3_count, h4_count, h5_count, h6_count,
    internal_links, external_links, broken_links, has_login_form,
    failure_reason, error_message, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(InsightError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, InsightError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, InsightError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn current_status(&self, id: i64) -> StorageResult<CrawlStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM targets WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or(StorageError::TargetNotFound(id))?;
        CrawlStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("Unknown status '{}'", status)))
    }
}

/// Maps a `targets` row (selected with [`TARGET_COLUMNS`]) onto a record
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TargetRecord> {
    let status = CrawlStatus::from_db_string(&row.get::<_, String>(2)?).unwrap_or(CrawlStatus::Error);
    let version: Option<String> = row.get(3)?;

    // Result columns are only meaningful once the target is done
    let result = match (status, version.as_deref().and_then(DocumentVersion::from_label)) {
        (CrawlStatus::Done, Some(document_version)) => Some(AnalysisResult {
            document_version,
            title: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            headings: HeadingCounts {
                h1: count_column(row, 5)?,
                h2: count_column(row, 6)?,
                h3: count_column(row, 7)?,
                h4: count_column(row, 8)?,
                h5: count_column(row, 9)?,
                h6: count_column(row, 10)?,
            },
            internal_link_count: count_column(row, 11)?,
            external_link_count: count_column(row, 12)?,
            broken_link_count: count_column(row, 13)?,
            has_login_form: row.get::<_, Option<bool>>(14)?.unwrap_or(false),
        }),
        _ => None,
    };

    let failure_reason = row
        .get::<_, Option<String>>(15)?
        .and_then(|s| match s.as_str() {
            "fetch_error" => Some(FailureReason::FetchError),
            "parse_error" => Some(FailureReason::ParseError),
            "cancelled" => Some(FailureReason::Cancelled),
            _ => None,
        });

    Ok(TargetRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status,
        result,
        failure_reason,
        error_message: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0).max(0) as usize)
}

impl Storage for SqliteStorage {
    // ===== Target Management =====

    fn insert_target(&mut self, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO targets (url, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![url, CrawlStatus::Queued.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_target(&self, id: i64) -> StorageResult<TargetRecord> {
        let query = format!("SELECT {} FROM targets WHERE id = ?1", TARGET_COLUMNS);
        self.conn
            .query_row(&query, params![id], row_to_record)
            .optional()?
            .ok_or(StorageError::TargetNotFound(id))
    }

    fn list_targets(&self) -> StorageResult<Vec<TargetRecord>> {
        let query = format!("SELECT {} FROM targets ORDER BY id", TARGET_COLUMNS);
        let mut stmt = self.conn.prepare(&query)?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn list_ids_by_status(&self, status: CrawlStatus) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM targets WHERE status = ?1 ORDER BY id")?;

        let ids = stmt
            .query_map(params![status.to_db_string()], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn delete_targets(&mut self, ids: &[i64]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM targets WHERE id = ?1")?;
            for id in ids {
                removed += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    // ===== Status Changes =====

    fn mark_running(&mut self, id: i64) -> StorageResult<()> {
        let current = self.current_status(id)?;
        if current == CrawlStatus::Running {
            return Ok(());
        }

        if !current.can_transition_to(CrawlStatus::Running) {
            return Err(StorageError::InvalidTransition {
                id,
                from: current,
                to: CrawlStatus::Running,
            });
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE targets SET status = ?1, failure_reason = NULL, error_message = NULL,
             updated_at = ?2 WHERE id = ?3",
            params![CrawlStatus::Running.to_db_string(), now, id],
        )?;
        Ok(())
    }

    fn record_result(&mut self, id: i64, result: &AnalysisResult) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let headings = &result.headings;

        let updated = self.conn.execute(
            "UPDATE targets SET status = ?1, html_version = ?2, page_title = ?3,
             h1_count = ?4, h2_count = ?5, h3_count = ?6, h4_count = ?7, h5_count = ?8,
             h6_count = ?9, internal_links = ?10, external_links = ?11, broken_links = ?12,
             has_login_form = ?13, failure_reason = NULL, error_message = NULL, updated_at = ?14
             WHERE id = ?15 AND status = ?16",
            params![
                CrawlStatus::Done.to_db_string(),
                result.document_version.as_str(),
                result.title,
                headings.h1 as i64,
                headings.h2 as i64,
                headings.h3 as i64,
                headings.h4 as i64,
                headings.h5 as i64,
                headings.h6 as i64,
                result.internal_link_count as i64,
                result.external_link_count as i64,
                result.broken_link_count as i64,
                result.has_login_form,
                now,
                id,
                CrawlStatus::Running.to_db_string(),
            ],
        )?;

        Ok(updated == 1)
    }

    fn record_failure(
        &mut self,
        id: i64,
        reason: FailureReason,
        message: &str,
    ) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE targets SET status = ?1, failure_reason = ?2, error_message = ?3,
             updated_at = ?4 WHERE id = ?5 AND status = ?6",
            params![
                CrawlStatus::Error.to_db_string(),
                reason.as_str(),
                message,
                now,
                id,
                CrawlStatus::Running.to_db_string(),
            ],
        )?;

        Ok(updated == 1)
    }

    // ===== Statistics =====

    fn count_by_status(&self, status: CrawlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM targets WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM targets", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn link_totals(&self) -> StorageResult<LinkTotals> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(internal_links), 0), COALESCE(SUM(external_links), 0),
             COALESCE(SUM(broken_links), 0), COALESCE(SUM(has_login_form), 0)
             FROM targets WHERE status = ?1",
            params![CrawlStatus::Done.to_db_string()],
            |row| {
                Ok(LinkTotals {
                    internal: row.get::<_, i64>(0)? as u64,
                    external: row.get::<_, i64>(1)? as u64,
                    broken: row.get::<_, i64>(2)? as u64,
                    login_forms: row.get::<_, i64>(3)? as u64,
                })
            },
        )?;
        Ok(totals)
    }
}
