//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Page-Insight database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per submitted target; result columns stay NULL until done
CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    html_version TEXT,
    page_title TEXT,
    h1_count INTEGER,
    h2_count INTEGER,
    h3_count INTEGER,
    h4_count INTEGER,
    h5_count INTEGER,
    h6_count INTEGER,
    internal_links INTEGER,
    external_links INTEGER,
    broken_links INTEGER,
    has_login_form INTEGER,
    failure_reason TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_targets_status ON targets(status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
