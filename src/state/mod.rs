//! State module for tracking target lifecycle
//!
//! Every stored target moves through `queued → running → {done, error}`.
//! The engine drives the `running → {done, error}` edge by reporting an
//! outcome; the store owns the persisted value.

mod crawl_status;

pub use crawl_status::CrawlStatus;
