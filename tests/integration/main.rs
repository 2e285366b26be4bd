//! Integration tests for Page-Insight
//!
//! These tests use wiremock to create mock HTTP servers and tempfile
//! databases to exercise analysis and batches end-to-end.

mod analyze_tests;
mod batch_tests;

use page_insight::config::{EngineConfig, UserAgentConfig};
use page_insight::Engine;

pub fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

/// Creates an engine with short timeouts suitable for mock servers
pub fn test_engine(max_concurrent_tasks: u32) -> Engine {
    let config = EngineConfig {
        max_concurrent_tasks,
        max_concurrent_probes: 4,
        fetch_timeout_ms: 2_000,
        probe_timeout_ms: 1_000,
        task_timeout_ms: 5_000,
    };
    Engine::new(config, &test_user_agent()).expect("Failed to build engine")
}
