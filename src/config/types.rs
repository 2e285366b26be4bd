use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Insight
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Analysis engine limits
///
/// Every network call the engine makes is bounded by one of these timeouts,
/// and every fan-out is bounded by one of these pool sizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of analysis tasks running at once across a batch
    #[serde(rename = "max-concurrent-tasks")]
    pub max_concurrent_tasks: u32,

    /// Maximum number of liveness probes in flight for a single page
    #[serde(rename = "max-concurrent-probes")]
    pub max_concurrent_probes: u32,

    /// Timeout for the page fetch (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,

    /// Timeout for each liveness probe (milliseconds)
    #[serde(rename = "probe-timeout-ms")]
    pub probe_timeout_ms: u64,

    /// Deadline for fetching and parsing one target (milliseconds)
    ///
    /// Link probing is not covered; each probe has `probe-timeout-ms`.
    #[serde(rename = "task-timeout-ms")]
    pub task_timeout_ms: u64,
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 8,
            max_concurrent_probes: 16,
            fetch_timeout_ms: 15_000,
            probe_timeout_ms: 5_000,
            task_timeout_ms: 60_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file holding target records
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}
