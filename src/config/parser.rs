use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// Engine settings missing from the `[engine]` table fall back to
/// [`EngineConfig::default`](crate::config::EngineConfig).
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of configuration text
///
/// Stamped into exported reports so a report can be traced back to the
/// settings the engine ran with.
pub fn hash_config(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Reads, parses and validates the configuration file at `path`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_insight::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Fetch timeout: {:?}", config.engine.fetch_timeout());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hashes the configuration file at `path` without parsing it
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_config(&std::fs::read_to_string(path)?))
}

/// Loads the configuration file together with the hash of its content
///
/// The file is read once, so the hash always matches the settings returned.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_config(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[engine]
max-concurrent-tasks = 4
max-concurrent-probes = 10
fetch-timeout-ms = 2000
probe-timeout-ms = 1000
task-timeout-ms = 30000

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.engine.max_concurrent_tasks, 4);
        assert_eq!(config.engine.max_concurrent_probes, 10);
        assert_eq!(config.engine.fetch_timeout_ms, 2000);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.output.database_path, "./test.db");
    }

    #[test]
    fn test_engine_section_defaults() {
        let config_content = r#"
[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.engine.max_concurrent_tasks, 8);
        assert_eq!(config.engine.max_concurrent_probes, 16);
        assert_eq!(config.engine.task_timeout_ms, 60_000);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = VALID_CONFIG.replace("max-concurrent-tasks = 4", "max-concurrent-tasks = 0");

        let file = create_temp_config(&config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.engine.max_concurrent_tasks, 4);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_compute_config_hash() {
        let config_content = "test content";
        let file = create_temp_config(config_content);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_parse_config_from_text() {
        let config = parse_config(VALID_CONFIG).unwrap();
        assert_eq!(config.engine.task_timeout_ms, 30000);
        assert_eq!(config.output.summary_path, "./summary.md");
    }

    #[test]
    fn test_hash_config_matches_file_hash() {
        let file = create_temp_config(VALID_CONFIG);
        assert_eq!(hash_config(VALID_CONFIG), compute_config_hash(file.path()).unwrap());
        assert_eq!(
            hash_config(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
