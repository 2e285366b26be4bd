use crate::config::types::{Config, EngineConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for both pool sizes
const MAX_POOL_SIZE: u32 = 256;

/// Lower bound for every timeout (milliseconds)
const MIN_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates engine limits
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    validate_pool_size("max_concurrent_tasks", config.max_concurrent_tasks)?;
    validate_pool_size("max_concurrent_probes", config.max_concurrent_probes)?;

    validate_timeout("fetch_timeout_ms", config.fetch_timeout_ms)?;
    validate_timeout("probe_timeout_ms", config.probe_timeout_ms)?;
    validate_timeout("task_timeout_ms", config.task_timeout_ms)?;

    // A task always contains one fetch
    if config.task_timeout_ms < config.fetch_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "task_timeout_ms ({}) must be >= fetch_timeout_ms ({})",
            config.task_timeout_ms, config.fetch_timeout_ms
        )));
    }

    Ok(())
}

fn validate_pool_size(name: &str, value: u32) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_POOL_SIZE, value
        )));
    }
    Ok(())
}

fn validate_timeout(name: &str, value: u64) -> Result<(), ConfigError> {
    if value < MIN_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "{} must be >= {}ms, got {}ms",
            name, MIN_TIMEOUT_MS, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
