//! Configuration module for Page-Insight
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_insight::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Engine will run {} tasks at once", config.engine.max_concurrent_tasks);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, EngineConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_config, load_config, load_config_with_hash, parse_config};
