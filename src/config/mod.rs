//! Configuration module for cheap-home
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file, and reading secrets from the environment.
//!
//! # Example
//!
//! ```no_run
//! use cheap_home::config::{load_config, Secrets};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cheap-home.toml")).unwrap();
//! let secrets = Secrets::from_env();
//! println!("Jobs are read from {}", config.jobs.path);
//! ```

mod parser;
mod secrets;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlerConfig, EndpointsConfig, JobsConfig, LlmConfig, StorageConfig,
    UserAgentConfig,
};

pub use secrets::{resolve_database_path, Secrets};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
