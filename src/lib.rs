//! cheap-home: a rental listing crawler for Đà Nẵng
//!
//! This crate crawls rental listings from several heterogeneous sources
//! (static listing sites, a JS-rendered marketplace, a social-media group and
//! a search API used for discovery), normalizes them into one schema, enriches
//! them with geocoding and language-model metadata, and upserts them into a
//! SQLite store keyed by listing URL.

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod enrichment;
pub mod model;
pub mod output;
pub mod sources;
pub mod storage;
pub mod text;

use thiserror::Error;

/// Main error type for cheap-home operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Failed to read job file {path}: {message}")]
    JobFile { path: String, message: String },
}

/// Result type alias for cheap-home operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Secrets};
pub use crawler::{CrawlReport, Orchestrator};
pub use model::{DiscoveryTarget, GeoPoint, ListingRecord, Origin, Source};
pub use storage::{ListingStore, SqliteStorage};
