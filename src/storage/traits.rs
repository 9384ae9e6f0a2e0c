//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{ListingRecord, Origin};
use crate::storage::{
    ListingMeta, ListingPage, ListingQuery, RunCounts, RunMode, RunRecord, RunStatus,
    StoredListing, UpsertSummary,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for listing store implementations
///
/// The store keeps exactly one row per listing URL. It is owned by a single
/// orchestrator; writers take `&mut self`.
pub trait ListingStore {
    // ===== Listings =====

    /// Inserts or updates every record, keyed by URL
    ///
    /// Each record is written by its own statement inside one transaction. A
    /// failing record is logged and counted in `failed`; the rest proceed.
    /// `None` fields on an incoming record keep the stored value. An empty
    /// slice performs no I/O.
    fn upsert_many(&mut self, records: &[ListingRecord]) -> StorageResult<UpsertSummary>;

    /// Gets a listing by URL
    fn get_by_url(&self, url: &str) -> StorageResult<Option<StoredListing>>;

    /// Gets total listing count
    fn count_listings(&self) -> StorageResult<u64>;

    /// Counts listings per origin, sorted by origin name
    fn count_by_origin(&self) -> StorageResult<Vec<(Origin, u64)>>;

    // ===== Read API =====

    /// Lists listings matching a query
    fn query_listings(&self, query: &ListingQuery) -> StorageResult<ListingPage>;

    /// Summarizes stored listings for filter UIs
    fn listing_meta(&self) -> StorageResult<ListingMeta>;

    // ===== Run Ledger =====

    /// Creates a new run
    ///
    /// # Arguments
    ///
    /// * `mode` - Entry point that started the run
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, mode: RunMode, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and totals
    fn finish_run(&mut self, run_id: i64, status: RunStatus, counts: &RunCounts)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Gets up to `limit` runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
