//! Storage module for persisting listings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent listing upsert keyed by URL
//! - The read API (filtering, sorting, pagination, metadata)
//! - The run ledger recording every orchestrator invocation

mod query;
mod schema;
mod sqlite;
mod traits;

pub use query::{ListingMeta, ListingPage, ListingQuery, NumericRange, SortOrder};
pub use sqlite::SqliteStorage;
pub use traits::{ListingStore, StorageError, StorageResult};

use crate::model::ListingRecord;
use chrono::{DateTime, Utc};

/// A listing as stored, with its bookkeeping columns
#[derive(Debug, Clone, PartialEq)]
pub struct StoredListing {
    pub id: i64,
    pub record: ListingRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Outcome of one bulk upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Rows created
    pub inserted: usize,
    /// Existing rows whose values changed
    pub modified: usize,
    /// Existing rows re-upserted with identical values
    pub unchanged: usize,
    /// Records whose statement failed
    pub failed: usize,
}

impl UpsertSummary {
    /// Rows written: inserts plus modifications
    pub fn upserted(&self) -> usize {
        self.inserted + self.modified
    }
}

/// Represents one orchestrator invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub mode: RunMode,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Totals recorded when a run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub discovered: usize,
    pub crawled: usize,
    pub upserted: usize,
    pub warnings: usize,
}

/// Which orchestrator entry point started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single,
    Discovery,
    Batch,
}

impl RunMode {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Discovery => "discovery",
            Self::Batch => "batch",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "discovery" => Some(Self::Discovery),
            "batch" => Some(Self::Batch),
            _ => None,
        }
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
