//! Statistics generation from the listing store
//!
//! This module provides functionality for extracting and displaying
//! store and run-ledger statistics.

use crate::model::Origin;
use crate::storage::{ListingStore, RunRecord, StorageResult};
use chrono::{DateTime, Utc};

/// Number of ledger entries shown by `print_statistics`
pub const RECENT_RUNS: usize = 5;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored listings
    pub total_listings: u64,

    /// Count of listings by origin
    pub by_origin: Vec<(Origin, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn ListingStore) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_listings: storage.count_listings()?,
        by_origin: storage.count_by_origin()?,
        recent_runs: storage.recent_runs(RECENT_RUNS)?,
    })
}

/// Seconds between a run's start and finish, when both parse
pub fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
    let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
    Some((finished - started).num_seconds())
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Listing Statistics ===\n");

    println!("Overview:");
    println!("  Total listings: {}", stats.total_listings);
    println!();

    println!("Listings by Source:");
    let mut origin_counts: Vec<_> = stats.by_origin.iter().collect();
    origin_counts.sort_by(|a, b| b.1.cmp(&a.1));

    for (origin, count) in origin_counts {
        let percentage = if stats.total_listings > 0 {
            (*count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", origin, count, percentage);
    }
    println!();

    if stats.recent_runs.is_empty() {
        println!("No crawl runs recorded");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        let duration = run_duration_seconds(run)
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{} {} [{}] {} discovered={} crawled={} upserted={} warnings={} ({})",
            run.id,
            run.started_at,
            run.mode.to_db_string(),
            run.status.to_db_string(),
            run.counts.discovered,
            run.counts.crawled,
            run.counts.upserted,
            run.counts.warnings,
            duration
        );
    }
}
