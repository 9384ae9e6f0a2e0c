//! Output module for terminal reports
//!
//! This module handles:
//! - Rendering listing pages and filter metadata from the read API
//! - Rendering crawl and batch reports
//! - Loading and printing store and run-ledger statistics

mod listings;
pub mod stats;

pub use listings::{format_price, print_batch, print_listings, print_meta, print_report};
pub use stats::{load_statistics, print_statistics, StoreStatistics};
