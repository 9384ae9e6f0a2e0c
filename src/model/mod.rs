//! Core data types shared by adapters, enrichment and storage

mod listing;
mod params;
mod source;

pub use listing::{CrawlOutcome, DiscoveryOutcome, DiscoveryTarget, GeoPoint, ListingRecord};
pub use params::{JobParams, SearchParams};
pub use source::{Origin, Source};
