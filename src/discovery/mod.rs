//! Discovery through a search API
//!
//! A free-text query becomes an ordered list of [`DiscoveryTarget`]s, one per
//! search result that a known adapter can crawl.
//!
//! [`DiscoveryTarget`]: crate::model::DiscoveryTarget

mod classify;
mod serpapi;

pub use classify::classify_link;
pub use serpapi::{discover, search_query};
