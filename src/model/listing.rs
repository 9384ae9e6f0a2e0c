use crate::model::{Origin, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Geographic point, longitude first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

/// A normalized rental listing
///
/// `url` is the identity key: the store keeps exactly one row per URL.
/// Fields set to `None` are treated as "not observed" on upsert and keep
/// whatever value is already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub url: String,
    pub title: String,
    /// Monthly price in whole VND
    pub price: i64,
    pub address: Option<String>,
    pub district: Option<String>,
    /// Floor area in square meters
    pub area: Option<f64>,
    pub images: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub source: Origin,

    // Enrichment
    pub location: Option<GeoPoint>,
    pub amenities: Option<Vec<String>>,
    pub room_type: Option<String>,
    pub is_owner: Option<bool>,
    pub spam_score: Option<f64>,
    pub raw_description: Option<String>,
    pub source_id: Option<String>,
    pub crawled_at: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// Creates a record with the required fields; everything else is empty
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        price: i64,
        source: Origin,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            price,
            address: None,
            district: None,
            area: None,
            images: Vec::new(),
            posted_at,
            source,
            location: None,
            amenities: None,
            room_type: None,
            is_owner: None,
            spam_score: None,
            raw_description: None,
            source_id: None,
            crawled_at: None,
        }
    }

    /// Returns true if the record passes the adapter validation gate:
    /// non-empty title, positive price and an absolute http(s) URL
    pub fn is_valid(&self) -> bool {
        if self.title.trim().is_empty() || self.price <= 0 {
            return false;
        }

        matches!(
            Url::parse(&self.url).map(|u| u.scheme().to_string()).as_deref(),
            Ok("http") | Ok("https")
        )
    }

    /// Returns the address if present and non-blank
    pub fn address_text(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// Returns the district if present and non-blank
    pub fn district_text(&self) -> Option<&str> {
        self.district.as_deref().filter(|d| !d.is_empty())
    }
}

/// A candidate page produced by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTarget {
    pub source: Source,
    pub url: String,
    pub title: Option<String>,
}

/// Result of one adapter invocation
///
/// Adapters never fail to their caller: a fetch or parse failure is reported
/// in `error` and `items` is empty.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub items: Vec<ListingRecord>,
    pub error: Option<String>,
}

impl CrawlOutcome {
    pub fn ok(items: Vec<ListingRecord>) -> Self {
        Self { items, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Result of one discovery query
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub discovered: Vec<DiscoveryTarget>,
    pub error: Option<String>,
}

impl DiscoveryOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            discovered: Vec::new(),
            error: Some(error.into()),
        }
    }
}
