//! Enrichment stage
//!
//! Runs over a crawled batch before it is persisted:
//! 1. Geocoding of every record with an address (location, district backfill)
//! 2. Language-model classification (amenities, room type, owner, spam score)
//! 3. A single `crawled_at` stamp for the whole batch
//!
//! Calls are sequential with a fixed pause between them. A failing call
//! leaves its record unchanged; a missing API key skips the whole step.

mod geocode;
mod llm;

pub use geocode::{geocode_address, GeocodeHit};
pub use llm::{build_prompt, classify_listing, LlmInsights};

use crate::config::{Config, Secrets};
use crate::model::ListingRecord;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Counters for one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub geocoded: usize,
    pub geocode_failures: usize,
    pub classified: usize,
    pub classify_failures: usize,
}

/// Runs the enrichment steps against one batch
pub struct Enricher<'a> {
    client: &'a Client,
    config: &'a Config,
    secrets: &'a Secrets,
}

impl<'a> Enricher<'a> {
    pub fn new(client: &'a Client, config: &'a Config, secrets: &'a Secrets) -> Self {
        Self {
            client,
            config,
            secrets,
        }
    }

    /// Enriches `records` in place and stamps them with `run_time`
    pub async fn enrich(
        &self,
        records: &mut [ListingRecord],
        run_time: DateTime<Utc>,
    ) -> EnrichmentStats {
        let mut stats = EnrichmentStats::default();
        if records.is_empty() {
            return stats;
        }

        self.geocode_all(records, &mut stats).await;
        self.classify_all(records, &mut stats).await;

        for record in records.iter_mut() {
            record.crawled_at = Some(run_time);
        }

        info!(
            "Enriched {} records ({} geocoded, {} classified)",
            records.len(),
            stats.geocoded,
            stats.classified
        );
        stats
    }

    async fn geocode_all(&self, records: &mut [ListingRecord], stats: &mut EnrichmentStats) {
        let Some(key) = self.secrets.google_maps_api_key.as_deref() else {
            warn!("GOOGLE_MAPS_API_KEY not set; skipping geocoding");
            return;
        };
        let delay = Duration::from_millis(self.config.crawler.geocode_delay);
        let endpoint = &self.config.endpoints.geocode;
        let mut first_call = true;

        for record in records.iter_mut() {
            let Some(address) = record.address_text().map(str::to_string) else {
                continue;
            };

            if !first_call {
                pause(delay).await;
            }
            first_call = false;

            match geocode_address(self.client, endpoint, key, &address).await {
                Ok(Some(hit)) => {
                    if let Some(location) = hit.location {
                        record.location = Some(location);
                    }
                    if record.district_text().is_none() {
                        if let Some(district) = hit.district {
                            record.district = Some(district);
                        }
                    }
                    stats.geocoded += 1;
                }
                Ok(None) => debug!("No geocode result for '{}'", address),
                Err(e) => {
                    stats.geocode_failures += 1;
                    warn!("Geocoding '{}' failed: {}", address, e);
                }
            }
        }
    }

    async fn classify_all(&self, records: &mut [ListingRecord], stats: &mut EnrichmentStats) {
        let Some(key) = self.secrets.openai_api_key.as_deref() else {
            warn!("OPENAI_API_KEY not set; skipping classification");
            return;
        };
        let delay = Duration::from_millis(self.config.crawler.llm_delay);
        let base_url = &self.config.endpoints.llm;
        let model = &self.config.llm.model;

        for (index, record) in records.iter_mut().enumerate() {
            if index > 0 {
                pause(delay).await;
            }

            match classify_listing(self.client, base_url, key, model, record).await {
                Ok(insights) => {
                    insights.apply_to(record);
                    stats.classified += 1;
                }
                Err(e) => {
                    stats.classify_failures += 1;
                    warn!("Classification of {} failed: {}", record.url, e);
                }
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
