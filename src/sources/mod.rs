//! Source adapters
//!
//! One adapter per external site or API. Every adapter has the same contract:
//! given a target (listing URL or group id) it returns a [`CrawlOutcome`] and
//! never fails to its caller. Dispatch goes through the closed [`Source`] enum.

mod batdongsan;
pub mod browser;
mod chotot;
mod facebook;
mod facebook_browser;
mod fetcher;
pub mod html;
mod phongtro123;

pub use fetcher::{build_http_client, fetch_page, FetchResult};

use crate::config::{Config, Secrets};
use crate::model::{CrawlOutcome, JobParams, Source};
use chrono::Utc;
use html::{extract_listings, BlockSelectors};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

/// Shared dependencies handed to every adapter call
#[derive(Clone, Copy)]
pub struct AdapterContext<'a> {
    pub client: &'a Client,
    pub config: &'a Config,
    pub secrets: &'a Secrets,
}

impl Source {
    /// Runs this source's adapter against one target
    ///
    /// # Arguments
    ///
    /// * `ctx` - HTTP client, configuration and secrets
    /// * `target` - Listing page URL, or group id / URL for the feed adapter
    /// * `params` - Per-job parameters (scroll rounds, feed pages)
    pub async fn crawl(
        &self,
        ctx: &AdapterContext<'_>,
        target: &str,
        params: &JobParams,
    ) -> CrawlOutcome {
        match self {
            Source::Phongtro123 => phongtro123::crawl(ctx, target).await,
            Source::Batdongsan => batdongsan::crawl(ctx, target).await,
            Source::Chotot => chotot::crawl(ctx, target, params).await,
            Source::FacebookGroup => facebook::crawl(ctx, target, params).await,
            Source::FacebookGroupPw => facebook_browser::crawl(ctx, target, params).await,
        }
    }
}

/// Fetches a static listing page and extracts its blocks
pub(crate) async fn crawl_static_page(
    ctx: &AdapterContext<'_>,
    list_url: &str,
    selectors: &BlockSelectors,
    source: Source,
) -> CrawlOutcome {
    let origin = source.origin();
    let (final_url, body) = match fetch_page(ctx.client, list_url).await.into_page() {
        Ok(page) => page,
        Err(e) => {
            warn!("{}: fetch of {} failed: {}", origin, list_url, e);
            return CrawlOutcome::failed(e);
        }
    };

    let page_url = match Url::parse(&final_url) {
        Ok(url) => url,
        Err(e) => return CrawlOutcome::failed(format!("Invalid URL {}: {}", final_url, e)),
    };

    let items = extract_listings(&body, &page_url, selectors, origin, Utc::now());
    info!("{}: {} listings from {}", origin, items.len(), list_url);
    CrawlOutcome::ok(items)
}
