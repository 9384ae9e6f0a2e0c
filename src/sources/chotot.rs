//! chotot.com marketplace (client-rendered, needs a browser)

use crate::model::{CrawlOutcome, JobParams, ListingRecord, Source};
use crate::sources::browser::{run_in_browser, BrowserSession};
use crate::sources::html::{dedupe_by_url, extract_images, resolve_link, SelectorSet};
use crate::sources::AdapterContext;
use crate::text::{detect_district, find_price_mention, normalize_text};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

const LISTING_LINK: &str = r#"a[href*="/tin/"]"#;

/// Crawls one chotot listing page through a headless browser
pub async fn crawl(ctx: &AdapterContext<'_>, list_url: &str, params: &JobParams) -> CrawlOutcome {
    let base = match Url::parse(list_url) {
        Ok(url) => url,
        Err(e) => return CrawlOutcome::failed(format!("Invalid URL {}: {}", list_url, e)),
    };

    let browser_config = ctx.config.browser.clone();
    let user_agent = ctx.config.user_agent.clone();
    let scroll = params.scroll.unwrap_or(browser_config.scroll_rounds);
    let url = list_url.to_string();

    let captured = run_in_browser(move || {
        let session = BrowserSession::launch(&browser_config, &user_agent)?;
        session.goto(&url)?;
        session.wait_for_ready(LISTING_LINK);
        session.scroll(scroll)?;
        session.html()
    })
    .await;

    match captured {
        Ok(html) => {
            let items = extract_listings(&html, &base, Utc::now());
            info!("chotot: {} listings from {}", items.len(), list_url);
            CrawlOutcome::ok(items)
        }
        Err(e) => {
            warn!("chotot: browser crawl of {} failed: {}", list_url, e);
            CrawlOutcome::failed(e)
        }
    }
}

/// Extracts listings from a rendered chotot page
///
/// Listing cards are anchors pointing at `/tin/` with a `title` attribute;
/// price and district are read from the card text.
pub fn extract_listings(html: &str, page_url: &Url, now: DateTime<Utc>) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let Ok(links) = Selector::parse(LISTING_LINK) else {
        return Vec::new();
    };
    let images = SelectorSet::new(&["img"]);

    let items = document
        .select(&links)
        .filter_map(|anchor| {
            let title = normalize_text(anchor.value().attr("title").unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            let url = resolve_link(anchor.value().attr("href")?, page_url)?;

            let text = normalize_text(&anchor.text().collect::<Vec<_>>().join(" "));
            let price = find_price_mention(&text).unwrap_or(0);

            let mut record =
                ListingRecord::new(url, title, price, Source::Chotot.origin(), now);
            let district = detect_district(&text);
            if !district.is_empty() {
                record.district = Some(district);
            }
            record.images = extract_images(anchor, &images, page_url);

            record.is_valid().then_some(record)
        })
        .collect();

    dedupe_by_url(items)
}
