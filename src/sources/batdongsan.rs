//! batdongsan.com.vn search result pages

use crate::model::{CrawlOutcome, Source};
use crate::sources::html::{BlockSelectors, SelectorSet};
use crate::sources::{crawl_static_page, AdapterContext};

fn selectors() -> BlockSelectors {
    BlockSelectors {
        blocks: SelectorSet::new(&[".js-bds-search-list .search-productItem", ".item"]),
        title: SelectorSet::new(&["h3 a", ".pr-title a"]),
        title_attr: None,
        href: SelectorSet::new(&["h3 a", ".pr-title a"]),
        price: SelectorSet::new(&[".price", ".pr-price"]),
        address: SelectorSet::new(&[".address", ".location"]),
        area: Some(SelectorSet::new(&[".area", ".pr-area"])),
        images: SelectorSet::new(&["img"]),
    }
}

/// Crawls one batdongsan search result page
pub async fn crawl(ctx: &AdapterContext<'_>, list_url: &str) -> CrawlOutcome {
    crawl_static_page(ctx, list_url, &selectors(), Source::Batdongsan).await
}
