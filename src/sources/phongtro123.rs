//! phongtro123.com listing pages

use crate::model::{CrawlOutcome, Source};
use crate::sources::html::{BlockSelectors, SelectorSet};
use crate::sources::{crawl_static_page, AdapterContext};

fn selectors() -> BlockSelectors {
    BlockSelectors {
        blocks: SelectorSet::new(&[".post-item", ".listing-item", ".item"]),
        title: SelectorSet::new(&["h3 a", "a.title", "h3"]),
        title_attr: Some(SelectorSet::new(&["a[title]"])),
        href: SelectorSet::new(&["h3 a", "a.title", "a"]),
        price: SelectorSet::new(&[".price", ".post-price", ".listing-price"]),
        address: SelectorSet::new(&[".address", ".post-meta .post-location"]),
        area: Some(SelectorSet::new(&[".acreage", ".post-meta"])),
        images: SelectorSet::new(&["img"]),
    }
}

/// Crawls one phongtro123 listing page
pub async fn crawl(ctx: &AdapterContext<'_>, list_url: &str) -> CrawlOutcome {
    crawl_static_page(ctx, list_url, &selectors(), Source::Phongtro123).await
}
