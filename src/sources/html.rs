//! HTML extraction shared by the listing-site adapters
//!
//! A listing page is a sequence of blocks. For every block the adapter names
//! candidate sub-selectors per field; the first candidate producing a
//! non-empty value wins.

use crate::model::{ListingRecord, Origin};
use crate::text::{detect_district, normalize_text, parse_area, parse_price};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Ordered candidate selectors for one field
#[derive(Debug)]
pub struct SelectorSet {
    candidates: Vec<Selector>,
}

impl SelectorSet {
    /// Compiles the candidates, skipping any that fail to parse
    pub fn new(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates
                .iter()
                .filter_map(|css| Selector::parse(css).ok())
                .collect(),
        }
    }

    /// Returns the first non-empty normalized text under `element`
    pub fn first_text(&self, element: ElementRef<'_>) -> Option<String> {
        self.candidates.iter().find_map(|selector| {
            element
                .select(selector)
                .map(|found| normalize_text(&found.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
    }

    /// Returns the first non-empty attribute value under `element`
    pub fn first_attr(&self, element: ElementRef<'_>, attr: &str) -> Option<String> {
        self.candidates.iter().find_map(|selector| {
            element
                .select(selector)
                .filter_map(|found| found.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
    }

    /// Returns the normalized text of every match under `element`, joined
    pub fn all_text(&self, element: ElementRef<'_>) -> String {
        let parts: Vec<String> = self
            .candidates
            .iter()
            .flat_map(|selector| element.select(selector))
            .map(|found| found.text().collect::<String>())
            .collect();
        normalize_text(&parts.join(" "))
    }

    /// Returns the elements matched by any candidate, in document order
    pub fn select_blocks<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| self.candidates.iter().any(|s| s.matches(element)))
            .collect()
    }
}

/// Field selectors describing one listing site
#[derive(Debug)]
pub struct BlockSelectors {
    pub blocks: SelectorSet,
    pub title: SelectorSet,
    /// Attribute fallback for the title (`a[title]`)
    pub title_attr: Option<SelectorSet>,
    pub href: SelectorSet,
    pub price: SelectorSet,
    pub address: SelectorSet,
    /// Text searched for a floor area, if the site shows one
    pub area: Option<SelectorSet>,
    pub images: SelectorSet,
}

/// Maximum images kept per listing
pub const MAX_IMAGES: usize = 5;

/// Extracts validated listings from a page
///
/// Blocks with an empty title, a non-positive price or an unresolvable link
/// are dropped. A URL seen earlier on the same page is dropped too.
///
/// # Arguments
///
/// * `html` - Page content
/// * `page_url` - URL the page was fetched from, used to resolve links
/// * `selectors` - Site-specific selectors
/// * `origin` - Origin stamped on every record
/// * `now` - Timestamp used for `posted_at`
pub fn extract_listings(
    html: &str,
    page_url: &Url,
    selectors: &BlockSelectors,
    origin: Origin,
    now: DateTime<Utc>,
) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let blocks = selectors.blocks.select_blocks(&document);
    debug!("Found {} candidate blocks on {}", blocks.len(), page_url);

    let items = blocks
        .into_iter()
        .filter_map(|block| extract_block(block, page_url, selectors, origin, now))
        .collect();

    dedupe_by_url(items)
}

fn extract_block(
    block: ElementRef<'_>,
    page_url: &Url,
    selectors: &BlockSelectors,
    origin: Origin,
    now: DateTime<Utc>,
) -> Option<ListingRecord> {
    let title = selectors.title.first_text(block).or_else(|| {
        selectors
            .title_attr
            .as_ref()
            .and_then(|set| set.first_attr(block, "title"))
            .map(|t| normalize_text(&t))
    })?;

    let href = selectors.href.first_attr(block, "href")?;
    let url = resolve_link(&href, page_url)?;

    let price = parse_price(&selectors.price.first_text(block).unwrap_or_default());

    let mut record = ListingRecord::new(url, title, price, origin, now);

    if let Some(address) = selectors.address.first_text(block) {
        let district = detect_district(&address);
        if !district.is_empty() {
            record.district = Some(district);
        }
        record.address = Some(address);
    }

    if let Some(area_set) = &selectors.area {
        record.area = parse_area(&area_set.all_text(block));
    }

    record.images = extract_images(block, &selectors.images, page_url);

    record.is_valid().then_some(record)
}

/// Collects up to [`MAX_IMAGES`] image URLs, preferring lazy-load attributes
pub fn extract_images(block: ElementRef<'_>, images: &SelectorSet, page_url: &Url) -> Vec<String> {
    let mut urls = Vec::new();
    for selector in &images.candidates {
        for img in block.select(selector) {
            let src = img
                .value()
                .attr("data-src")
                .or_else(|| img.value().attr("src"))
                .and_then(|src| resolve_link(src, page_url));
            if let Some(src) = src {
                if !urls.contains(&src) {
                    urls.push(src);
                }
            }
            if urls.len() >= MAX_IMAGES {
                return urls;
            }
        }
    }
    urls
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Keeps the first record for every URL, preserving order
pub fn dedupe_by_url(items: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}
