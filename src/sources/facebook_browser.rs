//! Social group pages read through an authenticated headless browser

use crate::model::{CrawlOutcome, JobParams, ListingRecord, Source};
use crate::sources::browser::{run_in_browser, BrowserSession};
use crate::sources::html::{dedupe_by_url, extract_images, resolve_link, SelectorSet};
use crate::sources::AdapterContext;
use crate::text::{detect_district, find_price_mention, normalize_text, truncate_chars};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::{info, warn};
use url::Url;

const READY_SELECTOR: &str = r#"[role="article"], [data-pagelet^="GroupFeed"]"#;
const ARTICLE_SELECTOR: &str = r#"[role="article"]"#;
const POST_LINK_SELECTOR: &str = r#"a[href*="/groups/"]"#;
const TITLE_MAX_CHARS: usize = 160;
const FALLBACK_ADDRESS: &str = "Đà Nẵng";

fn post_id_regex() -> Option<&'static Regex> {
    static POST_ID: OnceLock<Option<Regex>> = OnceLock::new();
    POST_ID
        .get_or_init(|| Regex::new(r"(?:permalink|posts)/(\d+)").ok())
        .as_ref()
}

/// Crawls a group page after logging in
pub async fn crawl(ctx: &AdapterContext<'_>, group_url: &str, params: &JobParams) -> CrawlOutcome {
    if group_url.trim().is_empty() {
        return CrawlOutcome::failed("Missing group URL");
    }

    let Some((email, password)) = ctx.secrets.facebook_login() else {
        return CrawlOutcome::failed("Missing FACEBOOK_EMAIL or FACEBOOK_PASSWORD in env");
    };

    let base = match Url::parse(group_url) {
        Ok(url) => url,
        Err(e) => return CrawlOutcome::failed(format!("Invalid URL {}: {}", group_url, e)),
    };

    let browser_config = ctx.config.browser.clone();
    let user_agent = ctx.config.user_agent.clone();
    let login_url = format!("{}/login", ctx.config.endpoints.facebook_web.trim_end_matches('/'));
    let scroll = params.scroll.unwrap_or(browser_config.scroll_rounds);
    let email = email.to_string();
    let password = password.to_string();
    let url = group_url.to_string();

    let captured = run_in_browser(move || {
        let session = BrowserSession::launch(&browser_config, &user_agent)?;
        session.login(&login_url, &email, &password)?;
        session.goto(&url)?;
        session.settle();
        session.wait_for_ready(READY_SELECTOR);
        session.scroll(scroll)?;
        Ok((session.html()?, session.current_url()))
    })
    .await;

    match captured {
        Ok((html, current_url)) => {
            let page_url = Url::parse(&current_url).unwrap_or(base);
            let items = extract_posts(&html, &page_url, Utc::now());
            info!("facebook_group_pw: {} posts from {}", items.len(), group_url);
            CrawlOutcome::ok(items)
        }
        Err(e) => {
            warn!("facebook_group_pw: crawl of {} failed: {}", group_url, e);
            CrawlOutcome::failed(e)
        }
    }
}

/// Extracts priced posts from a rendered group page
///
/// Each `[role="article"]` is one post. The first text line becomes the
/// title; the whole text is kept as the raw description. Posts without a
/// detectable price are dropped.
pub fn extract_posts(html: &str, page_url: &Url, now: DateTime<Utc>) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let (Ok(articles), Ok(post_link)) = (
        Selector::parse(ARTICLE_SELECTOR),
        Selector::parse(POST_LINK_SELECTOR),
    ) else {
        return Vec::new();
    };
    let images = SelectorSet::new(&["img"]);

    let items = document
        .select(&articles)
        .filter_map(|article| {
            let lines: Vec<String> = article
                .text()
                .map(normalize_text)
                .filter(|line| !line.is_empty())
                .collect();
            let text = lines.join("\n");
            let first_line = lines.first()?;
            let title = truncate_chars(first_line, TITLE_MAX_CHARS);

            let price = find_price_mention(&text)?;

            let url = article
                .select(&post_link)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| resolve_link(href, page_url))
                .unwrap_or_else(|| page_url.to_string());

            let mut record =
                ListingRecord::new(url, title, price, Source::FacebookGroupPw.origin(), now);

            let district = detect_district(&text);
            record.address = Some(if district.is_empty() {
                FALLBACK_ADDRESS.to_string()
            } else {
                district.clone()
            });
            if !district.is_empty() {
                record.district = Some(district);
            }

            record.source_id = post_id_regex()
                .and_then(|re| re.captures(&record.url))
                .map(|caps| caps[1].to_string());
            record.images = extract_images(article, &images, page_url);
            record.raw_description = Some(normalize_text(&text));

            record.is_valid().then_some(record)
        })
        .collect();

    dedupe_by_url(items)
}
