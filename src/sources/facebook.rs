//! Social group feed through the Graph API

use crate::model::{CrawlOutcome, JobParams, ListingRecord, Source};
use crate::sources::html::{dedupe_by_url, MAX_IMAGES};
use crate::sources::AdapterContext;
use crate::text::{detect_district, find_price_mention, normalize_text, truncate_chars};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const FEED_FIELDS: &str =
    "message,created_time,permalink_url,id,attachments{media_type,media,url},from";
const FEED_LIMIT: &str = "50";
const TITLE_MAX_CHARS: usize = 80;

fn rental_keywords() -> Option<&'static Regex> {
    static KEYWORDS: OnceLock<Option<Regex>> = OnceLock::new();
    KEYWORDS
        .get_or_init(|| Regex::new(r"(?i)(cho thuê|phòng trọ|chung cư|căn hộ|trọ)").ok())
        .as_ref()
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    data: Vec<FeedPost>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedPost {
    id: String,
    message: Option<String>,
    created_time: Option<String>,
    permalink_url: Option<String>,
    attachments: Option<Attachments>,
}

#[derive(Debug, Deserialize)]
struct Attachments {
    #[serde(default)]
    data: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    image: Option<MediaImage>,
}

#[derive(Debug, Deserialize)]
struct MediaImage {
    src: String,
}

/// Crawls a group feed
///
/// `target` is a group id or a group URL (`.../groups/<id>`). The first page
/// failing is an adapter error; a later page failing ends paging with the
/// posts collected so far.
pub async fn crawl(ctx: &AdapterContext<'_>, target: &str, params: &JobParams) -> CrawlOutcome {
    let Some(token) = ctx.secrets.facebook_access_token.as_deref() else {
        return CrawlOutcome::failed("Missing FACEBOOK_ACCESS_TOKEN");
    };

    let group = group_id(target);
    if group.is_empty() {
        return CrawlOutcome::failed("Missing group id");
    }

    let pages = params.pages.unwrap_or(ctx.config.crawler.feed_pages).max(1);
    let now = Utc::now();
    let first_url = format!(
        "{}/{}/feed",
        ctx.config.endpoints.graph.trim_end_matches('/'),
        group
    );

    let mut items = Vec::new();
    let mut next = Some(first_url);
    let mut page_no = 0;

    while let Some(url) = next.take() {
        if page_no >= pages {
            break;
        }

        let request = if page_no == 0 {
            ctx.client.get(&url).query(&[
                ("fields", FEED_FIELDS),
                ("limit", FEED_LIMIT),
                ("access_token", token),
            ])
        } else {
            // `paging.next` already carries the query string
            ctx.client.get(&url)
        };

        let page = match fetch_feed_page(request).await {
            Ok(page) => page,
            Err(e) if page_no == 0 => return CrawlOutcome::failed(e),
            Err(e) => {
                warn!("facebook_group: stopping after page {}: {}", page_no, e);
                break;
            }
        };

        debug!("facebook_group: page {} has {} posts", page_no + 1, page.data.len());
        items.extend(page.data.into_iter().filter_map(|post| post_to_listing(post, now)));

        next = page.paging.and_then(|p| p.next);
        page_no += 1;
    }

    let items = dedupe_by_url(items);
    info!("facebook_group: {} rental posts from group {}", items.len(), group);
    CrawlOutcome::ok(items)
}

async fn fetch_feed_page(request: reqwest::RequestBuilder) -> Result<FeedPage, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("Facebook API {}", status.as_u16()));
    }
    response.json::<FeedPage>().await.map_err(|e| e.to_string())
}

/// Extracts the group id from an id or a group URL
fn group_id(target: &str) -> &str {
    let target = target.trim();
    match target.split_once("/groups/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or_default(),
        None => target,
    }
}

/// Maps one feed post to a listing; posts without a rental keyword are skipped
fn post_to_listing(post: FeedPost, now: DateTime<Utc>) -> Option<ListingRecord> {
    let message = post.message.unwrap_or_default();
    let text = normalize_text(&message);
    if !rental_keywords()?.is_match(&text) {
        return None;
    }

    let url = post
        .permalink_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("https://facebook.com/{}", post.id));
    let posted_at = post
        .created_time
        .as_deref()
        .and_then(parse_graph_time)
        .unwrap_or(now);

    let mut record = ListingRecord::new(
        url,
        truncate_chars(&text, TITLE_MAX_CHARS),
        find_price_mention(&text).unwrap_or(0),
        Source::FacebookGroup.origin(),
        posted_at,
    );

    let district = detect_district(&text);
    if !district.is_empty() {
        record.district = Some(district);
    }
    record.images = post
        .attachments
        .map(|a| {
            a.data
                .into_iter()
                .filter_map(|att| att.media?.image.map(|img| img.src))
                .take(MAX_IMAGES)
                .collect()
        })
        .unwrap_or_default();
    record.raw_description = Some(message);
    record.source_id = Some(post.id);

    record.is_valid().then_some(record)
}

/// Parses Graph API timestamps (`2024-05-01T10:00:00+0000`) and RFC 3339
fn parse_graph_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
