//! Crawl trigger
//!
//! Turns a JSON crawl request into an orchestrator run and a JSON response
//! with an HTTP-style status. Request shape:
//!
//! ```json
//! { "source": "chotot", "url": "https://www.chotot.com/...", "params": { "scroll": 4 } }
//! { "source": "discovery", "query": "phòng trọ hải châu" }
//! ```
//!
//! When `params` is absent, parameters are read from the top level of the
//! request instead.

use crate::crawler::coordinator::Orchestrator;
use crate::crawler::jobs::JobKind;
use crate::discovery::classify_link;
use crate::model::JobParams;
use crate::CrawlError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Parsed crawl request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Status code and JSON body for a crawl request
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: Value,
}

impl TriggerResponse {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Handles one crawl request
///
/// | Condition | Status |
/// |-----------|--------|
/// | body is not JSON, or has no target | 400 |
/// | unknown source | 400, nothing crawled |
/// | storage failure during the run | 500 |
/// | otherwise | 200 with the run counts |
///
/// Without `source`, the source is inferred from the URL's host.
pub async fn handle_crawl_request(orchestrator: &mut Orchestrator, body: &str) -> TriggerResponse {
    let value: Value = match serde_json::from_str(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return TriggerResponse::error(400, "Invalid JSON body"),
    };
    let request: CrawlRequest = match serde_json::from_value(value.clone()) {
        Ok(request) => request,
        Err(e) => return TriggerResponse::error(400, format!("Invalid crawl request: {}", e)),
    };

    let params_value = value.get("params").cloned().unwrap_or(value);
    let params: JobParams = match serde_json::from_value(params_value) {
        Ok(params) => params,
        Err(e) => return TriggerResponse::error(400, format!("Invalid params: {}", e)),
    };

    let url = non_blank(request.url.as_deref());
    let source = match non_blank(request.source.as_deref()) {
        Some(source) => source.to_string(),
        None => match url.and_then(classify_link) {
            Some(source) => source.as_str().to_string(),
            None => return TriggerResponse::error(400, "Missing source"),
        },
    };

    let kind = match source.parse::<JobKind>() {
        Ok(kind) => kind,
        Err(e) => return TriggerResponse::error(400, e.to_string()),
    };
    let target = match kind {
        JobKind::Discovery => non_blank(request.query.as_deref()).or(url),
        JobKind::Crawl(_) => url,
    };
    let Some(target) = target else {
        return TriggerResponse::error(400, "Missing url/query for source");
    };

    let result = match kind {
        JobKind::Discovery => orchestrator.run_discovery(target, &params).await,
        JobKind::Crawl(source) => orchestrator.run_single(source, target, &params).await,
    };

    match result {
        Ok(report) => TriggerResponse {
            status: 200,
            body: json!({
                "ok": true,
                "discoveredCount": report.discovered,
                "crawledCount": report.crawled,
                "upsertedCount": report.upserted,
                "sourcesCrawled": report.sources_crawled,
                "warnings": report.warnings,
            }),
        },
        Err(e @ CrawlError::Config(_)) => TriggerResponse::error(400, e.to_string()),
        Err(e) => {
            warn!("Crawl request failed: {}", e);
            TriggerResponse::error(500, e.to_string())
        }
    }
}
