use crate::discovery::classify::classify_link;
use crate::model::{DiscoveryOutcome, DiscoveryTarget, SearchParams};
use crate::sources::AdapterContext;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    error: Option<Value>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

/// Builds the ordered query parameters for one search
///
/// Defaults: `engine=google`, `hl=vi`, `gl=vn`, `num=20`.
pub fn search_query(query: &str, params: &SearchParams, api_key: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = vec![
        ("engine".into(), params.engine.clone().unwrap_or_else(|| "google".into())),
        ("q".into(), query.to_string()),
        ("hl".into(), params.hl.clone().unwrap_or_else(|| "vi".into())),
        ("gl".into(), params.gl.clone().unwrap_or_else(|| "vn".into())),
        ("num".into(), params.num.unwrap_or(20).to_string()),
    ];

    if let Some(start) = params.start {
        pairs.push(("start".into(), start.to_string()));
    }
    if let Some(location) = params.location.as_deref().filter(|l| !l.is_empty()) {
        pairs.push(("location".into(), location.to_string()));
    }
    if let Some(uule) = params.uule.as_deref().filter(|u| !u.is_empty()) {
        pairs.push(("uule".into(), uule.to_string()));
    }
    for (key, value) in params.advanced() {
        if !value.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    pairs.push(("api_key".into(), api_key.to_string()));
    pairs
}

/// Runs a search and classifies its organic results into crawl targets
///
/// Results keep the API's order; links no adapter handles are dropped.
/// Never fails to the caller: problems are reported in `error`.
pub async fn discover(
    ctx: &AdapterContext<'_>,
    query: &str,
    params: &SearchParams,
) -> DiscoveryOutcome {
    let Some(api_key) = ctx.secrets.serpapi_api_key.as_deref() else {
        return DiscoveryOutcome::failed("Missing SERPAPI_API_KEY");
    };

    let response = match ctx
        .client
        .get(&ctx.config.endpoints.serpapi)
        .query(&search_query(query, params, api_key))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return DiscoveryOutcome::failed(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        warn!("SerpApi answered {} for '{}'", status, query);
        return DiscoveryOutcome::failed(format!("SerpApi {}", status.as_u16()));
    }

    let body: SearchResponse = match response.json().await {
        Ok(body) => body,
        Err(e) => return DiscoveryOutcome::failed(e.to_string()),
    };

    if let Some(error) = body.error {
        let message = match error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return DiscoveryOutcome::failed(message);
    }

    let total = body.organic_results.len();
    let discovered: Vec<DiscoveryTarget> = body
        .organic_results
        .into_iter()
        .filter_map(|result| {
            let link = result.link.or(result.url)?;
            let source = classify_link(&link)?;
            debug!("Discovered {} target {}", source, link);
            Some(DiscoveryTarget {
                source,
                url: link,
                title: result.title,
            })
        })
        .collect();

    info!(
        "Discovery '{}': {} of {} results are crawlable",
        query,
        discovered.len(),
        total
    );

    DiscoveryOutcome {
        discovered,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_query_parameters() {
        let pairs = search_query("phòng trọ đà nẵng", &SearchParams::default(), "KEY");

        assert_eq!(value_of(&pairs, "engine"), Some("google"));
        assert_eq!(value_of(&pairs, "q"), Some("phòng trọ đà nẵng"));
        assert_eq!(value_of(&pairs, "hl"), Some("vi"));
        assert_eq!(value_of(&pairs, "gl"), Some("vn"));
        assert_eq!(value_of(&pairs, "num"), Some("20"));
        assert_eq!(value_of(&pairs, "api_key"), Some("KEY"));
        assert_eq!(value_of(&pairs, "start"), None);
        assert_eq!(value_of(&pairs, "location"), None);
    }

    #[test]
    fn test_overrides_and_passthrough() {
        let params = SearchParams {
            hl: Some("en".into()),
            num: Some(50),
            start: Some(10),
            location: Some("Da Nang, Vietnam".into()),
            ludocid: Some("123".into()),
            uds: Some(String::new()),
            ..SearchParams::default()
        };
        let pairs = search_query("q", &params, "KEY");

        assert_eq!(value_of(&pairs, "hl"), Some("en"));
        assert_eq!(value_of(&pairs, "num"), Some("50"));
        assert_eq!(value_of(&pairs, "start"), Some("10"));
        assert_eq!(value_of(&pairs, "location"), Some("Da Nang, Vietnam"));
        assert_eq!(value_of(&pairs, "ludocid"), Some("123"));
        assert_eq!(value_of(&pairs, "uds"), None);
    }
}
