use crate::common::{five_good_one_bad, listing_block, listing_page, orchestrator};
use cheap_home::config::Secrets;
use cheap_home::model::{DiscoveryTarget, JobParams, SearchParams, Source};
use cheap_home::storage::{ListingStore, RunMode};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn serp_secrets() -> Secrets {
    Secrets {
        serpapi_api_key: Some("serp-key".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_discovery_classifies_and_isolates_targets() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "phòng trọ đà nẵng"))
        .and(query_param("engine", "google"))
        .and(query_param("hl", "vi"))
        .and(query_param("gl", "vn"))
        .and(query_param("num", "5"))
        .and(query_param("api_key", "serp-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organic_results": [
                { "link": "https://www.facebook.com/groups/998877", "title": "Phòng trọ Đà Nẵng" },
                { "link": "https://example.com/blog/phong-tro" },
                { "link": "https://www.facebook.com/somepage" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, serp_secrets());

    let params = JobParams {
        search: SearchParams {
            num: Some(5),
            ..Default::default()
        },
        ..Default::default()
    };
    let report = orch
        .run_discovery("phòng trọ đà nẵng", &params)
        .await
        .expect("Discovery run failed");

    // only the numeric group link is crawlable; it fails without credentials
    assert_eq!(report.discovered, 1);
    assert_eq!(report.crawled, 0);
    assert_eq!(report.upserted, 0);
    assert!(report.sources_crawled.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Missing FACEBOOK_EMAIL or FACEBOOK_PASSWORD"));

    let run = orch.storage().latest_run().unwrap().unwrap();
    assert_eq!(run.mode, RunMode::Discovery);
    assert_eq!(run.counts.discovered, 1);
    assert_eq!(run.counts.warnings, 1);
}

#[tokio::test]
async fn test_search_api_error_field_is_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, serp_secrets());

    let report = orch
        .run_discovery("phòng trọ", &JobParams::default())
        .await
        .unwrap();

    assert_eq!(report.discovered, 0);
    assert_eq!(report.warnings, vec!["discovery: Invalid API key."]);
}

#[tokio::test]
async fn test_search_api_status_is_reported() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, serp_secrets());

    let report = orch
        .run_discovery("phòng trọ", &JobParams::default())
        .await
        .unwrap();

    assert_eq!(report.warnings, vec!["discovery: SerpApi 503"]);
    assert_eq!(orch.storage().count_listings().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_search_key_skips_request() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let report = orch
        .run_discovery("phòng trọ", &JobParams::default())
        .await
        .unwrap();

    assert_eq!(report.warnings, vec!["discovery: Missing SERPAPI_API_KEY"]);
}

#[tokio::test]
async fn test_failing_target_does_not_stop_discovered_targets() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_good_one_bad("a")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // the third page repeats one listing from the first
    let mut blocks: Vec<String> = (1..=5)
        .map(|i| {
            listing_block(
                &format!("c-{}", i),
                &format!("Phòng trọ c số {}", i),
                "2 triệu",
                "Cẩm Lệ, Đà Nẵng",
            )
        })
        .collect();
    blocks.push(listing_block(
        "a-1",
        "Phòng trọ a số 1",
        "1,5 triệu/tháng",
        "Đường Lê Duẩn, Hải Châu, Đà Nẵng",
    ));
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&blocks)))
        .mount(&mock_server)
        .await;

    let targets = vec![
        DiscoveryTarget {
            source: Source::Phongtro123,
            url: format!("{}/a", base_url),
            title: None,
        },
        DiscoveryTarget {
            source: Source::Batdongsan,
            url: format!("{}/b", base_url),
            title: None,
        },
        DiscoveryTarget {
            source: Source::Phongtro123,
            url: format!("{}/c", base_url),
            title: None,
        },
    ];

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let report = orch
        .run_targets(&targets, &JobParams::default())
        .await
        .expect("Discovery run failed");

    assert_eq!(report.discovered, 3);
    assert_eq!(report.crawled, 10);
    assert_eq!(report.upserted, 10);
    assert_eq!(report.sources_crawled, vec!["phongtro123"]);
    assert_eq!(
        report.warnings,
        vec![format!("batdongsan {}/b: HTTP 500", base_url)]
    );

    let storage = orch.storage();
    assert_eq!(storage.count_listings().unwrap(), 10);
    assert!(storage
        .get_by_url(&format!("{}/a-3.html", base_url))
        .unwrap()
        .is_some());
    assert!(storage
        .get_by_url(&format!("{}/c-3.html", base_url))
        .unwrap()
        .is_some());

    let run = storage.latest_run().unwrap().unwrap();
    assert_eq!(run.mode, RunMode::Discovery);
    assert_eq!(run.counts.crawled, 10);
    assert_eq!(run.counts.warnings, 1);
}
