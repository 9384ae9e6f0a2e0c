use crate::common::{five_good_one_bad, listing_block, listing_page, orchestrator};
use cheap_home::config::Secrets;
use cheap_home::model::{JobParams, Origin, Source};
use cheap_home::storage::{ListingQuery, ListingStore, RunMode, RunStatus};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_single_source_crawl_is_idempotent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/tinh-thanh/da-nang"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(five_good_one_bad("phong"))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());
    let target = format!("{}/tinh-thanh/da-nang", base_url);

    let first = orch
        .run_single(Source::Phongtro123, &target, &JobParams::default())
        .await
        .expect("First crawl failed");

    assert_eq!(first.crawled, 5);
    assert_eq!(first.upserted, 5);
    assert_eq!(first.sources_crawled, vec!["phongtro123"]);
    assert!(first.warnings.is_empty());
    assert_eq!(orch.storage().count_listings().unwrap(), 5);

    // crawled_at is stored with millisecond precision
    tokio::time::sleep(Duration::from_millis(5)).await;

    let second = orch
        .run_single(Source::Phongtro123, &target, &JobParams::default())
        .await
        .expect("Second crawl failed");

    assert_eq!(second.crawled, 5);
    assert_eq!(second.upserted, 5, "every existing row is modified");
    assert_eq!(orch.storage().count_listings().unwrap(), 5);

    let stored = orch
        .storage()
        .get_by_url(&format!("{}/phong-1.html", base_url))
        .unwrap()
        .expect("Listing should be stored");
    assert_eq!(stored.record.price, 1_500_000);
    assert_eq!(stored.record.district.as_deref(), Some("Hải Châu"));
    assert_eq!(stored.record.area, Some(20.0));
    assert_eq!(stored.record.source, Origin::Phongtro123);
    assert_eq!(
        stored.record.images,
        vec![format!("{}/img/phong-1.jpg", base_url)]
    );
    assert!(stored.record.crawled_at.is_some());

    assert!(orch
        .storage()
        .get_by_url(&format!("{}/phong-no-price.html", base_url))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_runs_are_recorded_in_ledger() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_good_one_bad("room")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    orch.run_single(
        Source::Phongtro123,
        &format!("{}/list", base_url),
        &JobParams::default(),
    )
    .await
    .unwrap();

    let run = orch.storage().latest_run().unwrap().expect("Run recorded");
    assert_eq!(run.mode, RunMode::Single);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-config-hash");
    assert_eq!(run.counts.crawled, 5);
    assert_eq!(run.counts.upserted, 5);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_http_error_becomes_warning() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let report = orch
        .run_single(
            Source::Batdongsan,
            &format!("{}/missing", base_url),
            &JobParams::default(),
        )
        .await
        .expect("Adapter failures never abort the run");

    assert_eq!(report.crawled, 0);
    assert_eq!(report.upserted, 0);
    assert_eq!(report.warnings, vec!["batdongsan: HTTP 404"]);
    assert_eq!(orch.storage().count_listings().unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_urls_on_one_page_are_kept_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let block = listing_block("dup", "Phòng trọ trùng", "2 triệu", "Cẩm Lệ, Đà Nẵng");
    Mock::given(method("GET"))
        .and(path("/dup"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[block.clone(), block])),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let report = orch
        .run_single(
            Source::Phongtro123,
            &format!("{}/dup", base_url),
            &JobParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.crawled, 1);
    assert_eq!(orch.storage().count_listings().unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_source_has_no_effect() {
    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator("http://127.0.0.1:9", &dir, Secrets::default());

    let result = orch
        .run_named("craigslist", "https://example.com", &JobParams::default())
        .await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Unknown source"));
    assert!(orch.storage().latest_run().unwrap().is_none());
}

#[tokio::test]
async fn test_feed_api_follows_paging() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/graph/123456/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {
                    "id": "123456_1",
                    "message": "Cho thuê phòng trọ Hải Châu giá 1.800.000đ",
                    "created_time": "2024-05-01T08:00:00+0000",
                    "permalink_url": "https://www.facebook.com/groups/123456/posts/1"
                },
                {
                    "id": "123456_2",
                    "message": "Bán xe máy giá tốt"
                }
            ],
            "paging": { "next": format!("{}/graph/page2", base_url) }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{
                "id": "123456_3",
                "message": "Căn hộ mini Sơn Trà 4 triệu"
            }]
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let secrets = Secrets {
        facebook_access_token: Some("token".to_string()),
        ..Default::default()
    };
    let mut orch = orchestrator(&base_url, &dir, secrets);

    let params = JobParams {
        pages: Some(2),
        ..Default::default()
    };
    let report = orch
        .run_single(Source::FacebookGroup, "123456", &params)
        .await
        .unwrap();

    assert_eq!(report.crawled, 2);
    assert_eq!(report.upserted, 2);

    let stored = orch
        .storage()
        .get_by_url("https://www.facebook.com/groups/123456/posts/1")
        .unwrap()
        .expect("Permalinked post stored");
    assert_eq!(stored.record.source, Origin::Facebook);
    assert_eq!(stored.record.price, 1_800_000);
    assert_eq!(stored.record.source_id.as_deref(), Some("123456_1"));

    let page = orch
        .storage()
        .query_listings(&ListingQuery {
            sources: vec!["facebook".to_string()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.total, 2);
}
