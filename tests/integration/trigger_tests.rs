use crate::common::{five_good_one_bad, orchestrator};
use cheap_home::config::Secrets;
use cheap_home::crawler::handle_crawl_request;
use cheap_home::storage::ListingStore;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_trigger_single_source() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_good_one_bad("t")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let body = format!(r#"{{"source": "phongtro123", "url": "{}/list"}}"#, base_url);
    let response = handle_crawl_request(&mut orch, &body).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["ok"], true);
    assert_eq!(response.body["discoveredCount"], 0);
    assert_eq!(response.body["crawledCount"], 5);
    assert_eq!(response.body["upsertedCount"], 5);
    assert_eq!(response.body["sourcesCrawled"][0], "phongtro123");
    assert_eq!(orch.storage().count_listings().unwrap(), 5);
}

#[tokio::test]
async fn test_trigger_reports_adapter_failure_as_warning() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let body = format!(r#"{{"source": "batdongsan", "url": "{}/gone"}}"#, base_url);
    let response = handle_crawl_request(&mut orch, &body).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["crawledCount"], 0);
    assert_eq!(response.body["warnings"][0], "batdongsan: HTTP 410");
}
