use crate::common::{five_good_one_bad, orchestrator};
use cheap_home::config::Secrets;
use cheap_home::storage::{ListingStore, RunMode, RunStatus};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_failing_job_does_not_stop_the_batch() {
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
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_good_one_bad("c")))
        .mount(&mock_server)
        .await;

    let jobs = job_file(&format!(
        r#"[
            {{"source": "phongtro123", "url": "{base}/a"}},
            {{"source": "phongtro123", "url": "{base}/b"}},
            {{"source": "phongtro123", "url": "{base}/c"}}
        ]"#,
        base = base_url
    ));

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let batch = orch.run_jobs(jobs.path()).await.expect("Batch failed");

    assert_eq!(batch.jobs_total(), 3);
    assert_eq!(batch.totals.crawled, 10);
    assert_eq!(batch.totals.upserted, 10);
    assert_eq!(batch.jobs[1].report.crawled, 0);
    assert_eq!(batch.jobs[1].report.warnings, vec!["phongtro123: HTTP 500"]);
    assert_eq!(orch.storage().count_listings().unwrap(), 10);

    let run = orch.storage().latest_run().unwrap().unwrap();
    assert_eq!(run.mode, RunMode::Batch);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.counts.upserted, 10);
}

#[tokio::test]
async fn test_invalid_jobs_are_isolated() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(five_good_one_bad("ok")))
        .mount(&mock_server)
        .await;

    let jobs = job_file(&format!(
        r#"[
            {{"source": "craigslist", "url": "{base}/ok"}},
            {{"source": "batdongsan"}},
            {{"source": "phongtro123", "url": "{base}/ok"}}
        ]"#,
        base = base_url
    ));

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, Secrets::default());

    let batch = orch.run_jobs(jobs.path()).await.unwrap();

    assert_eq!(batch.jobs_total(), 3);
    assert_eq!(batch.jobs_failed(), 2);
    assert!(batch.jobs[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Unknown source"));
    assert!(batch.jobs[1].error.as_deref().unwrap().contains("Missing target"));
    assert!(batch.jobs[2].error.is_none());
    assert_eq!(orch.storage().count_listings().unwrap(), 5);
}

#[tokio::test]
async fn test_missing_job_file_is_no_work() {
    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator("http://127.0.0.1:9", &dir, Secrets::default());

    let batch = orch
        .run_jobs(&dir.path().join("jobs.json"))
        .await
        .unwrap();

    assert_eq!(batch.jobs_total(), 0);
    assert!(orch.storage().latest_run().unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_job_file_aborts() {
    let jobs = job_file("[{\"source\": ");
    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator("http://127.0.0.1:9", &dir, Secrets::default());

    let result = orch.run_jobs(jobs.path()).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("job file"));
}
