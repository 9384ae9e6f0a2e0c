use crate::common::{listing_block, listing_page, orchestrator};
use cheap_home::config::Secrets;
use cheap_home::model::{GeoPoint, JobParams, Source};
use cheap_home::storage::ListingStore;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn enrichment_secrets() -> Secrets {
    Secrets {
        google_maps_api_key: Some("maps-key".to_string()),
        openai_api_key: Some("llm-key".to_string()),
        ..Default::default()
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn test_geocoding_and_classification_are_persisted() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // address without a district keyword, so the geocoder backfills it
    let page = listing_page(&[listing_block(
        "geo-1",
        "Phòng trọ gần biển",
        "3 triệu",
        "23 Võ Nguyên Giáp, Đà Nẵng",
    )]);
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "23 Võ Nguyên Giáp, Đà Nẵng"))
        .and(query_param("region", "VN"))
        .and(query_param("language", "vi"))
        .and(query_param("key", "maps-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{
                "geometry": { "location": { "lat": 16.0678, "lng": 108.2453 } },
                "address_components": [
                    { "long_name": "Sơn Trà", "types": ["administrative_area_level_2", "political"] }
                ]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer llm-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"amenities": ["wifi", "máy lạnh"], "roomType": "phòng trọ", "isOwner": true, "spamScore": 0.05}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, enrichment_secrets());

    let report = orch
        .run_single(
            Source::Phongtro123,
            &format!("{}/list", base_url),
            &JobParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(report.upserted, 1);

    let record = orch
        .storage()
        .get_by_url(&format!("{}/geo-1.html", base_url))
        .unwrap()
        .unwrap()
        .record;

    assert_eq!(
        record.location,
        Some(GeoPoint {
            lng: 108.2453,
            lat: 16.0678
        })
    );
    assert_eq!(record.district.as_deref(), Some("Sơn Trà"));
    assert_eq!(
        record.amenities,
        Some(vec!["wifi".to_string(), "máy lạnh".to_string()])
    );
    assert_eq!(record.room_type.as_deref(), Some("phòng trọ"));
    assert_eq!(record.is_owner, Some(true));
    assert_eq!(record.spam_score, Some(0.05));
    assert!(record.crawled_at.is_some());
}

#[tokio::test]
async fn test_enrichment_failures_keep_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let page = listing_page(&[
        listing_block("keep-1", "Phòng trọ Cẩm Lệ", "1,2 triệu", "Cẩm Lệ, Đà Nẵng"),
        listing_block("keep-2", "Phòng trọ Liên Chiểu", "1,4 triệu", "Liên Chiểu, Đà Nẵng"),
    ]);
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("không phải JSON")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut orch = orchestrator(&base_url, &dir, enrichment_secrets());

    let report = orch
        .run_single(
            Source::Phongtro123,
            &format!("{}/list", base_url),
            &JobParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.crawled, 2);
    assert_eq!(report.upserted, 2);

    let record = orch
        .storage()
        .get_by_url(&format!("{}/keep-2.html", base_url))
        .unwrap()
        .unwrap()
        .record;
    assert_eq!(record.location, None);
    assert_eq!(record.amenities, None);
    assert_eq!(record.district.as_deref(), Some("Liên Chiểu"));
    assert!(record.crawled_at.is_some());
}
