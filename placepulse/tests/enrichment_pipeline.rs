use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use placepulse::cache::{DemographicCache, JsonFileBackend};
use placepulse::config::InsightsConfig;
use placepulse::models::EnrichRequest;
use placepulse::services::{EnrichmentService, FetchPolicy};
use placepulse::upstream::InsightsClient;

fn insights_config(base_url: String) -> InsightsConfig {
    InsightsConfig {
        base_url,
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
        pre_call_delay_ms: 0,
        rate_limit_backoff_ms: 0,
    }
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        pre_call_delay: Duration::ZERO,
        rate_limit_backoff: Duration::ZERO,
    }
}

fn search_body() -> serde_json::Value {
    json!({
        "results": [
            {
                "entity_id": "urn:entity:place:1",
                "name": "Blue Door Diner",
                "location": {"lat": 40.71, "lng": -74.0},
                "popularity": 0.82
            },
            {
                "entity_id": "urn:entity:place:2",
                "name": "Harbor Cafe",
                "location": {"lat": 40.72, "lng": -74.01},
                "popularity": 0.44
            }
        ]
    })
}

fn demographics_body(entity_id: &str, age_score: f64) -> serde_json::Value {
    json!({
        "demographics": [
            {
                "entity_id": entity_id,
                "query": {
                    "age": {"25_to_29": age_score},
                    "gender": {"female": 0.6}
                }
            }
        ]
    })
}

async fn mount_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(server)
        .await;
}

fn request() -> EnrichRequest {
    EnrichRequest {
        query: Some("restaurant".to_string()),
        lat: Some(40.71),
        lng: Some(-74.0),
        ..Default::default()
    }
}

#[tokio::test]
async fn enrich_and_aggregate_attaches_profiles_and_averages_scores() {
    let server = MockServer::start().await;
    mount_search(&server).await;

    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:1", 0.2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:2", 0.6)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = DemographicCache::new(
        Arc::new(JsonFileBackend::new(dir.path().join("demographics.json"))),
        "it-session".to_string(),
    );
    let client = Arc::new(InsightsClient::new(&insights_config(server.uri())).unwrap());
    let service = EnrichmentService::new(client, cache, fast_policy());

    let response = service.enrich_and_aggregate(request()).await.unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].result.entity_id, "urn:entity:place:1");
    assert_eq!(response.items[1].result.entity_id, "urn:entity:place:2");
    assert!(response.items.iter().all(|i| i.demographics.is_some()));

    let age = response.aggregated_age_scores.get("25_to_29").copied().unwrap();
    assert!((age - 0.4).abs() < 1e-9);
    assert_eq!(response.aggregated_gender_scores.get("female"), Some(&0.6));
}

#[tokio::test]
async fn second_batch_is_served_from_the_cache_file() {
    let server = MockServer::start().await;
    mount_search(&server).await;

    // Each entity may be fetched at most once; the second run must come
    // entirely from the cache.
    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:1", 0.2)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:2", 0.6)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("demographics.json");
    let cache = DemographicCache::new(
        Arc::new(JsonFileBackend::new(cache_path)),
        "it-session".to_string(),
    );
    let client = Arc::new(InsightsClient::new(&insights_config(server.uri())).unwrap());
    let service = EnrichmentService::new(client, cache, fast_policy());

    let first = service.enrich_and_aggregate(request()).await.unwrap();
    let second = service.enrich_and_aggregate(request()).await.unwrap();

    assert!(first.items.iter().all(|i| i.demographics.is_some()));
    assert!(second.items.iter().all(|i| i.demographics.is_some()));
    // wiremock verifies the expect(1) counts on drop.
}

#[tokio::test]
async fn failed_lookup_degrades_that_position_only() {
    let server = MockServer::start().await;
    mount_search(&server).await;

    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:1", 0.2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = DemographicCache::new(
        Arc::new(JsonFileBackend::new(dir.path().join("demographics.json"))),
        "it-session".to_string(),
    );
    let client = Arc::new(InsightsClient::new(&insights_config(server.uri())).unwrap());
    let service = EnrichmentService::new(client, cache, fast_policy());

    let response = service.enrich_and_aggregate(request()).await.unwrap();

    assert_eq!(response.items.len(), 2);
    assert!(response.items[0].demographics.is_some());
    assert!(response.items[1].demographics.is_none());
}

#[tokio::test]
async fn rate_limited_lookup_recovers_on_the_single_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demographics"))
        .and(query_param("entity_id", "urn:entity:place:1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(demographics_body("urn:entity:place:1", 0.9)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = DemographicCache::new(
        Arc::new(JsonFileBackend::new(dir.path().join("demographics.json"))),
        "it-session".to_string(),
    );
    let client = Arc::new(InsightsClient::new(&insights_config(server.uri())).unwrap());
    let service = EnrichmentService::new(client, cache, fast_policy());

    let profile = service
        .fetch_demographics("urn:entity:place:1")
        .await
        .unwrap();

    assert!(profile.is_some());
}
