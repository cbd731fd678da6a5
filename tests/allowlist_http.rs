//! Integration tests for the HTTP allowlist fetcher against a mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use registry_mirror::allowlist::{
    AllowlistEntry, AllowlistError, AllowlistFetcher, AllowlistSettings, HttpAllowlistFetcher,
};
use registry_mirror::core::registry::NetworkType;

fn settings(server: &MockServer, retries: u32) -> AllowlistSettings {
    AllowlistSettings {
        url: format!("{}/chains.json", server.uri()),
        timeout: Duration::from_millis(500),
        retries,
        retry_backoff: Duration::from_millis(10),
    }
}

fn chains_body() -> serde_json::Value {
    json!([
        {"chain_name": "cosmoshub", "network_type": "mainnet"},
        {"chain_name": "osmosis", "network_type": "mainnet", "is_archive": false},
        {"chain_name": "theta", "network_type": "testnet"},
        {"chain_name": "terra", "network_type": "mainnet", "is_archive": true}
    ])
}

#[tokio::test]
async fn fetches_and_decodes_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chains.json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chains_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 0)).unwrap();
    let entries = fetcher.fetch().await.unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0], AllowlistEntry::new("cosmoshub", NetworkType::Mainnet));
    assert_eq!(entries[2].network_type, NetworkType::Testnet);
    assert!(entries[3].is_archive);
}

#[tokio::test]
async fn accepts_camel_case_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"chainName": "juno", "networkType": "testnet", "isArchive": true}
        ])))
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 0)).unwrap();
    let entries = fetcher.fetch().await.unwrap();
    assert_eq!(
        entries,
        vec![AllowlistEntry::new("juno", NetworkType::Testnet).archived()]
    );
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chains_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 3)).unwrap();
    let entries = fetcher.fetch().await.unwrap();
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 2)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    match err {
        AllowlistError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_fail_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 3)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, AllowlistError::Status { status: 404, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn rate_limiting_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 1)).unwrap();
    assert!(fetcher.fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 3)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, AllowlistError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpAllowlistFetcher::new(settings(&server, 0)).unwrap();
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, AllowlistError::Timeout), "got {err:?}");
}
