#![allow(clippy::unwrap_used)]
// Integration tests for `CloudflareClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strato_api::models::Credentials;
use strato_api::transport::TransportConfig;
use strato_api::{CloudflareClient, Error, RecordPayload};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CloudflareClient) {
    let server = MockServer::start().await;
    let credentials = Credentials::new("ops@example.com", "test-key");
    let base = format!("{}/", server.uri()).parse().unwrap();
    let client =
        CloudflareClient::with_base_url(&credentials, &TransportConfig::default(), base).unwrap();
    (server, client)
}

fn envelope(result: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn list_zones_unwraps_envelope_and_sends_auth_headers() {
    let (server, client) = setup().await;

    let body = envelope(json!([
        { "id": "zone-1", "name": "example.com", "status": "active", "paused": false },
        { "id": "zone-2", "name": "example.org", "status": "pending", "paused": false },
    ]));

    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("x-auth-email", "ops@example.com"))
        .and(header("x-auth-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let zones = client.list_zones().await.unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].id, "zone-1");
    assert_eq!(zones[0].name, "example.com");
    assert_eq!(zones[1].status, "pending");
}

#[tokio::test]
async fn list_records_parses_all_record_types() {
    let (server, client) = setup().await;

    let body = envelope(json!([
        { "id": "r1", "type": "A", "name": "example.com", "content": "203.0.113.9",
          "ttl": 300, "proxied": true },
        { "id": "r2", "type": "CNAME", "name": "www.example.com", "content": "example.com",
          "ttl": 1, "proxied": false },
        { "id": "r3", "type": "MX", "name": "example.com", "content": "mail.example.com",
          "ttl": 3600, "proxied": false, "priority": 10 },
    ]));

    Mock::given(method("GET"))
        .and(path("/zones/zone-1/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client.list_records("zone-1").await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].record_type, "A");
    assert_eq!(records[1].content, "example.com");
    assert_eq!(records[2].priority, Some(10));
}

#[tokio::test]
async fn create_record_posts_payload_and_returns_provider_record() {
    let (server, client) = setup().await;

    let response = envelope(json!({
        "id": "new-record", "type": "CNAME", "name": "api.sub.example.com",
        "content": "origin.example.com", "ttl": 3600, "proxied": false
    }));

    Mock::given(method("POST"))
        .and(path("/zones/zone-1/dns_records"))
        .and(body_partial_json(json!({
            "type": "CNAME",
            "name": "api.sub.example.com",
            "content": "origin.example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .mount(&server)
        .await;

    let payload = RecordPayload {
        record_type: "CNAME".into(),
        name: "api.sub.example.com".into(),
        content: "origin.example.com".into(),
        ttl: 3600,
        proxied: false,
        priority: None,
    };

    let record = client.create_record("zone-1", &payload).await.unwrap();
    assert_eq!(record.id, "new-record");
    assert_eq!(record.name, "api.sub.example.com");
}

#[tokio::test]
async fn delete_record_succeeds_on_id_only_result() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/zones/zone-1/dns_records/r9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({ "id": "r9" }))),
        )
        .mount(&server)
        .await;

    client.delete_record("zone-1", "r9").await.unwrap();
}

// ── Failure classification ──────────────────────────────────────────

#[tokio::test]
async fn success_false_at_http_200_is_rejected_with_provider_message() {
    let (server, client) = setup().await;

    let body = json!({
        "success": false,
        "errors": [{ "code": 1049, "message": "invalid zone" }],
        "messages": [],
        "result": null
    });

    Mock::given(method("GET"))
        .and(path("/zones/bogus/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let err = client.list_records("bogus").await.unwrap_err();
    match err {
        Error::Rejected { message, status } => {
            assert_eq!(message, "invalid zone");
            assert_eq!(status, 200);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn http_400_joins_provider_error_messages() {
    let (server, client) = setup().await;

    let body = json!({
        "success": false,
        "errors": [
            { "code": 9021, "message": "DNS record type is invalid" },
            { "code": 9004, "message": "content is required" },
        ],
        "result": null
    });

    Mock::given(method("POST"))
        .and(path("/zones/zone-1/dns_records"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&body))
        .mount(&server)
        .await;

    let payload = RecordPayload {
        record_type: "BOGUS".into(),
        name: "x.example.com".into(),
        content: String::new(),
        ttl: 1,
        proxied: false,
        priority: None,
    };

    let err = client.create_record("zone-1", &payload).await.unwrap_err();
    match err {
        Error::Rejected { message, status } => {
            assert_eq!(message, "DNS record type is invalid; content is required");
            assert_eq!(status, 400);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn http_403_classifies_as_authentication() {
    let (server, client) = setup().await;

    let body = json!({
        "success": false,
        "errors": [{ "code": 9103, "message": "Unknown X-Auth-Key or X-Auth-Email" }],
        "result": null
    });

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(&body))
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    match err {
        Error::Authentication { ref message } => {
            assert_eq!(message, "Unknown X-Auth-Key or X-Auth-Email");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(err.is_auth());
}

#[tokio::test]
async fn http_429_classifies_as_rate_limited_with_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "120")
                .set_body_json(json!({ "success": false, "errors": [], "result": null })),
        )
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    match err {
        Error::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 120),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn http_5xx_classifies_as_unexpected_and_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    match &err {
        Error::Unexpected { status, .. } => assert_eq!(*status, Some(502)),
        other => panic!("expected Unexpected, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn envelope_errors_at_500_surface_as_unexpected_with_message() {
    let (server, client) = setup().await;

    let body = json!({
        "success": false,
        "errors": [{ "code": 1000, "message": "internal error" }],
        "result": null
    });

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(500).set_body_json(&body))
        .mount(&server)
        .await;

    let err = client.list_zones().await.unwrap_err();
    match err {
        Error::Unexpected { message, status } => {
            assert_eq!(message, "internal error");
            assert_eq!(status, Some(500));
        }
        other => panic!("expected Unexpected, got {other:?}"),
    }
}
