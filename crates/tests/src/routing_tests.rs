use std::sync::Arc;

use memberdir_services::MemoryMemberStore;

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn unknown_route_returns_404_envelope() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/nothing-here").await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["message"], "Route GET /api/nothing-here not found");
    assert_eq!(body["error"]["status"], 404);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unsupported_method_returns_404() {
    let app = TestApp::spawn().await;
    let resp = app.client.post(app.url("/api/members")).send().await.unwrap();

    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Route POST /api/members not found");
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let app = TestApp::spawn_with(Arc::new(MemoryMemberStore::new()), |settings| {
        settings.app.cors_origins = vec!["https://members.example.com".to_string()];
    })
    .await;

    let resp = app
        .client
        .get(app.url("/api/members"))
        .header("Origin", "https://members.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "https://members.example.com"
    );
}

#[tokio::test]
async fn rate_limit_rejects_bursts() {
    let app = TestApp::spawn_with(Arc::new(MemoryMemberStore::new()), |settings| {
        settings.rate_limit.enabled = true;
        settings.rate_limit.per_second = 60;
        settings.rate_limit.burst_size = 2;
    })
    .await;

    let mut statuses = Vec::new();
    let mut rejected = None;
    for _ in 0..4 {
        let resp = app.client.get(app.url("/api/members")).send().await.unwrap();
        let status = resp.status().as_u16();
        statuses.push(status);
        if status == 429 && rejected.is_none() {
            rejected = Some(resp.json::<serde_json::Value>().await.unwrap());
        }
    }

    assert_eq!(&statuses[..2], &[200, 200]);
    let body = rejected.expect("no request was rate limited");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["status"], 429);
    assert_eq!(body["error"]["message"], "Too many requests, please try again later.");
}

#[tokio::test]
async fn every_response_carries_security_headers() {
    let app = TestApp::spawn_with_store(Arc::new(MemoryMemberStore::unavailable())).await;

    for path in ["/api/members", "/api/members?limit=0", "/missing", "/health"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        let headers = resp.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff", "{path}");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{path}");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin", "{path}");
        assert_eq!(headers["referrer-policy"], "no-referrer", "{path}");
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.starts_with("default-src 'self'"), "{path}");
        assert!(csp.contains("object-src 'none'"), "{path}");
    }
}
