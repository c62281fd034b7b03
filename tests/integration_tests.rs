use axum::body::Body;
use axum::http::{Request, StatusCode};
use gatekeeper::limiter::RateLimiter;
use gatekeeper::server::create_app;
use http_body_util::BodyExt;
use std::time::Duration;
use tokio::time::sleep;
use tower::ServiceExt;

fn test_limiter(rate: f64, burst: u32) -> RateLimiter {
    RateLimiter::new(rate, burst, Duration::from_secs(60), Duration::from_secs(180))
}

fn get(path: &str, client_ip: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(ip) = client_ip {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_burst_then_too_many_requests() {
    let app = create_app(test_limiter(1.0, 2));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/", Some("203.0.113.1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get("/", Some("203.0.113.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = body_json(response).await;
    assert_eq!(body["error"], "too many requests");
}

#[tokio::test]
async fn test_exhaustion_does_not_leak_across_clients() {
    let app = create_app(test_limiter(1.0, 1));

    let response = app
        .clone()
        .oneshot(get("/", Some("203.0.113.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/", Some("203.0.113.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client still has its full burst
    let response = app
        .clone()
        .oneshot(get("/", Some("203.0.113.2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_regenerates_end_to_end() {
    let app = create_app(test_limiter(1.0, 2));
    let client = Some("203.0.113.1");

    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    sleep(Duration::from_millis(1100)).await;

    // One token regenerated at 1 token/s
    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_missing_identity_fails_closed() {
    let app = create_app(test_limiter(1.0, 5));

    // No forwarded headers and no connection info: server-side fault
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unable to determine client address");
}

#[tokio::test]
async fn test_failed_extraction_consumes_no_quota() {
    let app = create_app(test_limiter(1.0, 5));

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // The stats request is the first admission decision ever made
    let response = app
        .clone()
        .oneshot(get("/stats", Some("203.0.113.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_requests"], 1);
    assert_eq!(body["rejected_requests"], 0);
    assert_eq!(body["tracked_clients"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_app(test_limiter(5.0, 10));

    let response = app
        .clone()
        .oneshot(get("/health", Some("203.0.113.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_stats_reports_rejections() {
    let app = create_app(test_limiter(1.0, 1));
    let client = Some("203.0.113.1");

    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        app.clone().oneshot(get("/", client)).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Stats from a second client so the probe itself is admitted
    let response = app
        .clone()
        .oneshot(get("/stats", Some("203.0.113.2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_requests"], 3);
    assert_eq!(body["admitted_requests"], 2);
    assert_eq!(body["rejected_requests"], 1);
    assert_eq!(body["tracked_clients"], 2);
}
