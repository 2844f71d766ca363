//! Integration tests for the auxiliary endpoints and request validation.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use basename_mint::api::create_router;
use basename_mint::domain::{
    DEFAULT_NATIVE_FEE_WEI, ErrorResponse, HealthResponse, HealthStatus, PriceQuote,
    SessionSnapshot,
};
use basename_mint::test_utils::test_state;

async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_quote_tiers() {
    let router = create_router(test_state());

    let (status, body) = get(&router, "/quote?name=abcd").await;
    assert_eq!(status, StatusCode::OK);
    let quote: PriceQuote = serde_json::from_slice(&body).unwrap();
    assert_eq!(quote.stable_price, 10);
    assert_eq!(quote.native_fee, DEFAULT_NATIVE_FEE_WEI);

    let (_, body) = get(&router, "/quote?name=abcdef").await;
    let quote: PriceQuote = serde_json::from_slice(&body).unwrap();
    assert_eq!(quote.stable_price, 5);

    let (_, body) = get(&router, "/quote").await;
    let quote: PriceQuote = serde_json::from_slice(&body).unwrap();
    assert_eq!(quote.stable_price, 0);
}

#[tokio::test]
async fn test_name_too_long_is_rejected() {
    let router = create_router(test_state());
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let snap: SessionSnapshot = serde_json::from_slice(&bytes).unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/sessions/{}/name", snap.session_id))
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "name": "a".repeat(65) }).to_string(),
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let err: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(err.error.r#type, "validation_error");
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let router = create_router(test_state());
    let (status, body) = get(&router, &format!("/sessions/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error.r#type, "not_found");
}

#[tokio::test]
async fn test_health_endpoints() {
    let router = create_router(test_state());

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);

    let (status, _) = get(&router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_manifest_endpoint() {
    let router = create_router(test_state());
    let (status, body) = get(&router, "/.well-known/farcaster.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["miniapp"]["name"], "gasless-basename-app");
    assert_eq!(json["miniapp"]["primaryCategory"], "utility");
}

#[tokio::test]
async fn test_openapi_document() {
    let router = create_router(test_state());
    let (status, body) = get(&router, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["paths"]["/sessions/{id}/check"].is_object());
}

#[tokio::test]
async fn test_view_defaults_to_plain_text() {
    let router = create_router(test_state());
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let snap: SessionSnapshot = serde_json::from_slice(&bytes).unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{}/view", snap.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("Type a name to start"));
}
