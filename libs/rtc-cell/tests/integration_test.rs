use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use rtc_cell::router::rtc_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;

fn app(config: AppConfig) -> Router {
    rtc_routes(Arc::new(config))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn token_endpoint_returns_full_join_payload() {
    let config = TestConfig::default().to_app_config();
    let app_id = config.agora_app_id.clone();

    let request = Request::builder()
        .method("GET")
        .uri("/token?channelName=consult-room&uid=42")
        .body(Body::empty())
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["appId"], app_id);
    assert_eq!(json_response["channelName"], "consult-room");
    assert_eq!(json_response["uid"], 42);
    let token = json_response["token"].as_str().unwrap();
    assert!(token.starts_with("006"));
}

#[tokio::test]
async fn token_endpoint_requires_channel_name() {
    let config = TestConfig::default().to_app_config();

    let request = Request::builder()
        .method("GET")
        .uri("/token")
        .body(Body::empty())
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = body_json(response).await;
    assert_eq!(json_response["error"], "Channel name is required");
}

#[tokio::test]
async fn token_endpoint_reports_missing_credentials() {
    let mut config = TestConfig::default().to_app_config();
    config.agora_app_id = String::new();
    config.agora_app_certificate = String::new();

    let request = Request::builder()
        .method("GET")
        .uri("/token?channelName=consult-room")
        .body(Body::empty())
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json_response = body_json(response).await;
    assert_eq!(json_response["error"], "Agora credentials not configured");
}
