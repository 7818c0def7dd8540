use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::{auth_routes, user_routes};
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_config(server: &MockServer) -> AppConfig {
    TestConfig::default()
        .with_database_url(&server.uri())
        .to_app_config()
}

fn register_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

fn me_app(config: AppConfig) -> Router {
    user_routes(Arc::new(config))
}

#[tokio::test]
async fn register_endpoint_returns_201_with_token() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let user = TestUser::patient("pat@example.com");
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([user.to_store_document()])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Pat Example",
                "email": "pat@example.com",
                "password": "correct horse battery"
            })
            .to_string(),
        ))
        .unwrap();

    let response = register_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(json_response["token"].is_string());
    assert_eq!(json_response["user"]["email"], "pat@example.com");
    assert!(json_response["user"]["password_hash"].is_null());
}

#[tokio::test]
async fn me_endpoint_requires_token() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .body(Body::empty())
        .unwrap();

    let response = me_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_endpoint_resolves_user_through_store() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let user = TestUser::patient("pat@example.com");
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.to_store_document()])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = me_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["id"], user.id.to_string());
    assert_eq!(json_response["email"], "pat@example.com");
}

#[tokio::test]
async fn me_endpoint_rejects_token_for_deleted_user() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let user = TestUser::patient("ghost@example.com");
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = me_app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
