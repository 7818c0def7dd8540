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

use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

fn test_config(server: &MockServer) -> AppConfig {
    TestConfig::default()
        .with_database_url(&server.uri())
        .to_app_config()
}

fn app(config: AppConfig) -> Router {
    doctor_routes(Arc::new(config))
}

async fn mount_user(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.to_store_document()])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn listing_is_public() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    Mock::given(method("GET"))
        .and(path("/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_requires_authentication() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_rejects_non_admin_with_403() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let patient = TestUser::patient("pat@example.com");
    mount_user(&server, &patient).await;

    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_create_doctor() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let admin = TestUser::admin("admin@example.com");
    mount_user(&server, &admin).await;

    Mock::given(method("GET"))
        .and(path("/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let doctor_id = uuid::Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/doctors"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([MockStoreResponses::doctor_document(doctor_id)])),
        )
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, Some(24));
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Dr. Test Doctor",
                "specialization": "Cardiology",
                "email": "doctor@example.com",
                "phone": "+15550100"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn admin_can_deactivate_doctor() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let admin = TestUser::admin("admin@example.com");
    mount_user(&server, &admin).await;

    let doctor_id = uuid::Uuid::new_v4();
    let mut document = MockStoreResponses::doctor_document(doctor_id);
    document["is_active"] = json!(false);

    Mock::given(method("PATCH"))
        .and(path("/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([document])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, Some(24));
    let request = Request::builder()
        .method("DELETE")
        .uri(&format!("/{}", doctor_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
