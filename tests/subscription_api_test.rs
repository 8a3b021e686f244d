//! 设备订阅 HTTP 接口测试

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{bearer, body_json, build_test_app, send, FailingGateway, TOKEN};
use serde_json::json;

use expo_push::push::{Interest, PushToken};
use expo_push::{MockGateway, PushGateway};

const SUBSCRIBE: &str = "/api/exponent/devices/subscribe";
const UNSUBSCRIBE: &str = "/api/exponent/devices/unsubscribe";

#[tokio::test]
async fn a_device_can_subscribe_to_the_system() {
    let gateway = Arc::new(MockGateway::new());
    let app = build_test_app(gateway.clone());
    let auth = bearer("1");

    let response = send(app, Method::POST, SUBSCRIBE, Some(&auth), Some(json!({ "expo_token": TOKEN }))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "succeeded");
    assert_eq!(json["expo_token"], TOKEN);

    let registry = gateway.registry();
    assert_eq!(
        registry.tokens(&Interest::new("App.User.1")),
        vec![PushToken::parse(TOKEN).unwrap()]
    );
}

#[tokio::test]
async fn subscribe_returns_422_when_token_missing() {
    let app = build_test_app(Arc::new(MockGateway::new()));
    let auth = bearer("1");

    let response = send(app, Method::POST, SUBSCRIBE, Some(&auth), None).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["status"], "failed");
    assert_eq!(json["errors"]["expo_token"][0], "The expo token field is required.");
}

#[tokio::test]
async fn subscribe_returns_422_when_token_malformed() {
    let app = build_test_app(Arc::new(MockGateway::new()));
    let auth = bearer("1");

    let response = send(app, Method::POST, SUBSCRIBE, Some(&auth), Some(json!({ "expo_token": "fakeToken" }))).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["status"], "failed");
}

#[tokio::test]
async fn subscribe_returns_failed_when_gateway_errors() {
    let app = build_test_app(Arc::new(FailingGateway));
    let auth = bearer("1");

    let response = send(app, Method::POST, SUBSCRIBE, Some(&auth), Some(json!({ "expo_token": TOKEN }))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["status"], "failed");
    assert_eq!(json["message"], "gateway unavailable");
}

#[tokio::test]
async fn a_device_can_unsubscribe_from_the_system() {
    let gateway = Arc::new(MockGateway::new());
    let interest = Interest::new("App.User.1");
    gateway
        .subscribe(&interest, &PushToken::parse(TOKEN).unwrap())
        .await
        .unwrap();
    let app = build_test_app(gateway.clone());
    let auth = bearer("1");

    let response = send(app, Method::DELETE, UNSUBSCRIBE, Some(&auth), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "deleted": true }));
    assert!(!gateway.registry().is_subscribed(&interest));
}

#[tokio::test]
async fn unsubscribe_with_token_only_removes_that_device() {
    let gateway = Arc::new(MockGateway::new());
    let interest = Interest::new("App.User.1");
    let phone = PushToken::parse("ExponentPushToken[phone]").unwrap();
    let tablet = PushToken::parse("ExponentPushToken[tablet]").unwrap();
    gateway.subscribe(&interest, &phone).await.unwrap();
    gateway.subscribe(&interest, &tablet).await.unwrap();
    let app = build_test_app(gateway.clone());
    let auth = bearer("1");

    let response = send(
        app,
        Method::POST,
        UNSUBSCRIBE,
        Some(&auth),
        Some(json!({ "expo_token": phone.as_str() })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gateway.registry().tokens(&interest), vec![tablet]);
}

#[tokio::test]
async fn unsubscribe_with_malformed_token_removes_every_device() {
    let gateway = Arc::new(MockGateway::new());
    let interest = Interest::new("App.User.1");
    let phone = PushToken::parse("ExponentPushToken[phone]").unwrap();
    let tablet = PushToken::parse("ExponentPushToken[tablet]").unwrap();
    gateway.subscribe(&interest, &phone).await.unwrap();
    gateway.subscribe(&interest, &tablet).await.unwrap();
    let app = build_test_app(gateway.clone());
    let auth = bearer("1");

    let response = send(
        app,
        Method::POST,
        UNSUBSCRIBE,
        Some(&auth),
        Some(json!({ "expo_token": "bogus" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "deleted": true }));
    assert!(gateway.registry().tokens(&interest).is_empty());
    assert!(!gateway.registry().is_subscribed(&interest));
}

#[tokio::test]
async fn unsubscribe_returns_failed_when_gateway_errors() {
    let app = build_test_app(Arc::new(FailingGateway));
    let auth = bearer("1");

    let response = send(app, Method::POST, UNSUBSCRIBE, Some(&auth), None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["status"], "failed");
}

#[tokio::test]
async fn requests_without_bearer_token_are_rejected() {
    let app = build_test_app(Arc::new(MockGateway::new()));

    let response = send(app, Method::POST, SUBSCRIBE, None, Some(json!({ "expo_token": TOKEN }))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().starts_with("Unauthorized"));
}

#[tokio::test]
async fn requests_with_forged_token_are_rejected() {
    let app = build_test_app(Arc::new(MockGateway::new()));

    let response = send(app, Method::DELETE, UNSUBSCRIBE, Some("Bearer not.a.jwt"), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_gateway_name() {
    let app = build_test_app(Arc::new(MockGateway::new()));

    let response = send(app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok", "gateway": "mock" }));
}
