#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use expo_push::auth::JwtService;
use expo_push::http::server::build_router;
use expo_push::http::HttpServerState;
use expo_push::push::{ExpoMessage, GatewayResponse, Interest, PushToken};
use expo_push::{EventBus, ExpoChannel, ExpoController, PushGateway, Result, ServerError};

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-chars";
pub const NAMESPACE: &str = "App.User";
pub const TOKEN: &str = "ExponentPushToken[fakeToken]";

/// 所有调用都失败的网关
pub struct FailingGateway;

#[async_trait]
impl PushGateway for FailingGateway {
    async fn subscribe(&self, _interest: &Interest, _token: &PushToken) -> Result<()> {
        Err(ServerError::Gateway("gateway unavailable".to_string()))
    }

    async fn unsubscribe(&self, _interest: &Interest, _token: Option<&PushToken>) -> Result<()> {
        Err(ServerError::Gateway("gateway unavailable".to_string()))
    }

    async fn notify(&self, _interests: &[Interest], _message: &ExpoMessage) -> Result<GatewayResponse> {
        Err(ServerError::Gateway("gateway unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub fn jwt_service() -> JwtService {
    JwtService::new(JWT_SECRET, "expo-push".to_string(), "expo-push-client".to_string(), 3600)
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", jwt_service().issue_token(user_id, None).unwrap())
}

pub fn build_test_app(gateway: Arc<dyn PushGateway>) -> Router {
    let channel = Arc::new(ExpoChannel::new(gateway, Arc::new(EventBus::new())));
    let controller = Arc::new(ExpoController::new(channel));
    let state = HttpServerState::new(controller, Arc::new(jwt_service()), NAMESPACE.to_string());
    build_router(state)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
