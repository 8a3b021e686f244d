//! 设备订阅路由
//!
//! 路由：
//! - POST /api/exponent/devices/subscribe
//! - POST|DELETE /api/exponent/devices/unsubscribe

use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Router,
};
use serde_json::Value;

use crate::http::controller::JsonResponse;
use crate::http::middleware::auth::AuthUser;
use crate::http::HttpServerState;

/// 创建订阅路由
pub fn create_route() -> Router<HttpServerState> {
    Router::new()
        .route("/api/exponent/devices/subscribe", post(subscribe))
        .route(
            "/api/exponent/devices/unsubscribe",
            post(unsubscribe).delete(unsubscribe),
        )
}

/// 请求体按 JSON 解析，空体或非法 JSON 视为 None
fn parse_body(body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

async fn subscribe(
    State(state): State<HttpServerState>,
    user: AuthUser,
    body: Bytes,
) -> JsonResponse {
    let input = parse_body(&body).unwrap_or(Value::Null);
    state.controller.subscribe(&user, &input).await
}

async fn unsubscribe(
    State(state): State<HttpServerState>,
    user: AuthUser,
    body: Bytes,
) -> JsonResponse {
    let input = parse_body(&body);
    state.controller.unsubscribe(&user, input.as_ref()).await
}
