//! 健康检查路由
//!
//! 路由：GET /health

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::http::HttpServerState;

pub fn create_route() -> Router<HttpServerState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<HttpServerState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "gateway": state.controller.channel().gateway().name(),
    }))
}
