//! HTTP 路由模块
//!
//! 路由结构：
//! - `/health` - 健康检查
//! - `/api/exponent/devices/subscribe`   - 设备订阅（需要 Bearer token）
//! - `/api/exponent/devices/unsubscribe` - 设备取消订阅（需要 Bearer token）

pub mod devices;
pub mod health;

use axum::Router;
use crate::http::HttpServerState;

/// 创建所有路由
pub fn create_routes() -> Router<HttpServerState> {
    Router::new()
        .merge(health::create_route())     // /health
        .merge(devices::create_route())    // /api/exponent/devices/*
}
