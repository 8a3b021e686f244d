//! HTTP 服务器模块 - 使用 Axum 提供设备订阅 API
//!
//! 功能包括：
//! - 设备订阅接口
//! - 设备取消订阅接口
//! - 健康检查

pub mod controller;
pub mod middleware;
pub mod routes;
pub mod server;

pub use controller::{ExpoController, JsonResponse};
pub use middleware::auth::AuthUser;
pub use server::{PushHttpServer, HttpServerState};
