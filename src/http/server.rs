//! HTTP 服务器 - 使用 Axum 提供设备订阅 API

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::JwtService;
use crate::http::controller::ExpoController;
use crate::http::routes;

/// HTTP 服务器共享状态
#[derive(Clone)]
pub struct HttpServerState {
    pub controller: Arc<ExpoController>,
    pub jwt_service: Arc<JwtService>,
    /// 已认证用户的 interest 命名空间
    pub interest_namespace: String,
}

impl HttpServerState {
    pub fn new(
        controller: Arc<ExpoController>,
        jwt_service: Arc<JwtService>,
        interest_namespace: String,
    ) -> Self {
        Self {
            controller,
            jwt_service,
            interest_namespace,
        }
    }
}

/// 构建完整路由（含中间件）
pub fn build_router(state: HttpServerState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 推送订阅 HTTP 服务器
pub struct PushHttpServer {
    state: HttpServerState,
    bind_address: String,
}

impl PushHttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(state: HttpServerState, bind_address: String) -> Self {
        Self { state, bind_address }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// 启动 HTTP 服务器，收到 Ctrl+C 后优雅退出
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app = self.router();

        // 绑定地址
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!("🌐 推送订阅服务启动在 {}", self.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("👋 HTTP 服务器已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听 Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
