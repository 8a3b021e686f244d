use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::auth::JwtService;
use crate::config::{GatewayKind, ServerConfig};
use crate::domain::events::NotificationEvent;
use crate::error::{Result, ServerError};
use crate::http::{ExpoController, HttpServerState, PushHttpServer};
use crate::infra::EventBus;
use crate::push::{ExpoChannel, ExpoGateway, MockGateway, PushGateway};

/// 推送服务
///
/// 组装网关、事件总线、推送渠道和 HTTP 服务
pub struct PushServer {
    config: ServerConfig,
    event_bus: Arc<EventBus>,
    channel: Arc<ExpoChannel>,
    http_server: PushHttpServer,
}

impl PushServer {
    /// 创建新的推送服务
    pub fn new(config: ServerConfig) -> Result<Self> {
        info!("🔧 初始化推送服务组件...");

        let gateway = build_gateway(&config)?;
        info!("✅ 推送网关: {}", gateway.name());

        let event_bus = Arc::new(EventBus::new());
        let channel = Arc::new(ExpoChannel::new(gateway, Arc::clone(&event_bus)));
        let controller = Arc::new(ExpoController::new(Arc::clone(&channel)));
        let jwt_service = Arc::new(JwtService::from_config(&config.auth));

        let state = HttpServerState::new(
            controller,
            jwt_service,
            config.channel.interest_namespace.clone(),
        );
        let http_server = PushHttpServer::new(state, config.bind_address());

        Ok(Self {
            config,
            event_bus,
            channel,
            http_server,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 推送渠道（供应用内的通知系统调用）
    pub fn channel(&self) -> Arc<ExpoChannel> {
        Arc::clone(&self.channel)
    }

    /// 运行服务直到 HTTP 服务器退出
    pub async fn run(&self) -> Result<()> {
        let events = self.event_bus.subscribe();
        let event_logger = tokio::spawn(log_notification_events(events));

        let result = self
            .http_server
            .start()
            .await
            .map_err(|e| ServerError::Internal(format!("HTTP 服务器运行失败: {}", e)));

        event_logger.abort();
        result
    }
}

/// 按配置创建网关
pub fn build_gateway(config: &ServerConfig) -> Result<Arc<dyn PushGateway>> {
    let gateway: Arc<dyn PushGateway> = match config.expo.gateway {
        GatewayKind::Expo => Arc::new(ExpoGateway::new(
            config.expo.push_url.clone(),
            config.expo.access_token.clone(),
            config.expo.timeout(),
        )?
        .with_debug(config.expo.debug)),
        GatewayKind::Mock => {
            warn!("⚠️ 使用 Mock 推送网关，不会发送真实推送");
            Arc::new(MockGateway::new())
        }
    };
    Ok(gateway)
}

/// 记录推送结果事件
async fn log_notification_events(mut receiver: tokio::sync::broadcast::Receiver<NotificationEvent>) {
    loop {
        match receiver.recv().await {
            Ok(NotificationEvent::NotificationSent { notifiable, response, .. }) => {
                info!(
                    "[EVENTS] NotificationSent: notifiable={}, tickets={}, failed={}",
                    notifiable,
                    response.tickets.len(),
                    response.failed_count()
                );
            }
            Ok(NotificationEvent::NotificationFailed { notifiable, error: reason, .. }) => {
                error!("[EVENTS] NotificationFailed: notifiable={}, error={}", notifiable, reason);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("[EVENTS] Event logger lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
